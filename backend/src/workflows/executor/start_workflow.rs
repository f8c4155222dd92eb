use async_trait::async_trait;
use automate_shared::{Entity, User};
use std::sync::Arc;
use tracing::info;

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};
use crate::workflows::launcher::WorkflowLauncher;

/// Starts another workflow for the same entity.
pub struct StartWorkflowExecutor {
    base: ExecutorBase,
    launcher: Arc<dyn WorkflowLauncher>,
}

impl StartWorkflowExecutor {
    pub fn new(base: ExecutorBase, launcher: Arc<dyn WorkflowLauncher>) -> Self {
        Self { base, launcher }
    }
}

#[async_trait]
impl ActionExecutor for StartWorkflowExecutor {
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool> {
        let Some(workflow_id) = self.base.get_param_text("workflow_id", entity).await? else {
            self.base.add_error("No valid workflow id");
            return Ok(false);
        };

        match self.launcher.start(&workflow_id, entity, user).await {
            Ok(()) => {
                info!(
                    action_id = %self.base.action().id,
                    workflow_id = %workflow_id,
                    "Requested workflow start"
                );
                Ok(true)
            }
            Err(e) => {
                self.base.add_error(format!("Could not start workflow {workflow_id}: {e}"));
                Ok(false)
            }
        }
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
