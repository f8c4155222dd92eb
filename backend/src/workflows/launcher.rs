// Workflow Launcher - starts workflows on request of other workflows

use async_trait::async_trait;
use automate_shared::{Entity, User};
use std::sync::Arc;

use crate::error::{WorkflowError, WorkflowResult};
use crate::jobs::{JobHandler, JobQueue};
use crate::workflows::triggers::StartWorkflowPayload;

#[async_trait]
pub trait WorkflowLauncher: Send + Sync {
    async fn start(&self, workflow_id: &str, entity: &Entity, user: &User) -> WorkflowResult<()>;
}

/// Hands the start to the job queue, so the requesting chain finishes
/// before the new workflow runs.
pub struct QueuedWorkflowLauncher {
    job_queue: Arc<dyn JobQueue>,
}

impl QueuedWorkflowLauncher {
    pub fn new(job_queue: Arc<dyn JobQueue>) -> Self {
        Self { job_queue }
    }
}

#[async_trait]
impl WorkflowLauncher for QueuedWorkflowLauncher {
    async fn start(&self, workflow_id: &str, entity: &Entity, user: &User) -> WorkflowResult<()> {
        let entity_id = entity
            .entity_id()
            .ok_or_else(|| WorkflowError::invalid_argument("entity must be saved before starting a workflow"))?;

        let payload = StartWorkflowPayload {
            workflow_id: workflow_id.to_string(),
            account_id: entity.account_id.clone(),
            entity_id: entity_id.to_string(),
            user_id: user.entity_id.clone(),
        };
        self.job_queue
            .run_now(JobHandler::WorkflowStart, serde_json::to_value(&payload)?)
            .await?;
        Ok(())
    }
}
