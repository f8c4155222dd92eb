// Workflow Engine - runs action chains for entity events and resumptions

use automate_shared::{Entity, User};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::actions::Action;
use super::factory::ActionExecutorFactory;
use super::store::{WorkflowDefinition, WorkflowStore};
use super::triggers::{ResumptionPayload, StartWorkflowPayload, WorkflowEvent};
use crate::error::WorkflowResult;
use crate::services::EntityStore;

/// Outcome counters for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub workflows_started: usize,
    pub actions_executed: usize,
    /// Actions that answered `true`
    pub actions_continued: usize,
    /// Actions that answered `false`
    pub actions_halted: usize,
    /// Actions that could not be built or raised an error
    pub actions_failed: usize,
    pub errors: Vec<String>,
}

impl ExecutionReport {
    pub fn merge(&mut self, other: ExecutionReport) {
        self.workflows_started += other.workflows_started;
        self.actions_executed += other.actions_executed;
        self.actions_continued += other.actions_continued;
        self.actions_halted += other.actions_halted;
        self.actions_failed += other.actions_failed;
        self.errors.extend(other.errors);
    }
}

pub struct WorkflowService {
    workflows: Arc<dyn WorkflowStore>,
    entity_store: Arc<dyn EntityStore>,
    factory: ActionExecutorFactory,
}

impl WorkflowService {
    pub fn new(workflows: Arc<dyn WorkflowStore>, factory: ActionExecutorFactory) -> Self {
        let entity_store = factory.collaborators().entity_store.clone();
        Self {
            workflows,
            entity_store,
            factory,
        }
    }

    /// Starts every active workflow of the entity's type that listens to `event`.
    pub async fn run_workflows_on_event(
        &self,
        entity: &mut Entity,
        event: WorkflowEvent,
        user: &User,
    ) -> WorkflowResult<ExecutionReport> {
        let mut report = ExecutionReport::default();
        let Some(entity_id) = entity.entity_id().map(str::to_string) else {
            warn!(obj_type = entity.obj_type(), "Skipping workflows for unsaved entity");
            return Ok(report);
        };

        let workflows = self
            .workflows
            .active_workflows_for_event(entity.obj_type(), &entity.account_id, event)
            .await?;

        for workflow in workflows {
            if workflow.singleton && self.already_ran(&workflow, &entity_id).await? {
                info!(workflow_id = %workflow.id, entity_id = %entity_id, "Singleton workflow already ran");
                continue;
            }
            report.merge(self.start_instance(&workflow, entity, user).await?);
        }

        Ok(report)
    }

    /// Starts a workflow by id for an entity, as requested by a start-workflow action.
    pub async fn start_workflow(&self, payload: &StartWorkflowPayload) -> WorkflowResult<ExecutionReport> {
        let Some(workflow) = self
            .workflows
            .get_workflow(&payload.account_id, &payload.workflow_id)
            .await?
        else {
            warn!(workflow_id = %payload.workflow_id, "Workflow to start no longer exists");
            return Ok(ExecutionReport::default());
        };
        if !workflow.active {
            info!(workflow_id = %workflow.id, "Not starting inactive workflow");
            return Ok(ExecutionReport::default());
        }

        let Some(mut entity) = self
            .entity_store
            .get(&workflow.obj_type, &payload.entity_id, &payload.account_id)
            .await?
        else {
            warn!(entity_id = %payload.entity_id, "Entity for workflow start no longer exists");
            return Ok(ExecutionReport::default());
        };

        if workflow.singleton && self.already_ran(&workflow, &payload.entity_id).await? {
            return Ok(ExecutionReport::default());
        }

        let user = User::new(&payload.user_id, &payload.account_id);
        self.start_instance(&workflow, &mut entity, &user).await
    }

    /// Continues a chain suspended by a wait action.
    ///
    /// The entity is reloaded so the children see its current state. The
    /// wait action itself is not run again.
    pub async fn resume_wait_action(&self, payload: &ResumptionPayload) -> WorkflowResult<ExecutionReport> {
        let Some(action) = self
            .workflows
            .get_action(&payload.account_id, &payload.action_id)
            .await?
        else {
            warn!(action_id = %payload.action_id, "Waiting action no longer exists");
            return Ok(ExecutionReport::default());
        };

        let Some(workflow) = self
            .workflows
            .get_workflow(&payload.account_id, &action.workflow_id)
            .await?
        else {
            warn!(workflow_id = %action.workflow_id, "Workflow of waiting action no longer exists");
            return Ok(ExecutionReport::default());
        };

        let Some(mut entity) = self
            .entity_store
            .get(&workflow.obj_type, &payload.entity_id, &payload.account_id)
            .await?
        else {
            warn!(entity_id = %payload.entity_id, "Entity of waiting action no longer exists");
            return Ok(ExecutionReport::default());
        };

        info!(
            action_id = %action.id,
            workflow_id = %workflow.id,
            entity_id = %payload.entity_id,
            "Resuming workflow after wait"
        );
        let user = User::new(&payload.user_id, &payload.account_id);
        self.run_child_actions(&action, &mut entity, &user).await
    }

    /// Runs the actions under `parent`.
    pub async fn run_child_actions(
        &self,
        parent: &Action,
        entity: &mut Entity,
        user: &User,
    ) -> WorkflowResult<ExecutionReport> {
        let mut report = ExecutionReport::default();
        self.run_children(&parent.account_id, &parent.workflow_id, Some(parent.id.as_str()), entity, user, &mut report)
            .await?;
        Ok(report)
    }

    async fn already_ran(&self, workflow: &WorkflowDefinition, entity_id: &str) -> WorkflowResult<bool> {
        Ok(!self.workflows.instances_for_entity(workflow, entity_id).await?.is_empty())
    }

    async fn start_instance(
        &self,
        workflow: &WorkflowDefinition,
        entity: &mut Entity,
        user: &User,
    ) -> WorkflowResult<ExecutionReport> {
        let entity_id = entity.entity_id().unwrap_or_default().to_string();
        let instance = self.workflows.create_instance(workflow, &entity_id, user).await?;
        info!(
            workflow_id = %workflow.id,
            instance_id = %instance.id,
            entity_id = %entity_id,
            "Started workflow '{}'",
            workflow.name
        );

        let mut report = ExecutionReport {
            workflows_started: 1,
            ..Default::default()
        };
        self.run_children(&workflow.account_id, &workflow.id, None, entity, user, &mut report)
            .await?;
        Ok(report)
    }

    fn run_children<'a>(
        &'a self,
        account_id: &'a str,
        workflow_id: &'a str,
        parent_action_id: Option<&'a str>,
        entity: &'a mut Entity,
        user: &'a User,
        report: &'a mut ExecutionReport,
    ) -> BoxFuture<'a, WorkflowResult<()>> {
        async move {
            let actions = self
                .workflows
                .actions(account_id, workflow_id, parent_action_id)
                .await?;
            for action in &actions {
                self.execute_action(action, entity, user, report).await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Runs one action and, when it continues, its children.
    /// A failing action stops its own branch only.
    fn execute_action<'a>(
        &'a self,
        action: &'a Action,
        entity: &'a mut Entity,
        user: &'a User,
        report: &'a mut ExecutionReport,
    ) -> BoxFuture<'a, WorkflowResult<()>> {
        async move {
            let mut executor = match self.factory.create(action) {
                Ok(executor) => executor,
                Err(e) => {
                    error!(action_id = %action.id, kind = %action.kind, code = e.error_code(), "Cannot build action: {}", e);
                    report.actions_failed += 1;
                    report.errors.push(format!("{} [{}]: {}", action.id, e.error_code(), e));
                    return Ok(());
                }
            };

            report.actions_executed += 1;
            match executor.execute(entity, user).await {
                Ok(true) => {
                    report.actions_continued += 1;
                    self.run_children(&action.account_id, &action.workflow_id, Some(action.id.as_str()), entity, user, report)
                        .await?;
                }
                Ok(false) => {
                    report.actions_halted += 1;
                    if let Some(last_error) = executor.last_error() {
                        error!(action_id = %action.id, kind = %action.kind, "Action stopped: {}", last_error);
                        report.errors.push(format!("{}: {}", action.id, last_error));
                    }
                }
                Err(e) => {
                    error!(action_id = %action.id, kind = %action.kind, code = e.error_code(), "Action failed: {}", e);
                    report.actions_failed += 1;
                    report.errors.push(format!("{} [{}]: {}", action.id, e.error_code(), e));
                }
            }
            Ok(())
        }
        .boxed()
    }
}
