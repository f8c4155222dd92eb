// Action Executor Factory - builds the executor for an action's type

use std::sync::Arc;
use std::time::Duration;

use super::actions::{Action, ActionType};
use super::executor::{
    ActionExecutor, AssignExecutor, CheckConditionExecutor, CreateEntityExecutor, ExecutorBase,
    SendEmailExecutor, StartWorkflowExecutor, UpdateFieldExecutor, WaitConditionExecutor,
    WebhookExecutor,
};
use super::launcher::WorkflowLauncher;
use crate::config::Config;
use crate::error::WorkflowResult;
use crate::jobs::JobQueue;
use crate::services::{EntityStore, MailSender, QueryIndex};

/// External services executors depend on
#[derive(Clone)]
pub struct Collaborators {
    pub entity_store: Arc<dyn EntityStore>,
    pub query_index: Arc<dyn QueryIndex>,
    pub job_queue: Arc<dyn JobQueue>,
    pub mail_sender: Arc<dyn MailSender>,
    pub launcher: Arc<dyn WorkflowLauncher>,
}

pub struct ActionExecutorFactory {
    collaborators: Collaborators,
    http_client: reqwest::Client,
    application_url: String,
    max_merge_iterations: usize,
}

impl ActionExecutorFactory {
    pub fn new(collaborators: Collaborators, config: &Config) -> WorkflowResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.workflow.webhook_timeout_secs))
            .build()?;

        Ok(Self {
            collaborators,
            http_client,
            application_url: config.application_url.clone(),
            max_merge_iterations: config.workflow.max_merge_iterations,
        })
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Fails with `ActionNotFound` when the action's type is not registered.
    pub fn create(&self, action: &Action) -> WorkflowResult<Box<dyn ActionExecutor>> {
        let action_type = action.action_type()?;
        let base = ExecutorBase::new(
            self.collaborators.entity_store.clone(),
            action.clone(),
            &self.application_url,
        )
        .with_max_merge_iterations(self.max_merge_iterations);
        let c = &self.collaborators;

        let executor: Box<dyn ActionExecutor> = match action_type {
            ActionType::Assign => Box::new(AssignExecutor::new(base, c.query_index.clone())),
            ActionType::CheckCondition => {
                Box::new(CheckConditionExecutor::new(base, c.query_index.clone()))
            }
            ActionType::UpdateField => Box::new(UpdateFieldExecutor::new(base)),
            ActionType::WaitCondition => {
                Box::new(WaitConditionExecutor::new(base, c.job_queue.clone()))
            }
            ActionType::Webhook => Box::new(WebhookExecutor::new(base, self.http_client.clone())),
            ActionType::SendEmail => Box::new(SendEmailExecutor::new(base, c.mail_sender.clone())),
            ActionType::CreateEntity => Box::new(CreateEntityExecutor::new(base)),
            ActionType::StartWorkflow => {
                Box::new(StartWorkflowExecutor::new(base, c.launcher.clone()))
            }
        };
        Ok(executor)
    }
}
