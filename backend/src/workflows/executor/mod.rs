// Action Executors - one implementation per action type
//
// An executor runs a single action against an entity and answers with a
// continuation signal: `true` runs the action's children now, `false` stops
// this branch (a failed condition, a recorded error, or a wait that handed
// the chain to the job queue).

use async_trait::async_trait;
use automate_shared::{Entity, User, value_to_text};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::{ActionError, WorkflowResult};
use crate::services::EntityStore;
use crate::workflows::actions::Action;
use crate::workflows::merge::MergeFieldResolver;

pub mod assign;
pub mod check_condition;
pub mod create_entity;
pub mod send_email;
pub mod start_workflow;
pub mod update_field;
pub mod wait_condition;
pub mod webhook;

pub use assign::AssignExecutor;
pub use check_condition::CheckConditionExecutor;
pub use create_entity::CreateEntityExecutor;
pub use send_email::SendEmailExecutor;
pub use start_workflow::StartWorkflowExecutor;
pub use update_field::UpdateFieldExecutor;
pub use wait_condition::{TimeUnit, WaitConditionExecutor};
pub use webhook::WebhookExecutor;

#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Runs the action. Expected failures are recorded and return `Ok(false)`.
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool>;

    fn errors(&self) -> &[ActionError];

    fn last_error(&self) -> Option<&ActionError> {
        self.errors().last()
    }
}

/// State every executor carries: the action, its collaborators and the
/// errors recorded while running.
pub struct ExecutorBase {
    entity_store: Arc<dyn EntityStore>,
    action: Action,
    resolver: MergeFieldResolver,
    errors: Vec<ActionError>,
}

impl ExecutorBase {
    pub fn new(entity_store: Arc<dyn EntityStore>, action: Action, application_url: &str) -> Self {
        let resolver = MergeFieldResolver::new(entity_store.clone(), application_url);
        Self {
            entity_store,
            action,
            resolver,
            errors: Vec::new(),
        }
    }

    pub fn with_max_merge_iterations(mut self, max_iterations: usize) -> Self {
        self.resolver = self.resolver.with_max_iterations(max_iterations);
        self
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn entity_store(&self) -> &Arc<dyn EntityStore> {
        &self.entity_store
    }

    pub fn resolver(&self) -> &MergeFieldResolver {
        &self.resolver
    }

    pub fn raw_param(&self, name: &str) -> Option<&Value> {
        self.action.params.get(name)
    }

    /// Parameter value with merge fields resolved against `merge_with`.
    pub async fn get_param(&self, name: &str, merge_with: &Entity) -> WorkflowResult<Option<Value>> {
        match self.action.params.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(Some(Value::String(String::new()))),
            Some(value) => Ok(Some(self.resolver.resolve(value, merge_with).await?)),
        }
    }

    /// Merged parameter as text, `None` when absent or empty.
    pub async fn get_param_text(&self, name: &str, merge_with: &Entity) -> WorkflowResult<Option<String>> {
        let text = self
            .get_param(name, merge_with)
            .await?
            .map(|value| value_to_text(&value).trim().to_string());
        Ok(text.filter(|t| !t.is_empty()))
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        let error = ActionError::new(message);
        warn!(action_id = %self.action.id, "{}", error);
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ActionError] {
        &self.errors
    }
}
