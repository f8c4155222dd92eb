// Workflow Store - workflow definitions, their actions and running instances

use async_trait::async_trait;
use automate_shared::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::actions::Action;
use super::triggers::WorkflowEvent;
use crate::error::WorkflowResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub account_id: String,
    pub name: String,
    /// Entity type the workflow runs against
    pub obj_type: String,
    pub active: bool,
    pub on_create: bool,
    pub on_update: bool,
    pub on_delete: bool,
    /// Run at most once per entity
    pub singleton: bool,
    pub created_at: DateTime<Utc>,
}

impl WorkflowDefinition {
    pub fn new(account_id: &str, name: &str, obj_type: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            name: name.to_string(),
            obj_type: obj_type.to_string(),
            active: true,
            on_create: false,
            on_update: false,
            on_delete: false,
            singleton: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn on(mut self, event: WorkflowEvent) -> Self {
        match event {
            WorkflowEvent::Create => self.on_create = true,
            WorkflowEvent::Update => self.on_update = true,
            WorkflowEvent::Delete => self.on_delete = true,
        }
        self
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn listens_to(&self, event: WorkflowEvent) -> bool {
        match event {
            WorkflowEvent::Create => self.on_create,
            WorkflowEvent::Update => self.on_update,
            WorkflowEvent::Delete => self.on_delete,
        }
    }
}

/// One run of a workflow for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: String,
    pub workflow_id: String,
    pub account_id: String,
    pub entity_id: String,
    pub started_by: String,
    pub started_at: DateTime<Utc>,
}

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn active_workflows_for_event(
        &self,
        obj_type: &str,
        account_id: &str,
        event: WorkflowEvent,
    ) -> WorkflowResult<Vec<WorkflowDefinition>>;

    async fn get_workflow(&self, account_id: &str, workflow_id: &str) -> WorkflowResult<Option<WorkflowDefinition>>;

    async fn instances_for_entity(&self, workflow: &WorkflowDefinition, entity_id: &str) -> WorkflowResult<Vec<WorkflowInstance>>;

    async fn create_instance(&self, workflow: &WorkflowDefinition, entity_id: &str, user: &User) -> WorkflowResult<WorkflowInstance>;

    /// Actions of a workflow directly under `parent_action_id`, in run order.
    /// `None` selects the root actions.
    async fn actions(&self, account_id: &str, workflow_id: &str, parent_action_id: Option<&str>) -> WorkflowResult<Vec<Action>>;

    async fn get_action(&self, account_id: &str, action_id: &str) -> WorkflowResult<Option<Action>>;
}

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<Vec<WorkflowDefinition>>,
    actions: RwLock<Vec<Action>>,
    instances: RwLock<Vec<WorkflowInstance>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_workflow(&self, workflow: WorkflowDefinition) {
        self.workflows.write().await.push(workflow);
    }

    /// Actions run in the order they were added.
    pub async fn add_action(&self, action: Action) {
        self.actions.write().await.push(action);
    }

    pub async fn remove_action(&self, action_id: &str) {
        self.actions.write().await.retain(|a| a.id != action_id);
    }

    pub async fn instances(&self) -> Vec<WorkflowInstance> {
        self.instances.read().await.clone()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn active_workflows_for_event(
        &self,
        obj_type: &str,
        account_id: &str,
        event: WorkflowEvent,
    ) -> WorkflowResult<Vec<WorkflowDefinition>> {
        Ok(self
            .workflows
            .read()
            .await
            .iter()
            .filter(|w| w.active && w.obj_type == obj_type && w.account_id == account_id)
            .filter(|w| w.listens_to(event))
            .cloned()
            .collect())
    }

    async fn get_workflow(&self, account_id: &str, workflow_id: &str) -> WorkflowResult<Option<WorkflowDefinition>> {
        Ok(self
            .workflows
            .read()
            .await
            .iter()
            .find(|w| w.id == workflow_id && w.account_id == account_id)
            .cloned())
    }

    async fn instances_for_entity(&self, workflow: &WorkflowDefinition, entity_id: &str) -> WorkflowResult<Vec<WorkflowInstance>> {
        Ok(self
            .instances
            .read()
            .await
            .iter()
            .filter(|i| i.workflow_id == workflow.id && i.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn create_instance(&self, workflow: &WorkflowDefinition, entity_id: &str, user: &User) -> WorkflowResult<WorkflowInstance> {
        let instance = WorkflowInstance {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow.id.clone(),
            account_id: workflow.account_id.clone(),
            entity_id: entity_id.to_string(),
            started_by: user.entity_id.clone(),
            started_at: Utc::now(),
        };
        self.instances.write().await.push(instance.clone());
        Ok(instance)
    }

    async fn actions(&self, account_id: &str, workflow_id: &str, parent_action_id: Option<&str>) -> WorkflowResult<Vec<Action>> {
        Ok(self
            .actions
            .read()
            .await
            .iter()
            .filter(|a| a.account_id == account_id && a.workflow_id == workflow_id)
            .filter(|a| a.parent_action_id.as_deref() == parent_action_id)
            .cloned()
            .collect())
    }

    async fn get_action(&self, account_id: &str, action_id: &str) -> WorkflowResult<Option<Action>> {
        Ok(self
            .actions
            .read()
            .await
            .iter()
            .find(|a| a.id == action_id && a.account_id == account_id)
            .cloned())
    }
}
