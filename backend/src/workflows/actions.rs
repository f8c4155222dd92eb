// Workflow Actions - configured units of work attached to a workflow

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::workflows::conditions::Condition;

/// Kinds of action the engine can execute
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Assign,
    CheckCondition,
    UpdateField,
    WaitCondition,
    Webhook,
    SendEmail,
    CreateEntity,
    StartWorkflow,
}

impl ActionType {
    pub const ALL: [ActionType; 8] = [
        ActionType::Assign,
        ActionType::CheckCondition,
        ActionType::UpdateField,
        ActionType::WaitCondition,
        ActionType::Webhook,
        ActionType::SendEmail,
        ActionType::CreateEntity,
        ActionType::StartWorkflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::CheckCondition => "check_condition",
            Self::UpdateField => "update_field",
            Self::WaitCondition => "wait_condition",
            Self::Webhook => "webhook",
            Self::SendEmail => "send_email",
            Self::CreateEntity => "create_entity",
            Self::StartWorkflow => "start_workflow",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WorkflowError::ActionNotFound(s.to_string()))
    }
}

/// Named parameters configuring an action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(Map<String, Value>);

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl From<Map<String, Value>> for ActionParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// An action configured on a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub account_id: String,
    pub workflow_id: String,
    pub parent_action_id: Option<String>,
    pub name: String,
    /// Action type name, resolved to an executor when the action runs
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: ActionParams,
}

impl Action {
    pub fn new(action_type: ActionType) -> Self {
        Self::with_kind(action_type.as_str())
    }

    /// Action of an arbitrary type name, which may not be registered.
    pub fn with_kind(kind: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id: String::new(),
            workflow_id: String::new(),
            parent_action_id: None,
            name: kind.to_string(),
            kind: kind.to_string(),
            params: ActionParams::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn in_workflow(mut self, account_id: &str, workflow_id: &str) -> Self {
        self.account_id = account_id.to_string();
        self.workflow_id = workflow_id.to_string();
        self
    }

    /// Runs this action after `parent` continues.
    pub fn child_of(mut self, parent: &Action) -> Self {
        self.account_id = parent.account_id.clone();
        self.workflow_id = parent.workflow_id.clone();
        self.parent_action_id = Some(parent.id.clone());
        self
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn action_type(&self) -> Result<ActionType, WorkflowError> {
        self.kind.parse()
    }

    // Preset actions

    pub fn assign_from_team(field: &str, team_id: &str) -> Self {
        Self::new(ActionType::Assign)
            .with_param("field", field)
            .with_param("team_id", team_id)
    }

    pub fn assign_from_group(field: &str, group_id: &str) -> Self {
        Self::new(ActionType::Assign)
            .with_param("field", field)
            .with_param("group_id", group_id)
    }

    pub fn assign_from_users(field: &str, user_ids: &[&str]) -> Self {
        Self::new(ActionType::Assign)
            .with_param("field", field)
            .with_param("users", user_ids.join(","))
    }

    pub fn check_condition(conditions: Vec<Condition>) -> Self {
        let conditions = serde_json::to_value(conditions).unwrap_or(Value::Array(Vec::new()));
        Self::new(ActionType::CheckCondition).with_param("conditions", conditions)
    }

    pub fn update_field(field: &str, value: impl Into<Value>) -> Self {
        Self::new(ActionType::UpdateField)
            .with_param("update_field", field)
            .with_param("update_value", value)
    }

    pub fn wait(unit: &str, interval: u32) -> Self {
        Self::new(ActionType::WaitCondition)
            .with_param("when_unit", unit)
            .with_param("when_interval", interval)
    }

    pub fn webhook(url: &str) -> Self {
        Self::new(ActionType::Webhook).with_param("url", url)
    }

    pub fn send_email(to: &str, subject: &str, body: &str) -> Self {
        Self::new(ActionType::SendEmail)
            .with_param("to", to)
            .with_param("subject", subject)
            .with_param("body", body)
    }

    pub fn create_entity(obj_type: &str) -> Self {
        Self::new(ActionType::CreateEntity).with_param("obj_type", obj_type)
    }

    pub fn start_workflow(workflow_id: &str) -> Self {
        Self::new(ActionType::StartWorkflow).with_param("workflow_id", workflow_id)
    }
}
