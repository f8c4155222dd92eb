// Workflow Triggers - entity events that start workflows, and the payloads that re-enter them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity lifecycle events workflows listen to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEvent {
    Create,
    Update,
    Delete,
}

impl WorkflowEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to continue a chain after a wait action.
///
/// Created when the wait action suspends and consumed once by the
/// `workflow_wait_action` job handler. It holds ids only, so it stays valid
/// across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumptionPayload {
    pub action_id: String,
    pub account_id: String,
    pub entity_id: String,
    pub user_id: String,
}

/// Queued request to start a workflow for an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartWorkflowPayload {
    pub workflow_id: String,
    pub account_id: String,
    pub entity_id: String,
    pub user_id: String,
}
