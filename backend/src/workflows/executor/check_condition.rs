use async_trait::async_trait;
use automate_shared::{Entity, User};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};
use crate::services::{EntityQuery, FIELD_DELETED, FIELD_ENTITY_ID, QueryIndex};
use crate::workflows::conditions::{Condition, ConditionOperator};

/// Continues only when the saved entity matches every configured condition.
pub struct CheckConditionExecutor {
    base: ExecutorBase,
    query_index: Arc<dyn QueryIndex>,
}

impl CheckConditionExecutor {
    pub fn new(base: ExecutorBase, query_index: Arc<dyn QueryIndex>) -> Self {
        Self { base, query_index }
    }

    /// Conditions may be stored as a list or as its JSON text.
    fn parse_conditions(value: Value) -> Result<Vec<Condition>, String> {
        let value = match value {
            Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
            Value::String(text) => serde_json::from_str(&text).map_err(|e| e.to_string())?,
            other => other,
        };
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl ActionExecutor for CheckConditionExecutor {
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool> {
        let Some(entity_id) = entity.entity_id().map(str::to_string) else {
            return Ok(false);
        };

        let mut conditions = match self.base.raw_param("conditions").cloned() {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => match Self::parse_conditions(value) {
                Ok(conditions) => conditions,
                Err(e) => {
                    self.base.add_error(format!("Malformed conditions: {e}"));
                    return Ok(false);
                }
            },
        };
        // Merge after parsing so merged text never has to be valid JSON.
        for condition in &mut conditions {
            condition.value = self.base.resolver().resolve(&condition.value, entity).await?;
        }

        let mut query = EntityQuery::new(entity.obj_type())
            .for_account(&user.account_id)
            .as_user(&user.entity_id)
            .where_equals(FIELD_ENTITY_ID, entity_id.as_str());
        if entity.archived {
            query = query.and_where(FIELD_DELETED, ConditionOperator::Equals, true);
        }
        for condition in conditions {
            query = query.with_condition(condition);
        }

        match self.query_index.execute(&query).await {
            Ok(results) => {
                let matched = results.num() > 0;
                debug!(
                    action_id = %self.base.action().id,
                    entity_id = %entity_id,
                    matched,
                    "Checked {} condition(s)",
                    query.wheres.len() - 1
                );
                Ok(matched)
            }
            Err(e) => {
                self.base.add_error(format!("Condition query failed: {e}"));
                Ok(false)
            }
        }
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
