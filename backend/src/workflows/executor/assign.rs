use async_trait::async_trait;
use automate_shared::{Entity, User, object_types};
use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};
use crate::services::{EntityQuery, QueryIndex};

/// Assigns a user to a field, picked at random from a team, a group, or a
/// fixed list of user ids (first non-empty source wins, in that order).
pub struct AssignExecutor {
    base: ExecutorBase,
    query_index: Arc<dyn QueryIndex>,
}

enum Source {
    Team(String),
    Group(String),
    Users(Vec<String>),
}

impl AssignExecutor {
    pub fn new(base: ExecutorBase, query_index: Arc<dyn QueryIndex>) -> Self {
        Self { base, query_index }
    }

    async fn source(&self, entity: &Entity) -> WorkflowResult<Option<Source>> {
        if let Some(team_id) = self.base.get_param_text("team_id", entity).await? {
            return Ok(Some(Source::Team(team_id)));
        }
        if let Some(group_id) = self.base.get_param_text("group_id", entity).await? {
            return Ok(Some(Source::Group(group_id)));
        }
        if let Some(users) = self.base.get_param_text("users", entity).await? {
            let ids: Vec<String> = users
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            return Ok(Some(Source::Users(ids)));
        }
        Ok(None)
    }

    /// Ids of users in the action's account whose `field` matches `value`.
    async fn members(&mut self, field: &str, value: &str) -> WorkflowResult<Option<Vec<String>>> {
        let query = EntityQuery::new(object_types::USER)
            .for_account(&self.base.action().account_id)
            .where_equals(field, value);

        match self.query_index.execute(&query).await {
            Ok(results) => Ok(Some(
                results
                    .entities
                    .iter()
                    .filter_map(|user| user.entity_id().map(str::to_string))
                    .collect(),
            )),
            Err(e) => {
                self.base.add_error(format!("Could not load users where {field} is {value}: {e}"));
                Ok(None)
            }
        }
    }
}

fn choose(candidates: &[String]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..candidates.len());
    Some(candidates[index].clone())
}

#[async_trait]
impl ActionExecutor for AssignExecutor {
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool> {
        let Some(field) = self.base.get_param_text("field", entity).await? else {
            debug!(action_id = %self.base.action().id, "Assign has no target field");
            return Ok(false);
        };

        let candidates = match self.source(entity).await? {
            Some(Source::Team(team_id)) => self.members("team_id", &team_id).await?,
            Some(Source::Group(group_id)) => self.members("groups", &group_id).await?,
            Some(Source::Users(ids)) => Some(ids),
            None => {
                debug!(action_id = %self.base.action().id, "Assign has no candidate source");
                return Ok(false);
            }
        };

        let Some(assignee) = candidates.as_deref().and_then(choose) else {
            return Ok(false);
        };

        entity.set_value(&field, Value::String(assignee.clone()));
        self.base.entity_store().save(entity, user).await?;

        info!(
            action_id = %self.base.action().id,
            entity_id = entity.entity_id().unwrap_or_default(),
            "Assigned {} to {}",
            field,
            assignee
        );
        Ok(true)
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
