use async_trait::async_trait;
use automate_shared::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

use super::entity_store::InMemoryEntityStore;
use crate::workflows::conditions::{Condition, ConditionOperator};

/// Pseudo-field matching the entity id
pub const FIELD_ENTITY_ID: &str = "entity_id";
/// Pseudo-field matching the archived flag
pub const FIELD_DELETED: &str = "f_deleted";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    Invalid(String),
    #[error("Index failure: {0}")]
    Backend(String),
}

/// Structured query over one entity type. All predicates are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    pub obj_type: String,
    pub account_id: Option<String>,
    pub user_id: Option<String>,
    pub wheres: Vec<Condition>,
}

impl EntityQuery {
    pub fn new(obj_type: &str) -> Self {
        Self {
            obj_type: obj_type.to_string(),
            account_id: None,
            user_id: None,
            wheres: Vec::new(),
        }
    }

    pub fn for_account(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    pub fn as_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn and_where(mut self, field_name: &str, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        self.wheres.push(Condition::new(field_name, operator, value.into()));
        self
    }

    pub fn where_equals(self, field_name: &str, value: impl Into<Value>) -> Self {
        self.and_where(field_name, ConditionOperator::Equals, value)
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.wheres.push(condition);
        self
    }

    /// True when the query explicitly asks about the archived flag.
    pub fn includes_archived(&self) -> bool {
        self.wheres.iter().any(|w| w.field_name == FIELD_DELETED)
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    pub total_num: usize,
    pub entities: Vec<Entity>,
}

impl QueryResults {
    pub fn num(&self) -> usize {
        self.entities.len()
    }

    pub fn total_num(&self) -> usize {
        self.total_num
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[async_trait]
pub trait QueryIndex: Send + Sync {
    async fn execute(&self, query: &EntityQuery) -> Result<QueryResults, QueryError>;
}

/// Evaluates queries by scanning an [`InMemoryEntityStore`].
pub struct InMemoryQueryIndex {
    store: Arc<InMemoryEntityStore>,
    executed: AtomicUsize,
}

impl InMemoryQueryIndex {
    pub fn new(store: Arc<InMemoryEntityStore>) -> Self {
        Self {
            store,
            executed: AtomicUsize::new(0),
        }
    }

    pub fn queries_executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    fn field_value(entity: &Entity, field_name: &str) -> Option<Value> {
        match field_name {
            FIELD_ENTITY_ID => entity.entity_id().map(|id| Value::String(id.to_string())),
            FIELD_DELETED => Some(Value::Bool(entity.archived)),
            name => entity.get_value(name).cloned(),
        }
    }

    fn matches(entity: &Entity, query: &EntityQuery) -> bool {
        if entity.archived && !query.includes_archived() {
            return false;
        }
        query
            .wheres
            .iter()
            .all(|w| w.matches(Self::field_value(entity, &w.field_name).as_ref()))
    }
}

#[async_trait]
impl QueryIndex for InMemoryQueryIndex {
    async fn execute(&self, query: &EntityQuery) -> Result<QueryResults, QueryError> {
        if query.obj_type.is_empty() {
            return Err(QueryError::Invalid("query has no object type".to_string()));
        }
        self.executed.fetch_add(1, Ordering::SeqCst);

        let entities: Vec<Entity> = self
            .store
            .entities_of_type(&query.obj_type, query.account_id.as_deref())
            .await
            .into_iter()
            .filter(|entity| Self::matches(entity, query))
            .collect();

        Ok(QueryResults {
            total_num: entities.len(),
            entities,
        })
    }
}
