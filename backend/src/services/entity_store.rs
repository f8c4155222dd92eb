use async_trait::async_trait;
use automate_shared::{Entity, EntityDefinition, User};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No entity definition for type '{0}'")]
    UnknownType(String),
    #[error("Entity {0} belongs to another account")]
    AccountMismatch(String),
    #[error("Storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Loads, creates and persists business entities.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Returns `None` when the entity does not exist in the account.
    async fn get(&self, obj_type: &str, entity_id: &str, account_id: &str) -> StoreResult<Option<Entity>>;

    /// New unsaved entity of the given type.
    async fn create(&self, obj_type: &str, account_id: &str) -> StoreResult<Entity>;

    /// Persists the entity, assigning an id on first save.
    async fn save(&self, entity: &mut Entity, user: &User) -> StoreResult<String>;
}

#[derive(Default)]
pub struct InMemoryEntityStore {
    definitions: RwLock<HashMap<String, EntityDefinition>>,
    entities: RwLock<HashMap<String, Entity>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_definition(&self, definition: EntityDefinition) {
        self.definitions
            .write()
            .await
            .insert(definition.obj_type.clone(), definition);
    }

    /// Stores an entity directly, bypassing the save counter.
    pub async fn insert(&self, mut entity: Entity) -> String {
        let id = match entity.entity_id() {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        entity.entity_id = Some(id.clone());
        self.entities.write().await.insert(id.clone(), entity);
        id
    }

    pub async fn find(&self, entity_id: &str) -> Option<Entity> {
        self.entities.read().await.get(entity_id).cloned()
    }

    pub async fn entities_of_type(&self, obj_type: &str, account_id: Option<&str>) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .entities
            .read()
            .await
            .values()
            .filter(|e| e.obj_type() == obj_type)
            .filter(|e| account_id.is_none_or(|account| e.account_id == account))
            .cloned()
            .collect();
        entities.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.entity_id.cmp(&b.entity_id)));
        entities
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes every subsequent save fail with a backend error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get(&self, obj_type: &str, entity_id: &str, account_id: &str) -> StoreResult<Option<Entity>> {
        let entities = self.entities.read().await;
        Ok(entities
            .get(entity_id)
            .filter(|e| e.obj_type() == obj_type && e.account_id == account_id)
            .cloned())
    }

    async fn create(&self, obj_type: &str, account_id: &str) -> StoreResult<Entity> {
        let definitions = self.definitions.read().await;
        let definition = definitions
            .get(obj_type)
            .cloned()
            .ok_or_else(|| StoreError::UnknownType(obj_type.to_string()))?;
        Ok(Entity::new(definition, account_id))
    }

    async fn save(&self, entity: &mut Entity, user: &User) -> StoreResult<String> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("save rejected".to_string()));
        }
        if entity.account_id != user.account_id {
            let id = entity.entity_id().unwrap_or("new entity").to_string();
            return Err(StoreError::AccountMismatch(id));
        }

        let id = match entity.entity_id() {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        entity.entity_id = Some(id.clone());
        entity.updated_at = Some(Utc::now());

        self.entities.write().await.insert(id.clone(), entity.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}
