use async_trait::async_trait;
use automate_shared::{Entity, User};
use serde_json::Value;
use tracing::info;

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};

/// Creates a new entity in the action's account. Every parameter named like
/// one of the new entity's fields is merged and copied onto it.
pub struct CreateEntityExecutor {
    base: ExecutorBase,
}

impl CreateEntityExecutor {
    pub fn new(base: ExecutorBase) -> Self {
        Self { base }
    }
}

#[async_trait]
impl ActionExecutor for CreateEntityExecutor {
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool> {
        let Some(obj_type) = self.base.get_param_text("obj_type", entity).await? else {
            self.base.add_error("obj_type is a required param");
            return Ok(false);
        };

        let account_id = self.base.action().account_id.clone();
        let mut created = match self.base.entity_store().create(&obj_type, &account_id).await {
            Ok(created) => created,
            Err(e) => {
                self.base.add_error(format!("Could not create {obj_type}: {e}"));
                return Ok(false);
            }
        };

        let fields: Vec<_> = created.definition.fields.values().cloned().collect();
        for field in fields {
            if !self.base.action().params.contains(&field.name) {
                continue;
            }
            let Some(value) = self.base.get_param(&field.name, entity).await? else {
                continue;
            };
            match value {
                Value::Array(items) if field.field_type.is_multi_value() => items
                    .into_iter()
                    .for_each(|item| created.add_multi_value(&field.name, item)),
                value if field.field_type.is_multi_value() => created.add_multi_value(&field.name, value),
                value => created.set_value(&field.name, value),
            }
        }

        match self.base.entity_store().save(&mut created, user).await {
            Ok(id) => {
                info!(
                    action_id = %self.base.action().id,
                    source_entity_id = entity.entity_id().unwrap_or_default(),
                    "Created {} {}",
                    obj_type,
                    id
                );
                Ok(true)
            }
            Err(e) => {
                self.base.add_error(format!("Could not save new {obj_type}: {e}"));
                Ok(false)
            }
        }
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
