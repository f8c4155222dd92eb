use async_trait::async_trait;
use automate_shared::{Entity, User};
use serde_json::Value;
use tracing::info;

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};

/// Sets a field on the entity, or appends to it for multi-value fields.
pub struct UpdateFieldExecutor {
    base: ExecutorBase,
}

impl UpdateFieldExecutor {
    pub fn new(base: ExecutorBase) -> Self {
        Self { base }
    }
}

#[async_trait]
impl ActionExecutor for UpdateFieldExecutor {
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool> {
        let Some(field_name) = self.base.get_param_text("update_field", entity).await? else {
            self.base.add_error("update_field is a required param");
            return Ok(false);
        };

        let Some(field) = entity.definition.get_field(&field_name).cloned() else {
            let message = format!("{} is not a valid field on {}", field_name, entity.obj_type());
            self.base.add_error(message);
            return Ok(false);
        };

        let value = self
            .base
            .get_param("update_value", entity)
            .await?
            .unwrap_or(Value::Null);

        if field.field_type.is_multi_value() {
            match value {
                Value::Array(items) => items
                    .into_iter()
                    .for_each(|item| entity.add_multi_value(&field.name, item)),
                item => entity.add_multi_value(&field.name, item),
            }
        } else {
            entity.set_value(&field.name, value);
        }

        self.base.entity_store().save(entity, user).await?;
        info!(
            action_id = %self.base.action().id,
            entity_id = entity.entity_id().unwrap_or_default(),
            "Updated field {}",
            field.name
        );
        Ok(true)
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
