use async_trait::async_trait;
use automate_shared::{Entity, User};
use serde_json::{Value, json};
use tracing::info;

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};

/// Calls an external URL. Only a 2xx response continues the chain.
pub struct WebhookExecutor {
    base: ExecutorBase,
    client: reqwest::Client,
}

impl WebhookExecutor {
    pub fn new(base: ExecutorBase, client: reqwest::Client) -> Self {
        Self { base, client }
    }

    fn entity_body(entity: &Entity) -> Value {
        json!({
            "entity_id": entity.entity_id(),
            "obj_type": entity.obj_type(),
            "account_id": entity.account_id,
            "values": entity.values,
        })
    }
}

#[async_trait]
impl ActionExecutor for WebhookExecutor {
    async fn execute(&mut self, entity: &mut Entity, _user: &User) -> WorkflowResult<bool> {
        let Some(url) = self.base.get_param_text("url", entity).await? else {
            self.base.add_error("No url was provided for the webhook");
            return Ok(false);
        };
        let method = self
            .base
            .get_param_text("method", entity)
            .await?
            .unwrap_or_else(|| "POST".to_string())
            .to_uppercase();
        let body = match self.base.get_param("payload", entity).await? {
            Some(payload) => payload,
            None => Self::entity_body(entity),
        };

        let request = match method.as_str() {
            "GET" => self.client.get(&url),
            "DELETE" => self.client.delete(&url),
            "POST" => self.client.post(&url).json(&body),
            "PUT" => self.client.put(&url).json(&body),
            "PATCH" => self.client.patch(&url).json(&body),
            other => {
                self.base.add_error(format!("Unsupported HTTP method {other}"));
                return Ok(false);
            }
        };

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(
                    action_id = %self.base.action().id,
                    status = response.status().as_u16(),
                    "Webhook {} {} delivered",
                    method,
                    url
                );
                Ok(true)
            }
            Ok(response) => {
                self.base
                    .add_error(format!("Webhook {url} answered {}", response.status()));
                Ok(false)
            }
            Err(e) => {
                self.base.add_error(format!("Webhook {url} failed: {e}"));
                Ok(false)
            }
        }
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
