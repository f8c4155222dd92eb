use async_trait::async_trait;
use automate_shared::{Entity, User, object_types, value_to_text};
use lettre::message::Mailboxes;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowResult};
use crate::services::{BodyType, MailSender, OutgoingEmail};

/// Sends a merged email, either from a stored template or from inline
/// `subject`/`body` parameters.
pub struct SendEmailExecutor {
    base: ExecutorBase,
    mail_sender: Arc<dyn MailSender>,
}

impl SendEmailExecutor {
    pub fn new(base: ExecutorBase, mail_sender: Arc<dyn MailSender>) -> Self {
        Self { base, mail_sender }
    }

    /// Subject, body and body type, or `None` when the template is missing.
    async fn content(&mut self, entity: &Entity) -> WorkflowResult<Option<(String, String, BodyType)>> {
        let Some(template_id) = self.base.get_param_text("template_id", entity).await? else {
            let subject = self.base.get_param_text("subject", entity).await?.unwrap_or_default();
            let body = self
                .base
                .get_param("body", entity)
                .await?
                .map(|body| value_to_text(&body))
                .unwrap_or_default();
            return Ok(Some((subject, body, BodyType::Plain)));
        };

        let account_id = self.base.action().account_id.clone();
        let template = self
            .base
            .entity_store()
            .get(object_types::EMAIL_TEMPLATE, &template_id, &account_id)
            .await?;
        let Some(template) = template else {
            self.base.add_error(format!("Email template {template_id} does not exist"));
            return Ok(None);
        };

        let raw_subject = match template.get_value_text("subject") {
            subject if subject.is_empty() => template.get_value_text("name"),
            subject => subject,
        };
        let resolver = self.base.resolver();
        let subject = resolver.resolve_str(&raw_subject, entity).await?;
        let body = resolver
            .resolve_str(&template.get_value_text("body_html"), entity)
            .await?;
        Ok(Some((subject, body, BodyType::Html)))
    }

    /// Addresses from a list parameter plus its free-text `*_other` companion.
    async fn recipients(&self, list: &str, entity: &Entity) -> WorkflowResult<Vec<String>> {
        let mut raw = Vec::new();
        match self.base.raw_param(list) {
            Some(Value::Array(items)) => {
                for item in items {
                    raw.push(value_to_text(&self.base.resolver().resolve(item, entity).await?));
                }
            }
            Some(_) => raw.extend(self.base.get_param_text(list, entity).await?),
            None => {}
        }
        raw.extend(self.base.get_param_text(&format!("{list}_other"), entity).await?);

        let mut addresses: Vec<String> = Vec::new();
        for address in raw.iter().flat_map(|r| split_addresses(r)) {
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }
}

/// Splits on `;`, then on commas outside quoted display names.
/// Segments lettre cannot parse are kept as written so delivery reports them.
fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .flat_map(|segment| match segment.parse::<Mailboxes>() {
            Ok(mailboxes) => mailboxes.into_iter().map(|m| m.to_string()).collect(),
            Err(_) => vec![segment.to_string()],
        })
        .collect()
}

#[async_trait]
impl ActionExecutor for SendEmailExecutor {
    async fn execute(&mut self, entity: &mut Entity, _user: &User) -> WorkflowResult<bool> {
        let Some((subject, body, body_type)) = self.content(entity).await? else {
            return Ok(false);
        };

        let email = OutgoingEmail {
            to: self.recipients("to", entity).await?,
            cc: self.recipients("cc", entity).await?,
            bcc: self.recipients("bcc", entity).await?,
            from: self.base.get_param_text("from", entity).await?,
            subject,
            body,
            body_type,
        };
        if !email.has_recipients() {
            self.base.add_error("The email has no recipients");
            return Ok(false);
        }

        match self.mail_sender.send(&email).await {
            Ok(()) => {
                info!(
                    action_id = %self.base.action().id,
                    recipients = email.to.len() + email.cc.len() + email.bcc.len(),
                    "Sent workflow email: {}",
                    email.subject
                );
                Ok(true)
            }
            Err(e) => {
                self.base.add_error(format!("Failed to send email: {e}"));
                Ok(false)
            }
        }
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
