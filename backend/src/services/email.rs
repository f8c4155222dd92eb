use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{authentication::Credentials, PoolConfig},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
    #[error("Message has no recipients")]
    NoRecipients,
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    #[default]
    Plain,
    Html,
}

/// A fully merged message ready for delivery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
    pub body_type: BodyType,
}

impl OutgoingEmail {
    pub fn has_recipients(&self) -> bool {
        !self.to.is_empty() || !self.cc.is_empty() || !self.bcc.is_empty()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP delivery through a pooled lettre transport
#[derive(Debug, Clone)]
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
}

impl SmtpMailSender {
    pub fn new(smtp_config: &SmtpConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(smtp_config.username.clone(), smtp_config.password.clone());

        let builder = if smtp_config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp_config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp_config.host)
        };

        let transport = builder
            .port(smtp_config.port)
            .credentials(creds)
            .pool_config(PoolConfig::new().max_size(10))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(SmtpMailSender {
            transport,
            from_email: smtp_config.from_email.clone(),
            from_name: smtp_config.from_name.clone(),
        })
    }

    fn default_from(&self) -> Result<Mailbox, MailError> {
        let address = format!("{} <{}>", self.from_name, self.from_email);
        address
            .parse::<Mailbox>()
            .map_err(|_| MailError::InvalidAddress(address))
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, MailError> {
        if !email.has_recipients() {
            return Err(MailError::NoRecipients);
        }

        let from = match email.from.as_deref().filter(|f| !f.is_empty()) {
            Some(from) => parse_mailbox(from)?,
            None => self.default_from()?,
        };

        let mut builder = Message::builder().from(from).subject(email.subject.as_str());
        for address in &email.to {
            builder = builder.to(parse_mailbox(address)?);
        }
        for address in &email.cc {
            builder = builder.cc(parse_mailbox(address)?);
        }
        for address in &email.bcc {
            builder = builder.bcc(parse_mailbox(address)?);
        }

        let content_type = match email.body_type {
            BodyType::Html => ContentType::TEXT_HTML,
            BodyType::Plain => ContentType::TEXT_PLAIN,
        };

        builder
            .header(content_type)
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| MailError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = self.build_message(email)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(recipients = email.to.len(), "Email sent: {}", email.subject);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email '{}': {}", email.subject, e);
                Err(MailError::Transport(e.to_string()))
            }
        }
    }
}
