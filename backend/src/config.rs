use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL used to build `<%entity_link%>` values
    pub application_url: String,
    pub smtp: SmtpConfig,
    pub workflow: WorkflowConfig,
}

/// SMTP configuration for sending emails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
}

/// Tuning for the action engine and its job worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// How often due delayed jobs are polled (seconds, 1-59)
    pub job_poll_interval_secs: u32,
    pub webhook_timeout_secs: u64,
    pub max_merge_iterations: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APPLICATION_URL must not be empty")]
    MissingApplicationUrl,
    #[error("WORKFLOW_JOB_POLL_SECONDS must be between 1 and 59, got {0}")]
    InvalidPollInterval(u32),
    #[error("WORKFLOW_MAX_MERGE_ITERATIONS must be positive")]
    InvalidMergeIterations,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            job_poll_interval_secs: 30,
            webhook_timeout_secs: 30,
            max_merge_iterations: crate::workflows::merge::MAX_MERGE_ITERATIONS,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = WorkflowConfig::default();

        let config = Config {
            application_url: env::var("APPLICATION_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "2525".to_string())
                    .parse()
                    .unwrap_or(2525),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_email: env::var("SMTP_FROM_EMAIL")
                    .unwrap_or_else(|_| "no-reply@localhost".to_string()),
                from_name: env::var("SMTP_FROM_NAME")
                    .unwrap_or_else(|_| "Workflow Automation".to_string()),
                use_tls: env::var("SMTP_USE_TLS")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()
                    .unwrap_or(true),
            },
            workflow: WorkflowConfig {
                job_poll_interval_secs: env::var("WORKFLOW_JOB_POLL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.job_poll_interval_secs),
                webhook_timeout_secs: env::var("WORKFLOW_WEBHOOK_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.webhook_timeout_secs),
                max_merge_iterations: env::var("WORKFLOW_MAX_MERGE_ITERATIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_merge_iterations),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_url.is_empty() {
            return Err(ConfigError::MissingApplicationUrl);
        }
        if !(1..=59).contains(&self.workflow.job_poll_interval_secs) {
            return Err(ConfigError::InvalidPollInterval(
                self.workflow.job_poll_interval_secs,
            ));
        }
        if self.workflow.max_merge_iterations == 0 {
            return Err(ConfigError::InvalidMergeIterations);
        }
        Ok(())
    }
}

impl SmtpConfig {
    /// Check if SMTP is properly configured
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}
