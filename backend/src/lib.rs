//! Workflow action execution engine.
//!
//! Runs chains of configured actions against business entities when they are
//! created, updated or deleted. Actions merge `<%field%>` placeholders, branch
//! on conditions, and can suspend a chain for a real-world delay that a queued
//! job later resumes.

pub mod config;
pub mod error;
pub mod jobs;
pub mod services;
pub mod workflows;

#[cfg(test)]
mod tests;

pub use automate_shared as models;
pub use config::Config;
pub use error::{ActionError, WorkflowError, WorkflowResult};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber, honouring `RUST_LOG`.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automate_backend=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
