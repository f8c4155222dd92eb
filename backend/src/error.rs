//! Error handling for the workflow engine
//!
//! Two kinds of failure exist. Expected, configuration-level problems are
//! recorded by an executor as [`ActionError`]s and surface as a `false`
//! continuation. Everything else propagates as a [`WorkflowError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::jobs::JobError;
use crate::services::{QueryError, StoreError};

/// Engine error type
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Merge-field substitution did not terminate within the bound
    #[error("Too many iterations while merging variables (limit {limit})")]
    ExcessiveIterations { limit: usize },

    #[error("No action executor registered for type '{0}'")]
    ActionNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Entity store error: {0}")]
    Store(#[from] StoreError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ExcessiveIterations { .. } => "EXCESSIVE_ITERATIONS",
            Self::ActionNotFound(_) => "ACTION_NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Store(_) => "STORE_ERROR",
            Self::Query(_) => "QUERY_ERROR",
            Self::Job(_) => "JOB_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type alias for engine operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// A failure an executor recorded instead of raising
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
