//! Domain errors for the console state layer.

use std::time::Duration;

use thiserror::Error;

use crate::domain::models::JobId;

/// Domain-level errors raised by console API ports and model parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Execution detail file not found for job {job_id}: {filename}")]
    FileNotFound { job_id: JobId, filename: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid job id: {0:?}")]
    InvalidId(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DomainError {
    /// Whether the failure was an authorization refusal from the server.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
