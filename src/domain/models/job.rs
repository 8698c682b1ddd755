//! Job records and job profiler payloads served by the admin API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Identifier of a job (a 64-bit signed integer on the server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(i64);

impl JobId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidId(s.to_string()))
    }
}

/// Job status as reported by the jobs registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    PauseRequested,
    Succeeded,
    Failed,
    Canceled,
    CancelRequested,
    Reverting,
    RevertFailed,
}

impl JobStatus {
    /// Terminal statuses never transition again.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Canceled | Self::RevertFailed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::PauseRequested => "pause-requested",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::CancelRequested => "cancel-requested",
            Self::Reverting => "reverting",
            Self::RevertFailed => "revert-failed",
        };
        write!(f, "{s}")
    }
}

/// A message emitted by a job during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Response of the single-job endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub description: String,
    #[serde(default)]
    pub statement: String,
    pub username: String,
    pub status: JobStatus,
    #[serde(default)]
    pub running_status: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fraction_completed: f32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub coordinator_id: Option<i64>,
    #[serde(default)]
    pub messages: Vec<JobMessage>,
}

/// Listing of execution detail artifacts gathered for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListJobProfilerExecutionDetailsResponse {
    #[serde(default)]
    pub files: Vec<String>,
}

/// Request asking the server to start gathering execution details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectExecutionDetailsRequest {
    pub job_id: JobId,
}

/// A single downloaded execution detail artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDetailFile {
    pub job_id: JobId,
    pub filename: String,
    pub data: Vec<u8>,
}

/// SQL roles granted to the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSqlRolesResponse {
    #[serde(default)]
    pub roles: Vec<String>,
}
