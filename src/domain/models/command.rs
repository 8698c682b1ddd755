//! Commands the job details page hands to the dispatcher.

use serde::{Deserialize, Serialize};

use super::job::JobId;

/// A closure-free command object. The dispatcher owns the side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConsoleCommand {
    /// Fetch the job record into the `job` slot.
    RefreshJob { job_id: JobId },
    /// Fetch the execution detail file listing into the `jobProfiler` slot.
    RefreshExecutionDetailFiles { job_id: JobId },
    /// Fetch the logged-in user's SQL roles.
    RefreshUserSqlRoles,
    /// Ask the server to start gathering execution details for a job.
    CollectExecutionDetails { job_id: JobId },
}

impl ConsoleCommand {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RefreshJob { .. } => "refreshJob",
            Self::RefreshExecutionDetailFiles { .. } => "refreshExecutionDetailFiles",
            Self::RefreshUserSqlRoles => "refreshUserSqlRoles",
            Self::CollectExecutionDetails { .. } => "collectExecutionDetails",
        }
    }

    pub const fn job_id(&self) -> Option<JobId> {
        match self {
            Self::RefreshJob { job_id }
            | Self::RefreshExecutionDetailFiles { job_id }
            | Self::CollectExecutionDetails { job_id } => Some(*job_id),
            Self::RefreshUserSqlRoles => None,
        }
    }
}
