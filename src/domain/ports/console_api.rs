//! Port for the admin API endpoints the job details page reads from.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CollectExecutionDetailsRequest, ExecutionDetailFile, JobId, JobResponse,
    ListJobProfilerExecutionDetailsResponse, UserSqlRolesResponse,
};

#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Fetch a single job record.
    async fn get_job(&self, job_id: JobId) -> DomainResult<JobResponse>;

    /// List the execution detail artifacts gathered for a job.
    async fn list_execution_detail_files(
        &self,
        job_id: JobId,
    ) -> DomainResult<ListJobProfilerExecutionDetailsResponse>;

    /// Ask the server to begin gathering execution details for a job.
    /// Returns once the request is accepted, not once artifacts exist.
    async fn collect_execution_details(
        &self,
        request: &CollectExecutionDetailsRequest,
    ) -> DomainResult<()>;

    /// Download one execution detail artifact.
    async fn get_execution_detail_file(
        &self,
        job_id: JobId,
        filename: &str,
    ) -> DomainResult<ExecutionDetailFile>;

    /// Fetch the SQL roles of the logged-in user.
    async fn get_user_sql_roles(&self) -> DomainResult<UserSqlRolesResponse>;
}
