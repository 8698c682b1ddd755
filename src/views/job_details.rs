//! State and dispatch wiring of the job details page.
//!
//! `map_state_to_props` selects the job record, the execution detail file
//! listing and the admin flag for the route's job. `JobDetailsDispatchProps`
//! turns the page's callbacks into dispatched commands.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AppState, CacheEntry, ConsoleCommand, ExecutionDetailFile, JobId, JobProfilerSlot,
    JobResponse, JobSlot, ListJobProfilerExecutionDetailsResponse,
};
use crate::services::dispatcher::{DispatchHandle, Dispatcher};
use crate::services::selectors::{
    select_for_key, select_has_admin_role, select_id, KeyedSelector, RouteContext,
};

fn job_selector() -> KeyedSelector<JobSlot, RouteContext> {
    select_for_key(select_id)
}

fn execution_detail_files_selector() -> KeyedSelector<JobProfilerSlot, RouteContext> {
    select_for_key(select_id)
}

/// Props consumed by the job details component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailsStateProps {
    pub job_request: Option<Arc<CacheEntry<JobResponse>>>,
    pub job_profiler_execution_detail_files_response:
        Option<Arc<CacheEntry<ListJobProfilerExecutionDetailsResponse>>>,
    pub job_profiler_last_updated: Option<DateTime<Utc>>,
    pub job_profiler_data_is_valid: Option<bool>,
    pub has_admin_role: bool,
}

pub fn map_state_to_props(state: &AppState, route: &RouteContext) -> JobDetailsStateProps {
    let files = execution_detail_files_selector().select(state, route);
    JobDetailsStateProps {
        job_request: job_selector().select(state, route),
        job_profiler_last_updated: files.as_ref().and_then(|entry| entry.set_at),
        job_profiler_data_is_valid: files.as_ref().map(|entry| entry.valid),
        job_profiler_execution_detail_files_response: files,
        has_admin_role: select_has_admin_role(state),
    }
}

/// Callbacks handed to the job details component.
#[derive(Debug, Clone)]
pub struct JobDetailsDispatchProps {
    dispatcher: Dispatcher,
}

impl JobDetailsDispatchProps {
    pub const fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn refresh_job(&self, job_id: JobId) -> DispatchHandle {
        self.dispatcher.dispatch(ConsoleCommand::RefreshJob { job_id })
    }

    pub fn refresh_execution_detail_files(&self, job_id: JobId) -> DispatchHandle {
        self.dispatcher
            .dispatch(ConsoleCommand::RefreshExecutionDetailFiles { job_id })
    }

    pub fn on_request_execution_details(&self, job_id: JobId) -> DispatchHandle {
        self.dispatcher
            .dispatch(ConsoleCommand::CollectExecutionDetails { job_id })
    }

    pub fn refresh_user_sql_roles(&self) -> DispatchHandle {
        self.dispatcher.dispatch(ConsoleCommand::RefreshUserSqlRoles)
    }

    pub async fn on_download_execution_file_clicked(
        &self,
        job_id: JobId,
        filename: &str,
    ) -> DomainResult<ExecutionDetailFile> {
        self.dispatcher
            .get_execution_detail_file(job_id, filename)
            .await
    }
}

/// The job details page connected to the store for one route.
#[derive(Debug, Clone)]
pub struct JobDetailsPage {
    route: RouteContext,
    dispatch: JobDetailsDispatchProps,
}

impl JobDetailsPage {
    pub const fn connect(dispatcher: Dispatcher, route: RouteContext) -> Self {
        Self {
            route,
            dispatch: JobDetailsDispatchProps::new(dispatcher),
        }
    }

    pub const fn route(&self) -> &RouteContext {
        &self.route
    }

    pub fn job_id(&self) -> Option<JobId> {
        select_id(&self.route)
    }

    pub const fn dispatch_props(&self) -> &JobDetailsDispatchProps {
        &self.dispatch
    }

    /// Issue the refreshes a page mount performs.
    pub fn mount(&self) -> Vec<DispatchHandle> {
        let mut handles = vec![self.dispatch.refresh_user_sql_roles()];
        if let Some(job_id) = self.job_id() {
            handles.push(self.dispatch.refresh_job(job_id));
            handles.push(self.dispatch.refresh_execution_detail_files(job_id));
        }
        handles
    }

    /// Props for the current store state.
    pub fn props(&self) -> JobDetailsStateProps {
        let state = self.dispatch.dispatcher.store().state();
        map_state_to_props(&state, &self.route)
    }
}
