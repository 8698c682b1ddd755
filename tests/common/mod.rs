//! Common test utilities for integration tests
//!
//! Provides shared fixtures and wiring used across multiple integration
//! test files.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use dbconsole::adapters::fixture::{
    ConsoleFixture, ExecutionDetailsFixture, FixtureConsoleApi, FixtureFile,
};
use dbconsole::domain::models::{JobId, JobResponse, JobStatus};
use dbconsole::domain::ports::ConsoleApi;
use dbconsole::services::{CachePolicy, Dispatcher, SlotPolicy, Store};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A running job with a fixed creation time.
#[allow(dead_code)]
pub fn sample_job(id: i64) -> JobResponse {
    JobResponse {
        id: JobId::new(id),
        job_type: "BACKUP".to_string(),
        description: format!("BACKUP job {id}"),
        statement: "BACKUP INTO 'nodelocal://1/backup'".to_string(),
        username: "root".to_string(),
        status: JobStatus::Running,
        running_status: Some("exporting".to_string()),
        created: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        started: None,
        finished: None,
        modified: None,
        fraction_completed: 0.25,
        error: None,
        coordinator_id: Some(1),
        messages: vec![],
    }
}

/// Fixture serving the given jobs, one pre-gathered file for the first job,
/// and the given SQL roles.
#[allow(dead_code)]
pub fn fixture(job_ids: &[i64], roles: &[&str]) -> ConsoleFixture {
    ConsoleFixture {
        jobs: job_ids.iter().copied().map(sample_job).collect(),
        execution_details: job_ids
            .first()
            .map(|&id| ExecutionDetailsFixture {
                job_id: JobId::new(id),
                files: vec![FixtureFile {
                    name: "goroutines.txt".to_string(),
                    content: "goroutine 1 [running]".to_string(),
                }],
            })
            .into_iter()
            .collect(),
        user_sql_roles: roles.iter().map(ToString::to_string).collect(),
    }
}

/// Policy without invalidation and with a generous timeout.
#[allow(dead_code)]
pub fn test_policy() -> CachePolicy {
    CachePolicy {
        request_timeout: Duration::from_secs(5),
        job: SlotPolicy::default(),
        job_profiler: SlotPolicy::default(),
        user_sql_roles: SlotPolicy::default(),
    }
}

/// Store and dispatcher over a fixture API.
#[allow(dead_code)]
pub fn dispatcher_with(api: FixtureConsoleApi, policy: CachePolicy) -> (Arc<FixtureConsoleApi>, Dispatcher) {
    let api = Arc::new(api);
    let store = Arc::new(Store::default());
    let port: Arc<dyn ConsoleApi> = api.clone();
    let dispatcher = Dispatcher::new(store, port, policy);
    (api, dispatcher)
}
