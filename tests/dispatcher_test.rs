//! Integration tests for command dispatch and the refresh write path.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dbconsole::adapters::fixture::FixtureConsoleApi;
use dbconsole::domain::models::{
    CollectExecutionDetailsRequest, ConsoleCommand, ExecutionDetailFile, JobId, JobResponse,
    ListJobProfilerExecutionDetailsResponse, SlotAction, StoreAction, UserSqlRolesResponse,
};
use dbconsole::domain::ports::ConsoleApi;
use dbconsole::domain::{DomainError, DomainResult};
use dbconsole::services::{
    select_collect_execution_details, CachePolicy, DispatchHandle, Dispatcher, EventPayload,
    SlotPolicy, Store,
};

use common::{dispatcher_with, fixture, test_policy};

#[tokio::test]
async fn test_collect_publishes_one_command_without_mutating() {
    let (api, dispatcher) = dispatcher_with(
        FixtureConsoleApi::new(fixture(&[42], &["ADMIN"])),
        test_policy(),
    );
    let store = Arc::clone(dispatcher.store());
    let mut events = store.subscribe();
    let before = store.state();

    let handle = dispatcher.dispatch(ConsoleCommand::CollectExecutionDetails {
        job_id: JobId::new(42),
    });

    // Nothing has run yet on the current-thread runtime.
    assert!(Arc::ptr_eq(&before, &store.state()));
    let first = events.try_recv().expect("command event");
    assert_eq!(
        first.payload,
        EventPayload::Command(ConsoleCommand::CollectExecutionDetails {
            job_id: JobId::new(42)
        })
    );
    assert!(events.try_recv().is_err());

    handle.settled().await;

    let mut commands = vec![first.payload];
    while let Ok(event) = events.try_recv() {
        commands.push(event.payload);
    }
    let command_events: Vec<_> = commands
        .iter()
        .filter(|p| matches!(p, EventPayload::Command(_)))
        .collect();
    assert_eq!(command_events.len(), 1);

    let state = store.state();
    let status = select_collect_execution_details(&state, JobId::new(42)).unwrap();
    assert!(status.succeeded);
    assert!(!status.in_flight);
    assert_eq!(api.collect_requests(), 1);

    // The listing arrived through the normal refresh path.
    let files = state.cached_data.job_profiler.get(&JobId::new(42)).unwrap();
    assert!(files.valid);
    assert_eq!(files.data.as_ref().unwrap().files.len(), 4);
}

#[tokio::test]
async fn test_refresh_writes_entry_with_timestamp() {
    let (_api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), test_policy());
    let before = Utc::now();

    dispatcher
        .dispatch(ConsoleCommand::RefreshJob {
            job_id: JobId::new(42),
        })
        .settled()
        .await;

    let state = dispatcher.store().state();
    let entry = state.cached_data.job.get(&JobId::new(42)).unwrap();
    assert!(entry.valid);
    assert!(!entry.in_flight);
    assert!(entry.set_at.unwrap() >= before);
    assert!(entry.requested_at.unwrap() >= before);
    assert_eq!(entry.data.as_ref().unwrap().id, JobId::new(42));
}

#[tokio::test]
async fn test_refresh_emits_request_then_receive() {
    let (_api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[1], &[])), test_policy());
    let mut events = dispatcher.store().subscribe();

    dispatcher
        .dispatch(ConsoleCommand::RefreshJob { job_id: JobId::new(1) })
        .settled()
        .await;

    let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event.payload {
            EventPayload::Action(action) => Some(action.kind()),
            EventPayload::Command(_) => None,
        })
        .collect();
    assert_eq!(kinds, vec!["request", "receive"]);
}

#[tokio::test]
async fn test_in_flight_refresh_is_skipped() {
    let api = FixtureConsoleApi::new(fixture(&[42], &[])).with_latency(Duration::from_millis(50));
    let (api, dispatcher) = dispatcher_with(api, test_policy());

    let first = dispatcher.dispatch(ConsoleCommand::RefreshJob {
        job_id: JobId::new(42),
    });
    let second = dispatcher.dispatch(ConsoleCommand::RefreshJob {
        job_id: JobId::new(42),
    });
    DispatchHandle::settle_all(vec![first, second]).await;

    assert_eq!(api.job_fetches(), 1);
    let state = dispatcher.store().state();
    assert!(state.cached_data.job.get(&JobId::new(42)).unwrap().valid);
}

#[tokio::test]
async fn test_refresh_without_invalidation_period_refetches() {
    let (api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), test_policy());

    for _ in 0..2 {
        dispatcher
            .dispatch(ConsoleCommand::RefreshJob {
                job_id: JobId::new(42),
            })
            .settled()
            .await;
    }
    assert_eq!(api.job_fetches(), 2);
}

#[tokio::test]
async fn test_failed_fetch_is_recorded() {
    let (_api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), test_policy());

    dispatcher
        .dispatch(ConsoleCommand::RefreshJob {
            job_id: JobId::new(99),
        })
        .settled()
        .await;

    let state = dispatcher.store().state();
    let entry = state.cached_data.job.get(&JobId::new(99)).unwrap();
    assert!(!entry.valid);
    assert!(!entry.in_flight);
    assert!(entry.data.is_none());
    assert!(!entry.unauthorized);
    assert_eq!(entry.last_error.as_deref(), Some("Job not found: 99"));
}

#[tokio::test]
async fn test_failure_keeps_previous_data() {
    let (api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), test_policy());
    let refresh = ConsoleCommand::RefreshJob {
        job_id: JobId::new(42),
    };

    dispatcher.dispatch(refresh).settled().await;
    api.set_unavailable(true);
    dispatcher.dispatch(refresh).settled().await;

    let state = dispatcher.store().state();
    let entry = state.cached_data.job.get(&JobId::new(42)).unwrap();
    assert!(!entry.valid);
    assert!(entry.data.is_some());
    assert_eq!(
        entry.last_error.as_deref(),
        Some("Upstream request failed: service unavailable")
    );
}

#[tokio::test]
async fn test_request_timeout() {
    let api = FixtureConsoleApi::new(fixture(&[42], &[])).with_latency(Duration::from_millis(500));
    let policy = CachePolicy {
        request_timeout: Duration::from_millis(20),
        ..test_policy()
    };
    let (_api, dispatcher) = dispatcher_with(api, policy);

    dispatcher
        .dispatch(ConsoleCommand::RefreshJob {
            job_id: JobId::new(42),
        })
        .settled()
        .await;

    let state = dispatcher.store().state();
    let entry = state.cached_data.job.get(&JobId::new(42)).unwrap();
    assert!(!entry.in_flight);
    assert!(entry.last_error.as_deref().unwrap().starts_with("Request timed out"));
}

#[tokio::test]
async fn test_invalidation_period() {
    let policy = CachePolicy {
        job: SlotPolicy {
            invalidation_period: Some(Duration::from_millis(40)),
        },
        ..test_policy()
    };
    let (api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), policy);
    let refresh = ConsoleCommand::RefreshJob {
        job_id: JobId::new(42),
    };

    dispatcher.dispatch(refresh).settled().await;
    dispatcher.dispatch(refresh).settled().await;
    assert_eq!(api.job_fetches(), 1, "fresh entry is not refetched");

    tokio::time::sleep(Duration::from_millis(150)).await;
    let state = dispatcher.store().state();
    let entry = state.cached_data.job.get(&JobId::new(42)).unwrap();
    assert!(!entry.valid);
    assert!(entry.data.is_some());

    dispatcher.dispatch(refresh).settled().await;
    assert_eq!(api.job_fetches(), 2);
}

#[tokio::test]
async fn test_invalidation_timer_keeps_newer_write() {
    let policy = CachePolicy {
        job: SlotPolicy {
            invalidation_period: Some(Duration::from_millis(60)),
        },
        ..test_policy()
    };
    let (_api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), policy);
    let job_id = JobId::new(42);

    dispatcher
        .dispatch(ConsoleCommand::RefreshJob { job_id })
        .settled()
        .await;
    let first_set_at = dispatcher.store().state().cached_data.job.get(&job_id).unwrap().set_at;

    // A later write lands while the first write's timer is pending.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut newer = common::sample_job(42);
    newer.fraction_completed = 0.9;
    let newer_set_at = dispatcher
        .store()
        .dispatch_stamped(StoreAction::Job(SlotAction::Receive {
            key: job_id,
            data: newer,
        }));
    assert_ne!(newer_set_at, first_set_at);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let state = dispatcher.store().state();
    let entry = state.cached_data.job.get(&job_id).unwrap();
    assert!(entry.valid, "stale timer must not clear the newer write");
    assert_eq!(entry.set_at, newer_set_at);
    assert!((entry.data.as_ref().unwrap().fraction_completed - 0.9).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_collect_failure_is_recorded() {
    let (api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &[])), test_policy());
    api.set_unavailable(true);

    dispatcher
        .dispatch(ConsoleCommand::CollectExecutionDetails {
            job_id: JobId::new(42),
        })
        .settled()
        .await;

    let state = dispatcher.store().state();
    let status = select_collect_execution_details(&state, JobId::new(42)).unwrap();
    assert!(!status.succeeded);
    assert!(status.last_error.is_some());
    assert!(state.cached_data.job_profiler.get(&JobId::new(42)).is_none());
}

#[tokio::test]
async fn test_concurrent_refreshes_of_different_slots() {
    let (_api, dispatcher) =
        dispatcher_with(FixtureConsoleApi::new(fixture(&[42], &["ADMIN"])), test_policy());

    let handles = vec![
        dispatcher.dispatch(ConsoleCommand::RefreshJob {
            job_id: JobId::new(42),
        }),
        dispatcher.dispatch(ConsoleCommand::RefreshExecutionDetailFiles {
            job_id: JobId::new(42),
        }),
        dispatcher.dispatch(ConsoleCommand::RefreshUserSqlRoles),
    ];
    DispatchHandle::settle_all(handles).await;

    let state = dispatcher.store().state();
    assert!(state.cached_data.job.get(&JobId::new(42)).unwrap().valid);
    assert!(state.cached_data.job_profiler.get(&JobId::new(42)).unwrap().valid);
    assert!(state.cached_data.user_sql_roles.get(&()).unwrap().valid);
}

/// Console API refusing every request for lack of privileges.
struct DenyingApi;

#[async_trait]
impl ConsoleApi for DenyingApi {
    async fn get_job(&self, _job_id: JobId) -> DomainResult<JobResponse> {
        Err(DomainError::Unauthorized("this operation requires admin privilege".to_string()))
    }

    async fn list_execution_detail_files(
        &self,
        _job_id: JobId,
    ) -> DomainResult<ListJobProfilerExecutionDetailsResponse> {
        Err(DomainError::Unauthorized("this operation requires admin privilege".to_string()))
    }

    async fn collect_execution_details(
        &self,
        _request: &CollectExecutionDetailsRequest,
    ) -> DomainResult<()> {
        Err(DomainError::Unauthorized("this operation requires admin privilege".to_string()))
    }

    async fn get_execution_detail_file(
        &self,
        _job_id: JobId,
        _filename: &str,
    ) -> DomainResult<ExecutionDetailFile> {
        Err(DomainError::Unauthorized("this operation requires admin privilege".to_string()))
    }

    async fn get_user_sql_roles(&self) -> DomainResult<UserSqlRolesResponse> {
        Err(DomainError::Unauthorized("this operation requires admin privilege".to_string()))
    }
}

#[tokio::test]
async fn test_unauthorized_failure_flag() {
    let dispatcher = Dispatcher::new(Arc::new(Store::default()), Arc::new(DenyingApi), test_policy());
    let mut events = dispatcher.store().subscribe();

    dispatcher
        .dispatch(ConsoleCommand::RefreshExecutionDetailFiles {
            job_id: JobId::new(5),
        })
        .settled()
        .await;

    let state = dispatcher.store().state();
    let entry = state.cached_data.job_profiler.get(&JobId::new(5)).unwrap();
    assert!(entry.unauthorized);
    assert!(!entry.valid);

    let last = std::iter::from_fn(|| events.try_recv().ok()).last().unwrap();
    assert!(matches!(
        last.payload,
        EventPayload::Action(StoreAction::JobProfiler(_))
    ));

    let err = dispatcher
        .get_execution_detail_file(JobId::new(5), "x.txt")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}
