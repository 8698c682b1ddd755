//! Command dispatcher for the job details page.
//!
//! `dispatch` publishes the command on the store's event channel and spawns
//! its side effect; it never mutates state synchronously. Fetch completions
//! are written back through [`Store::dispatch`], so every write goes through
//! the reducer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CacheConfig, CacheSlot, CacheSlotName, CollectAction, CollectExecutionDetailsRequest,
    ConsoleCommand, ExecutionDetailFile, JobId, JobProfilerSlot, JobSlot, SlotAction, SlotConfig,
    StoreAction, UserSqlRolesSlot,
};
use crate::domain::ports::ConsoleApi;
use crate::services::store::Store;

/// Freshness policy of one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotPolicy {
    pub invalidation_period: Option<Duration>,
}

impl From<&SlotConfig> for SlotPolicy {
    fn from(config: &SlotConfig) -> Self {
        Self {
            invalidation_period: config.invalidation_period(),
        }
    }
}

/// Timeouts and per-slot freshness policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub request_timeout: Duration,
    pub job: SlotPolicy,
    pub job_profiler: SlotPolicy,
    pub user_sql_roles: SlotPolicy,
}

impl CachePolicy {
    pub fn slot(&self, name: CacheSlotName) -> SlotPolicy {
        match name {
            CacheSlotName::JOB => self.job,
            CacheSlotName::JOB_PROFILER => self.job_profiler,
            CacheSlotName::USER_SQL_ROLES => self.user_sql_roles,
            _ => SlotPolicy::default(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            job: SlotPolicy::from(&config.job),
            job_profiler: SlotPolicy::from(&config.job_profiler),
            user_sql_roles: SlotPolicy::from(&config.user_sql_roles),
        }
    }
}

/// Handle to a dispatched command's asynchronous side effect.
#[derive(Debug)]
pub struct DispatchHandle {
    command: ConsoleCommand,
    handle: JoinHandle<()>,
}

impl DispatchHandle {
    pub const fn command(&self) -> ConsoleCommand {
        self.command
    }

    /// Wait until the command's writes have been applied to the store.
    pub async fn settled(self) {
        if let Err(err) = self.handle.await {
            warn!(kind = self.command.kind(), error = %err, "dispatched command task failed");
        }
    }

    /// Wait for several handles.
    pub async fn settle_all(handles: Vec<Self>) {
        futures::future::join_all(handles.into_iter().map(Self::settled)).await;
    }
}

/// Executes console commands against a [`ConsoleApi`] and writes results
/// into the [`Store`].
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<Store>,
    api: Arc<dyn ConsoleApi>,
    policy: CachePolicy,
}

impl Dispatcher {
    pub fn new(store: Arc<Store>, api: Arc<dyn ConsoleApi>, policy: CachePolicy) -> Self {
        Self { store, api, policy }
    }

    pub const fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub const fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Publish `command` and spawn its side effect. Requires a tokio runtime.
    pub fn dispatch(&self, command: ConsoleCommand) -> DispatchHandle {
        self.store.record_command(command);
        let this = self.clone();
        let handle = tokio::spawn(async move { this.execute(command).await });
        DispatchHandle { command, handle }
    }

    /// Download one execution detail artifact. Not cached.
    pub async fn get_execution_detail_file(
        &self,
        job_id: JobId,
        filename: &str,
    ) -> DomainResult<ExecutionDetailFile> {
        self.with_timeout(self.api.get_execution_detail_file(job_id, filename))
            .await
    }

    async fn execute(&self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::RefreshJob { job_id } => self.refresh_job(job_id).await,
            ConsoleCommand::RefreshExecutionDetailFiles { job_id } => {
                self.refresh_execution_detail_files(job_id).await;
            }
            ConsoleCommand::RefreshUserSqlRoles => self.refresh_user_sql_roles().await,
            ConsoleCommand::CollectExecutionDetails { job_id } => {
                self.collect_execution_details(job_id).await;
            }
        }
    }

    async fn refresh_job(&self, job_id: JobId) {
        let api = Arc::clone(&self.api);
        self.refresh::<JobSlot, _, _>(job_id, || async move { api.get_job(job_id).await })
            .await;
    }

    async fn refresh_execution_detail_files(&self, job_id: JobId) {
        let api = Arc::clone(&self.api);
        self.refresh::<JobProfilerSlot, _, _>(job_id, || async move {
            api.list_execution_detail_files(job_id).await
        })
        .await;
    }

    async fn refresh_user_sql_roles(&self) {
        let api = Arc::clone(&self.api);
        self.refresh::<UserSqlRolesSlot, _, _>((), || async move {
            api.get_user_sql_roles().await
        })
        .await;
    }

    async fn collect_execution_details(&self, job_id: JobId) {
        self.store
            .dispatch(StoreAction::CollectExecutionDetails(CollectAction::Request { job_id }));

        let request = CollectExecutionDetailsRequest { job_id };
        match self
            .with_timeout(self.api.collect_execution_details(&request))
            .await
        {
            Ok(()) => {
                info!(%job_id, "execution detail collection requested");
                self.store.dispatch(StoreAction::CollectExecutionDetails(
                    CollectAction::Complete { job_id },
                ));
                // Force the listing to be refetched even inside its freshness window.
                self.store
                    .dispatch(JobProfilerSlot::wrap(SlotAction::Invalidate {
                        key: job_id,
                        expected_set_at: None,
                    }));
                self.refresh_execution_detail_files(job_id).await;
            }
            Err(err) => {
                warn!(%job_id, error = %err, "execution detail collection failed");
                self.store.dispatch(StoreAction::CollectExecutionDetails(
                    CollectAction::Fail {
                        job_id,
                        error: err.to_string(),
                    },
                ));
            }
        }
    }

    /// Fetch one slot entry unless it is in flight or still fresh.
    async fn refresh<S, F, Fut>(&self, key: S::Key, fetch: F)
    where
        S: CacheSlot,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<S::Data>>,
    {
        let policy = self.policy.slot(S::NAME);
        let started = self.store.dispatch_if(|state| {
            let skip = S::slot(&state.cached_data).get(&key).is_some_and(|entry| {
                entry.in_flight || (policy.invalidation_period.is_some() && entry.valid)
            });
            (!skip).then(|| S::wrap(SlotAction::Request { key: key.clone() }))
        });
        if !started {
            debug!(slot = %S::NAME, ?key, "refresh skipped, entry in flight or fresh");
            return;
        }

        match self.with_timeout(fetch()).await {
            Ok(data) => {
                debug!(slot = %S::NAME, ?key, "fetch completed");
                let set_at = self.store.dispatch_stamped(S::wrap(SlotAction::Receive {
                    key: key.clone(),
                    data,
                }));
                if let (Some(period), Some(set_at)) = (policy.invalidation_period, set_at) {
                    self.schedule_invalidation::<S>(key, set_at, period);
                }
            }
            Err(err) => {
                warn!(slot = %S::NAME, ?key, error = %err, "fetch failed");
                self.store.dispatch(S::wrap(SlotAction::Fail {
                    key,
                    unauthorized: err.is_unauthorized(),
                    error: err.to_string(),
                }));
            }
        }
    }

    /// Mark the entry written at `set_at` stale after `period`, unless it was
    /// rewritten meanwhile.
    fn schedule_invalidation<S: CacheSlot>(
        &self,
        key: S::Key,
        set_at: DateTime<Utc>,
        period: Duration,
    ) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            tokio::time::sleep(period).await;
            let invalidated = store.dispatch(S::wrap(SlotAction::Invalidate {
                key: key.clone(),
                expected_set_at: Some(set_at),
            }));
            if invalidated {
                debug!(slot = %S::NAME, ?key, "entry invalidated");
            }
        });
    }

    async fn with_timeout<T, Fut>(&self, fut: Fut) -> DomainResult<T>
    where
        Fut: Future<Output = DomainResult<T>>,
    {
        let timeout = self.policy.request_timeout;
        tokio::time::timeout(timeout, fut)
            .await
            .unwrap_or(Err(DomainError::Timeout(timeout)))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
