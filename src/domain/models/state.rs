//! Application state tree and the actions that mutate it.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::cache::{CacheSlotName, KeyedCachedData, SlotAction};
use super::job::{JobId, JobResponse, ListJobProfilerExecutionDetailsResponse, UserSqlRolesResponse};

/// Type-level description of a cache slot: its name, key, payload, and where
/// it lives in the state tree.
pub trait CacheSlot: Send + Sync + 'static {
    type Key: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static;
    type Data: Clone + fmt::Debug + Send + Sync + 'static;

    const NAME: CacheSlotName;

    fn slot(state: &CachedDataState) -> &KeyedCachedData<Self::Key, Self::Data>;

    fn slot_mut(state: &mut CachedDataState) -> &mut KeyedCachedData<Self::Key, Self::Data>;

    fn wrap(action: SlotAction<Self::Key, Self::Data>) -> StoreAction;
}

/// Job records keyed by job id.
#[derive(Debug, Clone, Copy)]
pub struct JobSlot;

/// Execution detail file listings keyed by job id.
#[derive(Debug, Clone, Copy)]
pub struct JobProfilerSlot;

/// SQL roles of the logged-in user. Not keyed.
#[derive(Debug, Clone, Copy)]
pub struct UserSqlRolesSlot;

impl CacheSlot for JobSlot {
    type Key = JobId;
    type Data = JobResponse;

    const NAME: CacheSlotName = CacheSlotName::JOB;

    fn slot(state: &CachedDataState) -> &KeyedCachedData<JobId, JobResponse> {
        &state.job
    }

    fn slot_mut(state: &mut CachedDataState) -> &mut KeyedCachedData<JobId, JobResponse> {
        &mut state.job
    }

    fn wrap(action: SlotAction<JobId, JobResponse>) -> StoreAction {
        StoreAction::Job(action)
    }
}

impl CacheSlot for JobProfilerSlot {
    type Key = JobId;
    type Data = ListJobProfilerExecutionDetailsResponse;

    const NAME: CacheSlotName = CacheSlotName::JOB_PROFILER;

    fn slot(state: &CachedDataState) -> &KeyedCachedData<JobId, Self::Data> {
        &state.job_profiler
    }

    fn slot_mut(state: &mut CachedDataState) -> &mut KeyedCachedData<JobId, Self::Data> {
        &mut state.job_profiler
    }

    fn wrap(action: SlotAction<JobId, Self::Data>) -> StoreAction {
        StoreAction::JobProfiler(action)
    }
}

impl CacheSlot for UserSqlRolesSlot {
    type Key = ();
    type Data = UserSqlRolesResponse;

    const NAME: CacheSlotName = CacheSlotName::USER_SQL_ROLES;

    fn slot(state: &CachedDataState) -> &KeyedCachedData<(), UserSqlRolesResponse> {
        &state.user_sql_roles
    }

    fn slot_mut(state: &mut CachedDataState) -> &mut KeyedCachedData<(), UserSqlRolesResponse> {
        &mut state.user_sql_roles
    }

    fn wrap(action: SlotAction<(), UserSqlRolesResponse>) -> StoreAction {
        StoreAction::UserSqlRoles(action)
    }
}

/// All cached server data, one field per slot.
#[derive(Debug, Clone, Default)]
pub struct CachedDataState {
    pub job: KeyedCachedData<JobId, JobResponse>,
    pub job_profiler: KeyedCachedData<JobId, ListJobProfilerExecutionDetailsResponse>,
    pub user_sql_roles: KeyedCachedData<(), UserSqlRolesResponse>,
}

impl CachedDataState {
    fn apply<S: CacheSlot>(&mut self, action: SlotAction<S::Key, S::Data>, now: DateTime<Utc>) -> bool {
        S::slot_mut(self).apply(action, now)
    }
}

/// Status of the most recent execution detail collection request for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectRequestState {
    pub in_flight: bool,
    pub succeeded: bool,
    pub requested_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Job page state that is not server data.
#[derive(Debug, Clone, Default)]
pub struct JobsState {
    pub collect_execution_details: HashMap<JobId, Arc<CollectRequestState>>,
}

impl JobsState {
    fn apply(&mut self, action: CollectAction, now: DateTime<Utc>) -> bool {
        let job_id = action.job_id();
        let prev = self
            .collect_execution_details
            .get(&job_id)
            .map(|s| CollectRequestState::clone(s))
            .unwrap_or_default();

        let next = match action {
            CollectAction::Request { .. } => CollectRequestState {
                in_flight: true,
                succeeded: false,
                requested_at: Some(now),
                completed_at: None,
                last_error: None,
            },
            CollectAction::Complete { .. } => CollectRequestState {
                in_flight: false,
                succeeded: true,
                completed_at: Some(now),
                last_error: None,
                ..prev
            },
            CollectAction::Fail { error, .. } => CollectRequestState {
                in_flight: false,
                succeeded: false,
                completed_at: Some(now),
                last_error: Some(error),
                ..prev
            },
        };
        self.collect_execution_details.insert(job_id, Arc::new(next));
        true
    }
}

/// Lifecycle of an execution detail collection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectAction {
    Request { job_id: JobId },
    Complete { job_id: JobId },
    Fail { job_id: JobId, error: String },
}

impl CollectAction {
    pub const fn job_id(&self) -> JobId {
        match self {
            Self::Request { job_id } | Self::Complete { job_id } | Self::Fail { job_id, .. } => {
                *job_id
            }
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::Complete { .. } => "complete",
            Self::Fail { .. } => "fail",
        }
    }
}

/// Every mutation of [`AppState`].
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum StoreAction {
    Job(SlotAction<JobId, JobResponse>),
    JobProfiler(SlotAction<JobId, ListJobProfilerExecutionDetailsResponse>),
    UserSqlRoles(SlotAction<(), UserSqlRolesResponse>),
    CollectExecutionDetails(CollectAction),
}

impl StoreAction {
    /// Slot touched by this action, if it targets cached data.
    pub const fn slot_name(&self) -> Option<CacheSlotName> {
        match self {
            Self::Job(_) => Some(JobSlot::NAME),
            Self::JobProfiler(_) => Some(JobProfilerSlot::NAME),
            Self::UserSqlRoles(_) => Some(UserSqlRolesSlot::NAME),
            Self::CollectExecutionDetails(_) => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Job(a) => a.kind(),
            Self::JobProfiler(a) => a.kind(),
            Self::UserSqlRoles(a) => a.kind(),
            Self::CollectExecutionDetails(a) => a.kind(),
        }
    }

    /// Job the action concerns, if any.
    pub const fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Job(a) => Some(*a.key()),
            Self::JobProfiler(a) => Some(*a.key()),
            Self::UserSqlRoles(_) => None,
            Self::CollectExecutionDetails(a) => Some(a.job_id()),
        }
    }
}

/// Snapshot of the whole client-side state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub cached_data: CachedDataState,
    pub jobs: JobsState,
}

impl AppState {
    /// Reduce one action into the state. Returns `false` if nothing changed.
    pub fn reduce(&mut self, action: StoreAction, now: DateTime<Utc>) -> bool {
        match action {
            StoreAction::Job(a) => self.cached_data.apply::<JobSlot>(a, now),
            StoreAction::JobProfiler(a) => self.cached_data.apply::<JobProfilerSlot>(a, now),
            StoreAction::UserSqlRoles(a) => self.cached_data.apply::<UserSqlRolesSlot>(a, now),
            StoreAction::CollectExecutionDetails(a) => self.jobs.apply(a, now),
        }
    }
}
