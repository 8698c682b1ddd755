//! Pure selectors deriving view values from the state tree.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::domain::models::{
    AppState, CacheEntry, CacheSlot, CollectRequestState, JobId, UserSqlRolesSlot,
};

/// Route parameter carrying the job id on the job details page.
pub const ID_PARAM: &str = "id";

/// Role that grants access to admin-only actions.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Parsed route parameters of the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteContext {
    params: HashMap<String, String>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route context of the job details page for `job_id`.
    pub fn for_job(job_id: JobId) -> Self {
        Self::new().with_param(ID_PARAM, job_id.to_string())
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Job id from the route's `id` parameter, if present and numeric.
pub fn select_id(route: &RouteContext) -> Option<JobId> {
    route.param(ID_PARAM)?.parse().ok()
}

/// Selector over one cache slot. The key is derived from the request context.
pub struct KeyedSelector<S: CacheSlot, C> {
    extract_id: fn(&C) -> Option<S::Key>,
    _slot: PhantomData<fn() -> S>,
}

/// Build a selector returning `state.cached_data[S][extract_id(context)]`.
pub fn select_for_key<S: CacheSlot, C>(extract_id: fn(&C) -> Option<S::Key>) -> KeyedSelector<S, C> {
    KeyedSelector {
        extract_id,
        _slot: PhantomData,
    }
}

impl<S: CacheSlot, C> KeyedSelector<S, C> {
    /// Entry for the context's key, or `None` if the key cannot be derived
    /// or nothing was cached for it. Returns the stored `Arc`, so repeated
    /// calls on an unchanged entry are pointer-equal.
    pub fn select(&self, state: &AppState, context: &C) -> Option<Arc<CacheEntry<S::Data>>> {
        let key = (self.extract_id)(context)?;
        let entry = S::slot(&state.cached_data).get(&key).cloned();
        trace!(slot = %S::NAME, ?key, hit = entry.is_some(), "selected cache entry");
        entry
    }
}

impl<S: CacheSlot, C> Clone for KeyedSelector<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: CacheSlot, C> Copy for KeyedSelector<S, C> {}

impl<S: CacheSlot, C> fmt::Debug for KeyedSelector<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedSelector")
            .field("slot", &S::NAME)
            .finish_non_exhaustive()
    }
}

/// Roles of the logged-in user; empty until fetched.
pub fn select_user_sql_roles(state: &AppState) -> &[String] {
    UserSqlRolesSlot::slot(&state.cached_data)
        .get(&())
        .and_then(|entry| entry.data.as_ref())
        .map(|roles| roles.roles.as_slice())
        .unwrap_or_default()
}

pub fn select_has_admin_role(state: &AppState) -> bool {
    select_user_sql_roles(state).iter().any(|role| role == ADMIN_ROLE)
}

/// Status of the latest execution detail collection request for a job.
pub fn select_collect_execution_details(
    state: &AppState,
    job_id: JobId,
) -> Option<Arc<CollectRequestState>> {
    state.jobs.collect_execution_details.get(&job_id).cloned()
}
