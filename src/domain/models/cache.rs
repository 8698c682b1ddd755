//! Keyed cache entries for asynchronously fetched remote resources.
//!
//! A slot maps an entity key to an [`CacheEntry`]. Entries are held behind
//! `Arc` and every write replaces the entry wholesale, so an entry that has
//! not been rewritten keeps its pointer identity across state snapshots.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of a category of cached remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CacheSlotName(&'static str);

impl CacheSlotName {
    pub const JOB: Self = Self("job");
    pub const JOB_PROFILER: Self = Self("jobProfiler");
    pub const USER_SQL_ROLES: Self = Self("userSQLRoles");

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CacheSlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Cached payload plus the metadata describing its freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Last successfully fetched payload.
    pub data: Option<T>,
    /// Whether `data` is considered fresh by consumers.
    pub valid: bool,
    /// A fetch for this key is outstanding.
    pub in_flight: bool,
    /// When `data` was last written.
    pub set_at: Option<DateTime<Utc>>,
    /// When the most recent fetch was requested.
    pub requested_at: Option<DateTime<Utc>>,
    /// Message of the most recent failed fetch.
    pub last_error: Option<String>,
    /// The most recent failure was an authorization refusal.
    pub unauthorized: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            valid: false,
            in_flight: false,
            set_at: None,
            requested_at: None,
            last_error: None,
            unauthorized: false,
        }
    }
}

impl<T> CacheEntry<T> {
    pub const fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Mutation of a single slot. Applied only through the store's reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotAction<K, D> {
    /// A fetch was started.
    Request { key: K },
    /// A fetch completed successfully.
    Receive { key: K, data: D },
    /// A fetch failed.
    Fail {
        key: K,
        error: String,
        unauthorized: bool,
    },
    /// Mark the entry stale. With `expected_set_at`, only if the entry was
    /// not rewritten since that time.
    Invalidate {
        key: K,
        expected_set_at: Option<DateTime<Utc>>,
    },
    /// Drop the entry.
    Clear { key: K },
}

impl<K, D> SlotAction<K, D> {
    pub const fn key(&self) -> &K {
        match self {
            Self::Request { key }
            | Self::Receive { key, .. }
            | Self::Fail { key, .. }
            | Self::Invalidate { key, .. }
            | Self::Clear { key } => key,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::Receive { .. } => "receive",
            Self::Fail { .. } => "fail",
            Self::Invalidate { .. } => "invalidate",
            Self::Clear { .. } => "clear",
        }
    }
}

/// Entries of one slot, keyed by entity identifier.
#[derive(Debug, Clone)]
pub struct KeyedCachedData<K, D> {
    entries: HashMap<K, Arc<CacheEntry<D>>>,
}

impl<K, D> Default for KeyedCachedData<K, D> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, D: Clone> KeyedCachedData<K, D> {
    pub fn get(&self, key: &K) -> Option<&Arc<CacheEntry<D>>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<CacheEntry<D>>)> {
        self.entries.iter()
    }

    /// Apply an action at time `now`. Returns `false` if nothing changed.
    pub fn apply(&mut self, action: SlotAction<K, D>, now: DateTime<Utc>) -> bool {
        match action {
            SlotAction::Request { key } => {
                let next = CacheEntry {
                    in_flight: true,
                    requested_at: Some(now),
                    ..self.snapshot(&key)
                };
                self.entries.insert(key, Arc::new(next));
                true
            }
            SlotAction::Receive { key, data } => {
                let requested_at = self.entries.get(&key).and_then(|e| e.requested_at);
                let next = CacheEntry {
                    data: Some(data),
                    valid: true,
                    in_flight: false,
                    set_at: Some(now),
                    requested_at,
                    last_error: None,
                    unauthorized: false,
                };
                self.entries.insert(key, Arc::new(next));
                true
            }
            SlotAction::Fail {
                key,
                error,
                unauthorized,
            } => {
                let next = CacheEntry {
                    valid: false,
                    in_flight: false,
                    last_error: Some(error),
                    unauthorized,
                    ..self.snapshot(&key)
                };
                self.entries.insert(key, Arc::new(next));
                true
            }
            SlotAction::Invalidate {
                key,
                expected_set_at,
            } => {
                let stale = match self.entries.get(&key) {
                    Some(entry) => {
                        entry.valid && expected_set_at.is_none_or(|t| entry.set_at == Some(t))
                    }
                    None => false,
                };
                if stale {
                    let next = CacheEntry {
                        valid: false,
                        ..self.snapshot(&key)
                    };
                    self.entries.insert(key, Arc::new(next));
                }
                stale
            }
            SlotAction::Clear { key } => self.entries.remove(&key).is_some(),
        }
    }

    fn snapshot(&self, key: &K) -> CacheEntry<D> {
        self.entries
            .get(key)
            .map(|entry| (**entry).clone())
            .unwrap_or_default()
    }
}
