//! Process-wide state container for the console.
//!
//! The store holds an immutable [`AppState`] snapshot behind an `Arc` and
//! swaps it on every applied action. All mutation goes through
//! [`Store::dispatch`] / [`Store::dispatch_if`]; every applied action and every
//! dispatched command is published on a broadcast channel with a
//! monotonically increasing sequence number.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::domain::models::{AppState, ConsoleCommand, StoreAction};

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Monotonically increasing sequence number assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What was published.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum EventPayload {
    /// A command was handed to the dispatcher. Never mutates state.
    Command(ConsoleCommand),
    /// An action was reduced into the state.
    Action(StoreAction),
}

/// Envelope for everything published by the store.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

/// Shared client-side state container.
pub struct Store {
    state: RwLock<Arc<AppState>>,
    sequence: AtomicU64,
    sender: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(event_buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(event_buffer.max(1));
        Self {
            state: RwLock::new(Arc::new(AppState::default())),
            sequence: AtomicU64::new(0),
            sender,
        }
    }

    /// Current state snapshot. Cheap; never blocks on in-flight fetches.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Subscribe to commands and applied actions.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Sequence number of the last published event, zero if none.
    pub fn last_sequence(&self) -> SequenceNumber {
        SequenceNumber(self.sequence.load(Ordering::SeqCst))
    }

    /// Reduce `action` into the state. Returns `false` if it changed nothing.
    pub fn dispatch(&self, action: StoreAction) -> bool {
        self.dispatch_if(|_| Some(action))
    }

    /// Like [`Store::dispatch`], returning the time stamped on the applied
    /// action. For a `Receive` this is the entry's new `set_at`.
    pub fn dispatch_stamped(&self, action: StoreAction) -> Option<DateTime<Utc>> {
        self.reduce_if(|_| Some(action))
    }

    /// Evaluate `guard` against the current state and reduce the action it
    /// yields, atomically with respect to other writers.
    pub fn dispatch_if<F>(&self, guard: F) -> bool
    where
        F: FnOnce(&AppState) -> Option<StoreAction>,
    {
        self.reduce_if(guard).is_some()
    }

    fn reduce_if<F>(&self, guard: F) -> Option<DateTime<Utc>>
    where
        F: FnOnce(&AppState) -> Option<StoreAction>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let action = guard(&state)?;

        let now = Utc::now();
        let mut next = AppState::clone(&state);
        if !next.reduce(action.clone(), now) {
            trace!(kind = action.kind(), "action changed nothing");
            return None;
        }
        *state = Arc::new(next);

        // Publish under the write lock so event order matches reduction order.
        let sequence = self.publish(now, EventPayload::Action(action));
        drop(state);
        trace!(%sequence, "state updated");
        Some(now)
    }

    /// Publish a dispatched command without touching the state.
    pub fn record_command(&self, command: ConsoleCommand) -> SequenceNumber {
        debug!(kind = command.kind(), job_id = ?command.job_id(), "command dispatched");
        self.publish(Utc::now(), EventPayload::Command(command))
    }

    fn publish(&self, timestamp: DateTime<Utc>, payload: EventPayload) -> SequenceNumber {
        let sequence = SequenceNumber(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        // No receivers is not an error.
        let _ = self.sender.send(StoreEvent {
            sequence,
            timestamp,
            payload,
        });
        sequence
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("last_sequence", &self.last_sequence())
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}
