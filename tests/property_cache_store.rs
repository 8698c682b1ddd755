use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dbconsole::domain::models::{
    JobId, JobProfilerSlot, JobSlot, ListJobProfilerExecutionDetailsResponse, SlotAction,
    StoreAction,
};
use dbconsole::services::{select_for_key, select_id, RouteContext, Store};
use proptest::prelude::*;

fn listing(n: usize) -> ListJobProfilerExecutionDetailsResponse {
    ListJobProfilerExecutionDetailsResponse {
        files: (0..n).map(|i| format!("file-{i}.txt")).collect(),
    }
}

proptest! {
    /// Property: keys that were never written select as absent
    #[test]
    fn prop_unwritten_keys_are_absent(
        written in proptest::collection::hash_set(any::<i64>(), 0..20),
        probe in any::<i64>(),
    ) {
        prop_assume!(!written.contains(&probe));

        let store = Store::default();
        for &id in &written {
            store.dispatch(StoreAction::JobProfiler(SlotAction::Receive {
                key: JobId::new(id),
                data: listing(1),
            }));
        }

        let selector = select_for_key::<JobProfilerSlot, RouteContext>(select_id);
        let state = store.state();
        prop_assert!(selector.select(&state, &RouteContext::for_job(JobId::new(probe))).is_none());

        // Other slots are untouched by writes to this one.
        let job_selector = select_for_key::<JobSlot, RouteContext>(select_id);
        for &id in &written {
            prop_assert!(job_selector.select(&state, &RouteContext::for_job(JobId::new(id))).is_none());
        }
    }

    /// Property: a successful write is visible with set_at at or after the write
    #[test]
    fn prop_write_then_read(
        id in any::<i64>(),
        files in 0usize..8,
    ) {
        let store = Store::default();
        let before = Utc::now();
        store.dispatch(StoreAction::JobProfiler(SlotAction::Receive {
            key: JobId::new(id),
            data: listing(files),
        }));

        let selector = select_for_key::<JobProfilerSlot, RouteContext>(select_id);
        let entry = selector
            .select(&store.state(), &RouteContext::for_job(JobId::new(id)))
            .expect("written entry");
        prop_assert!(entry.valid);
        prop_assert!(entry.set_at.expect("set_at") >= before);
        prop_assert_eq!(entry.data.as_ref().map(|l| l.files.len()), Some(files));
    }

    /// Property: reads without an intervening write are identical
    #[test]
    fn prop_reads_are_idempotent(
        ids in proptest::collection::vec(any::<i64>(), 1..10),
        pick in any::<proptest::sample::Index>(),
    ) {
        let store = Store::default();
        for &id in &ids {
            store.dispatch(StoreAction::JobProfiler(SlotAction::Request { key: JobId::new(id) }));
        }
        let id = ids[pick.index(ids.len())];
        let route = RouteContext::for_job(JobId::new(id));
        let selector = select_for_key::<JobProfilerSlot, RouteContext>(select_id);

        let state = store.state();
        let first = selector.select(&state, &route).expect("entry");
        let second = selector.select(&state, &route).expect("entry");
        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(&*first, &*second);
    }

    /// Property: at most one entry per key, whatever the action sequence
    #[test]
    fn prop_one_entry_per_key(
        ops in proptest::collection::vec((0i64..5, 0u8..4), 0..40),
    ) {
        let store = Store::default();
        for (id, op) in ops.iter().copied() {
            let key = JobId::new(id);
            let action = match op {
                0 => SlotAction::Request { key },
                1 => SlotAction::Receive { key, data: listing(1) },
                2 => SlotAction::Fail { key, error: "boom".to_string(), unauthorized: false },
                _ => SlotAction::Invalidate { key, expected_set_at: None },
            };
            store.dispatch(StoreAction::JobProfiler(action));
        }

        let created: HashSet<i64> = ops
            .iter()
            .filter(|(_, op)| *op < 3)
            .map(|(id, _)| *id)
            .collect();
        prop_assert_eq!(store.state().cached_data.job_profiler.len(), created.len());
    }
}
