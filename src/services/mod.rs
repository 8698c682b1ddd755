//! Store, selectors and command dispatch.

pub mod dispatcher;
pub mod selectors;
pub mod store;

pub use dispatcher::{CachePolicy, DispatchHandle, Dispatcher, SlotPolicy};
pub use selectors::{
    select_collect_execution_details, select_for_key, select_has_admin_role, select_id,
    select_user_sql_roles, KeyedSelector, RouteContext,
};
pub use store::{EventPayload, SequenceNumber, Store, StoreEvent};
