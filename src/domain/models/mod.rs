pub mod cache;
pub mod command;
pub mod config;
pub mod job;
pub mod state;

pub use cache::{CacheEntry, CacheSlotName, KeyedCachedData, SlotAction};
pub use command::ConsoleCommand;
pub use config::{CacheConfig, Config, LogConfig, LogFormat, RotationPolicy, SlotConfig};
pub use job::{
    CollectExecutionDetailsRequest, ExecutionDetailFile, JobId, JobMessage, JobResponse,
    JobStatus, ListJobProfilerExecutionDetailsResponse, UserSqlRolesResponse,
};
pub use state::{
    AppState, CacheSlot, CachedDataState, CollectAction, CollectRequestState, JobProfilerSlot,
    JobSlot, JobsState, StoreAction, UserSqlRolesSlot,
};
