//! dbconsole - job details state for a database admin console
//!
//! A keyed, time-stamped client-side cache for remotely fetched resources,
//! with selectors, a command dispatcher and the job details page wiring
//! built on top of it.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): cache model, state tree, commands, ports
//! - **Service Layer** (`services`): store, selectors, dispatcher
//! - **Views** (`views`): state-to-props and dispatch-to-props wiring
//! - **Application Layer** (`application`): composition root
//! - **Adapters** (`adapters`): fixture-backed console API
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dbconsole::{ConsoleApp, Config, JobId, RouteContext};
//! use dbconsole::adapters::fixture::FixtureConsoleApi;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = FixtureConsoleApi::from_path("fixtures.yaml")?;
//!     let app = ConsoleApp::new(&Config::default(), Arc::new(api));
//!     let page = app.job_details_page(RouteContext::for_job(JobId::new(42)));
//!     dbconsole::DispatchHandle::settle_all(page.mount()).await;
//!     println!("{:?}", page.props());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod views;

// Re-export commonly used types for convenience
pub use application::ConsoleApp;
pub use domain::models::{
    AppState, CacheEntry, CacheSlot, CacheSlotName, Config, ConsoleCommand, JobId,
    JobProfilerSlot, JobSlot, StoreAction, UserSqlRolesSlot,
};
pub use domain::ports::ConsoleApi;
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    select_for_key, select_id, DispatchHandle, Dispatcher, RouteContext, Store,
};
pub use views::{map_state_to_props, JobDetailsPage, JobDetailsStateProps};
