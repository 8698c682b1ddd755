//! Composition root: one store, one dispatcher, one API adapter.

use std::sync::Arc;

use tracing::info;

use crate::domain::models::Config;
use crate::domain::ports::ConsoleApi;
use crate::services::{CachePolicy, Dispatcher, RouteContext, Store};
use crate::views::JobDetailsPage;

/// Wires the shared store to a console API.
#[derive(Debug, Clone)]
pub struct ConsoleApp {
    dispatcher: Dispatcher,
}

impl ConsoleApp {
    pub fn new(config: &Config, api: Arc<dyn ConsoleApi>) -> Self {
        let store = Arc::new(Store::new(config.event_buffer));
        let policy = CachePolicy::from(&config.cache);
        info!(
            request_timeout_ms = config.cache.request_timeout_ms,
            event_buffer = config.event_buffer,
            "console store initialized"
        );
        Self {
            dispatcher: Dispatcher::new(store, api, policy),
        }
    }

    pub const fn store(&self) -> &Arc<Store> {
        self.dispatcher.store()
    }

    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Job details page connected to this app's store.
    pub fn job_details_page(&self, route: RouteContext) -> JobDetailsPage {
        JobDetailsPage::connect(self.dispatcher.clone(), route)
    }
}
