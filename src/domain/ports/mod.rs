//! Port trait definitions (Hexagonal Architecture)
//!
//! Adapters implement these traits so the store and dispatcher never
//! depend on how remote data is transported.

pub mod console_api;

pub use console_api::ConsoleApi;
