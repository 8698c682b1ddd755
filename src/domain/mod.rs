//! Domain layer for the console state tree
//!
//! This module contains the cache model, job payloads, commands and the
//! ports through which remote data enters the system.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult};
