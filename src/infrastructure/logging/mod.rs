//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty log formatting
//! - Log rotation through tracing-appender

pub mod logger;

pub use logger::LoggerImpl;
