//! Output formatting utilities for the CLI.

pub mod table;

pub use table::TableFormatter;
