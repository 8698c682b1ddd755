//! Fixture-backed console API for the CLI and tests.

pub mod fixture_console_api;

pub use fixture_console_api::{ConsoleFixture, ExecutionDetailsFixture, FixtureConsoleApi, FixtureFile};
