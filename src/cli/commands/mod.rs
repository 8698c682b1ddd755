//! CLI command implementations.

pub mod job;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::fixture::FixtureConsoleApi;
use crate::application::ConsoleApp;
use crate::cli::{Cli, Commands};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;

/// Load configuration, start logging, build the app and run the command.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    let api = FixtureConsoleApi::from_path(&cli.fixtures)?;
    let app = ConsoleApp::new(&config, Arc::new(api));

    match cli.command {
        Commands::Job(args) => job::execute(args, &app, cli.json).await,
    }
}
