//! Command-line interface for inspecting job details through the store.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::models::JobId;

#[derive(Debug, Parser)]
#[command(name = "dbconsole", version, about = "Job details through the console cache store")]
pub struct Cli {
    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .dbconsole/config.yaml)
    #[arg(long, global = true, env = "DBCONSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fixture document serving the admin API
    #[arg(long, global = true, env = "DBCONSOLE_FIXTURES", default_value = ".dbconsole/fixtures.yaml")]
    pub fixtures: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Job details page operations
    Job(JobArgs),
}

#[derive(Debug, Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommands,
}

#[derive(Debug, Subcommand)]
pub enum JobCommands {
    /// Load the job details page and print its props
    Show {
        /// Job id
        id: JobId,
    },
    /// Request execution details collection, then print the refreshed listing
    Collect {
        /// Job id
        id: JobId,
    },
    /// Download one execution detail file
    Download {
        /// Job id
        id: JobId,
        /// File name as listed by `job show`
        filename: String,
        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Print an error and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
