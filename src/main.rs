//! dbconsole CLI entry point.

use clap::Parser;

use dbconsole::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = dbconsole::cli::commands::execute(cli).await {
        dbconsole::cli::handle_error(&err, json);
    }
}
