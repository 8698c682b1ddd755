use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::application::ConsoleApp;
use crate::cli::output::table::TableFormatter;
use crate::cli::{JobArgs, JobCommands};
use crate::domain::models::JobId;
use crate::services::{select_collect_execution_details, DispatchHandle, RouteContext};
use crate::views::JobDetailsStateProps;

pub async fn execute(args: JobArgs, app: &ConsoleApp, json: bool) -> Result<()> {
    match args.command {
        JobCommands::Show { id } => handle_show(app, id, json).await,
        JobCommands::Collect { id } => handle_collect(app, id, json).await,
        JobCommands::Download {
            id,
            filename,
            output,
        } => handle_download(app, id, &filename, output).await,
    }
}

/// Mount the page, wait for its refreshes, and print the resulting props
async fn handle_show(app: &ConsoleApp, id: JobId, json: bool) -> Result<()> {
    let page = app.job_details_page(RouteContext::for_job(id));
    DispatchHandle::settle_all(page.mount()).await;

    let props = page.props();
    ensure_job_loaded(id, &props)?;
    print_props(&props, json)
}

/// Trigger collection, then print the listing refreshed by its completion
async fn handle_collect(app: &ConsoleApp, id: JobId, json: bool) -> Result<()> {
    let page = app.job_details_page(RouteContext::for_job(id));
    DispatchHandle::settle_all(page.mount()).await;

    let props = page.props();
    ensure_job_loaded(id, &props)?;
    if !props.has_admin_role {
        bail!("Collecting execution details requires the ADMIN role");
    }

    page.dispatch_props()
        .on_request_execution_details(id)
        .settled()
        .await;

    let status = select_collect_execution_details(&app.store().state(), id)
        .context("Collection request was not recorded")?;
    if let Some(ref error) = status.last_error {
        bail!("Failed to collect execution details for job {id}: {error}");
    }

    print_props(&page.props(), json)
}

async fn handle_download(
    app: &ConsoleApp,
    id: JobId,
    filename: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let page = app.job_details_page(RouteContext::for_job(id));
    let file = page
        .dispatch_props()
        .on_download_execution_file_clicked(id, filename)
        .await
        .with_context(|| format!("Failed to download {filename} for job {id}"))?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &file.data)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", file.data.len(), path.display());
        }
        None => {
            std::io::stdout()
                .write_all(&file.data)
                .context("Failed to write file to stdout")?;
        }
    }
    Ok(())
}

fn ensure_job_loaded(id: JobId, props: &JobDetailsStateProps) -> Result<()> {
    let Some(entry) = props.job_request.as_ref() else {
        bail!("Job {id} was not loaded");
    };
    if entry.data.is_none() {
        let reason = entry.last_error.as_deref().unwrap_or("no data returned");
        bail!("Failed to load job {id}: {reason}");
    }
    Ok(())
}

fn print_props(props: &JobDetailsStateProps, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(props)?);
    } else {
        println!("{}", TableFormatter::new().format_job_details(props));
    }
    Ok(())
}
