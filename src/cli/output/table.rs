//! Table output formatting for CLI commands
//!
//! Renders job details props with comfy-table.

use std::env;

use chrono::{DateTime, Utc};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::{CacheEntry, JobStatus};
use crate::views::JobDetailsStateProps;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    pub const fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Job record, cache metadata and execution detail files
    pub fn format_job_details(&self, props: &JobDetailsStateProps) -> String {
        let mut sections = Vec::new();

        let mut job_table = Self::create_base_table();
        job_table.set_header(vec![
            Cell::new("Field").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);
        if let Some(job) = props.job_request.as_ref().and_then(|e| e.data.as_ref()) {
            job_table.add_row(vec![Cell::new("ID"), Cell::new(job.id)]);
            job_table.add_row(vec![Cell::new("Type"), Cell::new(&job.job_type)]);
            job_table.add_row(vec![Cell::new("Description"), Cell::new(&job.description)]);
            job_table.add_row(vec![Cell::new("User"), Cell::new(&job.username)]);
            job_table.add_row(vec![Cell::new("Status"), self.status_cell(job.status)]);
            if let Some(ref running) = job.running_status {
                job_table.add_row(vec![Cell::new("Running status"), Cell::new(running)]);
            }
            job_table.add_row(vec![
                Cell::new("Progress"),
                Cell::new(format!("{:.0}%", job.fraction_completed * 100.0)),
            ]);
            job_table.add_row(vec![Cell::new("Created"), Cell::new(format_time(Some(job.created)))]);
            job_table.add_row(vec![Cell::new("Finished"), Cell::new(format_time(job.finished))]);
            if let Some(ref error) = job.error {
                job_table.add_row(vec![Cell::new("Error"), self.error_cell(error)]);
            }
        }
        if let Some(ref entry) = props.job_request {
            job_table.add_row(vec![Cell::new("Fetched"), Cell::new(format_time(entry.set_at))]);
        }
        sections.push(job_table.to_string());

        let mut files_table = Self::create_base_table();
        files_table.set_header(vec![Cell::new("Execution detail files").add_attribute(Attribute::Bold)]);
        let files = props
            .job_profiler_execution_detail_files_response
            .as_ref()
            .and_then(|e| e.data.as_ref())
            .map(|listing| listing.files.as_slice())
            .unwrap_or_default();
        if files.is_empty() {
            files_table.add_row(vec![Cell::new("-")]);
        }
        for file in files {
            files_table.add_row(vec![Cell::new(file)]);
        }
        sections.push(files_table.to_string());

        let validity = match props.job_profiler_data_is_valid {
            Some(true) => "valid",
            Some(false) => "stale",
            None => "not fetched",
        };
        let mut footer = format!(
            "Files last updated: {} ({validity})",
            format_time(props.job_profiler_last_updated)
        );
        if let Some(error) = props
            .job_profiler_execution_detail_files_response
            .as_deref()
            .and_then(last_error)
        {
            footer.push_str(&format!("\nFiles error: {error}"));
        }
        footer.push_str(&format!(
            "\nAdmin: {}",
            if props.has_admin_role { "yes" } else { "no" }
        ));
        sections.push(footer);

        sections.join("\n")
    }

    fn create_base_table() -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }

    fn status_cell(&self, status: JobStatus) -> Cell {
        if !self.use_colors {
            return Cell::new(status);
        }
        let color = match status {
            JobStatus::Succeeded => Color::Green,
            JobStatus::Failed | JobStatus::RevertFailed => Color::Red,
            JobStatus::Canceled | JobStatus::CancelRequested => Color::DarkGrey,
            JobStatus::Paused | JobStatus::PauseRequested => Color::Yellow,
            JobStatus::Running | JobStatus::Pending | JobStatus::Reverting => Color::Cyan,
        };
        Cell::new(status).fg(color)
    }

    fn error_cell(&self, error: &str) -> Cell {
        if self.use_colors {
            Cell::new(error).fg(Color::Red)
        } else {
            Cell::new(error)
        }
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn last_error<T>(entry: &CacheEntry<T>) -> Option<&str> {
    entry.last_error.as_deref()
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

/// Honour NO_COLOR and dumb terminals
fn supports_color() -> bool {
    env::var_os("NO_COLOR").is_none() && !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}
