//! Rendering of the final sync report.
//!
//! Supports multiple output formats: colored text, JSON, and table view.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{AppError, Result, SyncReport};

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary line.
    #[default]
    Text,
    /// JSON format for programmatic use.
    Json,
    /// Table of counters.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: text, json, table")),
        }
    }
}

/// Render a report in the requested format.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn format_report(report: &SyncReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_report_text(report)),
        OutputFormat::Json => format_report_json(report),
        OutputFormat::Table => Ok(format_report_table(report)),
    }
}

/// Summary line, flagged when the run was interrupted or had failures.
pub fn format_report_text(report: &SyncReport) -> String {
    let summary = report.stats.summary();
    let seconds = duration_secs(report);

    if report.cancelled {
        format!(
            "{} {summary} ({seconds:.1}s)",
            "⏹  Sync interrupted:".yellow().bold()
        )
    } else if report.stats.failed > 0 {
        format!(
            "{} {summary} ({seconds:.1}s)",
            "⚠  Sync finished with failures:".yellow().bold()
        )
    } else {
        format!("{} {summary} ({seconds:.1}s)", "✅ Sync complete:".green().bold())
    }
}

/// Report as pretty JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_report_json(report: &SyncReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(AppError::json_parse)
}

/// Counters as a two-column table.
pub fn format_report_table(report: &SyncReport) -> String {
    let stats = &report.stats;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Outcome", "Count"]);

    let rows = [
        ("Downloaded", stats.downloaded),
        ("Exported", stats.exported),
        ("Skipped (up to date)", stats.skipped),
        ("Unsupported", stats.unsupported),
        ("Failed", stats.failed),
    ];
    for (label, count) in rows {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }

    let status = if report.cancelled { "interrupted" } else { "complete" };
    table.add_row(vec!["Status".to_string(), status.to_string()]);
    table.add_row(vec![
        "Duration".to_string(),
        format!("{:.1}s", duration_secs(report)),
    ]);

    table.to_string()
}

#[allow(clippy::cast_precision_loss)]
fn duration_secs(report: &SyncReport) -> f64 {
    report.elapsed_ms as f64 / 1000.0
}
