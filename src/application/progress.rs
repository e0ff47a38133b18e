//! Per-entry progress reporting.
//!
//! The engine calls a [`SyncReporter`] for every decision it makes; the CLI
//! plugs in [`ConsoleReporter`], tests and quiet runs use [`SilentReporter`].

use std::io::Write;

use colored::Colorize;

use crate::domain::{AppError, NativeKind};

/// What kind of transfer is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Raw download; `size` is the remote size when known.
    Download { size: Option<u64> },
    /// Native document export to a portable format.
    Export { extension: &'static str },
}

/// Receives progress events from a sync run.
///
/// `depth` is 0 for entries directly under the root.
pub trait SyncReporter: Send + Sync {
    fn folder(&self, _name: &str, _depth: usize) {}
    fn folder_failed(&self, _name: &str, _error: &AppError, _depth: usize) {}
    fn up_to_date(&self, _name: &str, _depth: usize) {}
    fn unsupported(&self, _name: &str, _kind: &NativeKind, _depth: usize) {}
    fn fetch_started(&self, _name: &str, _transfer: Transfer, _depth: usize) {}
    fn fetch_finished(&self, _name: &str, _bytes: u64, _depth: usize) {}
    fn fetch_failed(&self, _name: &str, _error: &AppError, _depth: usize) {}
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl SyncReporter for SilentReporter {}

/// Tree-shaped, colored output on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

impl SyncReporter for ConsoleReporter {
    fn folder(&self, name: &str, depth: usize) {
        println!("{}{}", indent(depth), format!("📁 {name}/").cyan());
    }

    fn folder_failed(&self, name: &str, error: &AppError, depth: usize) {
        println!(
            "{}{} {}",
            indent(depth),
            format!("  ✗  {name}/").red(),
            error.to_string().red()
        );
    }

    fn up_to_date(&self, name: &str, depth: usize) {
        println!("{}{}", indent(depth), format!("  =  {name}  [up to date]").dimmed());
    }

    fn unsupported(&self, name: &str, kind: &NativeKind, depth: usize) {
        println!(
            "{}{}",
            indent(depth),
            format!("  ⚠  {name}  [{kind}: cannot export, skipped]").dimmed()
        );
    }

    fn fetch_started(&self, name: &str, transfer: Transfer, depth: usize) {
        let line = match transfer {
            Transfer::Download { size } => {
                let label = size.map_or_else(|| "unknown size".to_string(), format_size);
                format!("  ↓  {name}  [{label}]")
            }
            Transfer::Export { extension } => format!("  ↓  {name}{extension}  [export]"),
        };
        print!("{}{} ", indent(depth), line.dimmed());
        if let Err(e) = std::io::stdout().flush() {
            tracing::debug!(error = %e, "Failed to flush stdout");
        }
    }

    fn fetch_finished(&self, _name: &str, _bytes: u64, _depth: usize) {
        println!("{}", "✓".green());
    }

    fn fetch_failed(&self, _name: &str, error: &AppError, _depth: usize) {
        println!("{}", format!("✗ {error}").red());
    }
}

/// Size in KB with one decimal, as shown next to downloads.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    format!("{kb:.1} KB")
}
