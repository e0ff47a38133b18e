//! Application layer - use cases and orchestration.
//!
//! This layer contains the sync engine plus the progress and summary
//! output around it.

pub mod formatter;
pub mod progress;
pub mod sync_engine;

pub use formatter::{format_report, OutputFormat};
pub use progress::{ConsoleReporter, SilentReporter, SyncReporter};
pub use sync_engine::SyncEngine;
