//! Domain layer - core types and rules.
//!
//! Naming, classification and statistics live here as pure functions over
//! plain data; the only seam to the outside world is the `RemoteDrive` port.

pub mod config;
pub mod error;
pub mod folder_ref;
pub mod models;
pub mod policy;
pub mod ports;
pub mod sanitize;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use folder_ref::parse_folder_ref;
pub use models::{
    EntryKind, LocalTarget, NativeKind, Outcome, RemoteEntry, SyncReport, SyncStats,
};
pub use policy::{classify, SyncDecision};
pub use ports::{ByteSink, RemoteDrive};
pub use sanitize::sanitize;
