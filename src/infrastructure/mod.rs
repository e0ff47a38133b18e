//! Infrastructure layer - external adapters (HTTP, auth, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod auth;
pub mod config;
pub mod drive_client;
pub mod local_fs;

pub use auth::TokenProvider;
pub use config::{config_file_path, ensure_config_exists, load_config, render_config};
pub use drive_client::DriveClient;
pub use local_fs::{ensure_dir, existing_size, PartialFile};
