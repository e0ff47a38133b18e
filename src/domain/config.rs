//! Application configuration.
//!
//! Everything here has a default, so a missing or partial config file is
//! never an error.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Drive API endpoint and listing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Base URL of the Drive v3 REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Entries requested per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Whether to include items that live in shared drives.
    #[serde(default = "default_include_shared_drives")]
    pub include_shared_drives: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            page_size: default_page_size(),
            include_shared_drives: default_include_shared_drives(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

const fn default_page_size() -> u32 {
    1000
}

const fn default_include_shared_drives() -> bool {
    true
}

/// Timeout and retry policy for HTTP requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Upper bound for one request, body included, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Retries for throttled (429) or server-error (5xx) responses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles on every retry.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

const fn default_request_timeout() -> u64 {
    300 // 5 minutes
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_base_delay() -> u64 {
    500
}

impl TransferConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Where credentials live.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Authorized-user token file (defaults to `~/.gdrive_token.json`).
    #[serde(default)]
    pub token_path: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Directory holding the default config file.
    #[must_use]
    pub fn config_dir() -> PathBuf {
        home_dir().join(".gdrive-local-sync")
    }

    /// Get the token file path.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.auth
            .token_path
            .clone()
            .unwrap_or_else(|| home_dir().join(".gdrive_token.json"))
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
