//! Access-token sources for the Drive API.
//!
//! Either a token handed in through `GDRIVE_ACCESS_TOKEN`, or an
//! authorized-user token file (the JSON written by Google's client
//! libraries) that is refreshed with its `refresh_token` when it expires.
//! The interactive browser consent flow that creates that file is not
//! handled here.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{AppError, Result};

/// Environment variable holding a ready-to-use access token.
pub const ACCESS_TOKEN_ENV: &str = "GDRIVE_ACCESS_TOKEN";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring sooner than this are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Contents of an authorized-user token file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields we do not interpret but write back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl AuthorizedUser {
    /// Current token, if present and not about to expire.
    fn usable_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        match self.expiry {
            Some(expiry) if expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now => None,
            _ => Some(token),
        }
    }
}

/// Response of the OAuth token endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

enum TokenSource {
    Fixed(String),
    File {
        path: PathBuf,
        state: Mutex<AuthorizedUser>,
    },
}

/// Hands out valid access tokens, refreshing them when needed.
pub struct TokenProvider {
    source: TokenSource,
    http: reqwest::Client,
}

impl TokenProvider {
    /// A token that is used as-is and never refreshed.
    #[must_use]
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Fixed(token.into()),
            http: reqwest::Client::new(),
        }
    }

    /// Load an authorized-user token file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read token file {}", path.display()), e))?;
        let user: AuthorizedUser = serde_json::from_str(&content).map_err(AppError::json_parse)?;

        Ok(Self {
            source: TokenSource::File {
                path: path.to_path_buf(),
                state: Mutex::new(user),
            },
            http: reqwest::Client::new(),
        })
    }

    /// Pick the token source: environment first, then the token file.
    ///
    /// # Errors
    /// Returns `AppError::Auth` if neither is available.
    pub fn discover(token_path: &Path) -> Result<Self> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                tracing::info!("Using access token from {ACCESS_TOKEN_ENV}");
                return Ok(Self::fixed(token.trim()));
            }
        }

        if token_path.exists() {
            tracing::info!(path = %token_path.display(), "Using token file");
            return Self::from_file(token_path);
        }

        Err(AppError::Auth {
            message: format!(
                "no credentials found. Set {ACCESS_TOKEN_ENV}, or place an authorized-user \
                 token file at {} (or set auth.token_path in the config)",
                token_path.display()
            ),
        })
    }

    /// A valid access token.
    ///
    /// # Errors
    /// Returns `AppError::Auth` if the token is expired and cannot be refreshed.
    pub async fn access_token(&self) -> Result<String> {
        match &self.source {
            TokenSource::Fixed(token) => Ok(token.clone()),
            TokenSource::File { path, state } => {
                let mut user = state.lock().await;
                if let Some(token) = user.usable_token(Utc::now()) {
                    return Ok(token.to_string());
                }
                self.refresh(&mut user).await?;
                save_token_file(path, &user)?;
                user.token.clone().ok_or_else(|| AppError::Auth {
                    message: "token endpoint returned no access token".into(),
                })
            }
        }
    }

    async fn refresh(&self, user: &mut AuthorizedUser) -> Result<()> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            user.refresh_token.as_deref(),
            user.client_id.as_deref(),
            user.client_secret.as_deref(),
        ) else {
            return Err(AppError::Auth {
                message: "access token expired and the token file has no refresh credentials"
                    .into(),
            });
        };

        tracing::debug!(token_uri = %user.token_uri, "Refreshing access token");

        let response = self
            .http
            .post(&user.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| AppError::remote("Token refresh request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth {
                message: format!("token refresh rejected ({status}): {}", body.trim()),
            });
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AppError::remote("Failed to parse token refresh response", e))?;

        user.token = Some(refreshed.access_token);
        user.expiry = refreshed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        tracing::info!("Access token refreshed");
        Ok(())
    }
}

/// Write the token file readable by the owner only.
fn save_token_file(path: &Path, user: &AuthorizedUser) -> Result<()> {
    let content = serde_json::to_string_pretty(user).map_err(AppError::json_parse)?;
    std::fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write token file {}", path.display()), e))?;
    set_private(path);
    Ok(())
}

#[cfg(unix)]
fn set_private(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to restrict token file permissions");
    }
}

#[cfg(not(unix))]
fn set_private(_path: &Path) {}
