//! Google Drive v3 REST client.
//!
//! Implements [`RemoteDrive`] on top of `reqwest`: paginated folder listing,
//! raw media download and native-document export. Throttling (429) and
//! server errors (5xx) are retried with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::domain::config::{DriveConfig, TransferConfig};
use crate::domain::{AppError, ByteSink, RemoteDrive, RemoteEntry, Result};

use super::auth::TokenProvider;

/// Fields requested for every listed file.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size)";
const ENTRY_FIELDS: &str = "id, name, mimeType, size";

/// Longest `Retry-After` we are willing to honour.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// One page of `files.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

/// A file resource, restricted to the fields we ask for.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    /// Decimal string; missing for native documents.
    size: Option<String>,
}

impl DriveFile {
    fn into_entry(self) -> RemoteEntry {
        let size = self.size.as_deref().and_then(|s| s.parse::<u64>().ok());
        RemoteEntry::from_mime(self.id, self.name, &self.mime_type, size)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP client for the Drive v3 API.
pub struct DriveClient {
    client: Client,
    base_url: String,
    tokens: Arc<TokenProvider>,
    page_size: u32,
    include_shared_drives: bool,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl DriveClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        tokens: Arc<TokenProvider>,
        drive: &DriveConfig,
        transfer: &TransferConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(transfer.request_timeout())
            .build()
            .map_err(|e| AppError::remote("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: drive.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            page_size: drive.page_size,
            include_shared_drives: drive.include_shared_drives,
            max_retries: transfer.max_retries,
            retry_base_delay: transfer.retry_base_delay(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn shared_drive_params(&self) -> Vec<(&'static str, String)> {
        if self.include_shared_drives {
            vec![
                ("supportsAllDrives", "true".to_string()),
                ("includeItemsFromAllDrives", "true".to_string()),
            ]
        } else {
            Vec::new()
        }
    }

    /// Send a request, retrying on 429 and 5xx.
    ///
    /// `build` is called once per attempt so every attempt carries a fresh
    /// access token.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let token = self.tokens.access_token().await?;
            let response = build(&token)
                .send()
                .await
                .map_err(|e| AppError::remote(format!("{what} failed"), e))?;

            let status = response.status();
            if status.is_success() {
                if attempt > 0 {
                    info!(request = what, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.max_retries {
                let delay = retry_after(&response)
                    .unwrap_or_else(|| self.retry_base_delay * 2u32.saturating_pow(attempt));
                warn!(
                    request = what,
                    status = status.as_u16(),
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let detail = error_detail(response).await;
            return Err(AppError::remote_status(
                format!("{what} returned {status}: {detail}"),
                status.as_u16(),
            ));
        }
    }

    /// Stream a successful response body into `sink`.
    async fn stream_body(
        what: &str,
        mut response: Response,
        sink: &mut ByteSink<'_>,
    ) -> Result<u64> {
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::remote(format!("{what}: reading body failed"), e))?
        {
            sink.write_all(&chunk)
                .await
                .map_err(|e| AppError::io("Failed to write downloaded bytes", e))?;
            written += chunk.len() as u64;
        }
        sink.flush()
            .await
            .map_err(|e| AppError::io("Failed to flush downloaded bytes", e))?;
        Ok(written)
    }
}

#[cfg(test)]
impl DriveClient {
    /// Client against a custom base URL with default settings.
    #[must_use]
    pub fn with_base_url(tokens: Arc<TokenProvider>, base_url: impl Into<String>) -> Self {
        let transfer = TransferConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            page_size: DriveConfig::default().page_size,
            include_shared_drives: true,
            max_retries: transfer.max_retries,
            retry_base_delay: transfer.retry_base_delay(),
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    /// Override the listing page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl RemoteDrive for DriveClient {
    async fn get_entry(&self, id: &str) -> Result<RemoteEntry> {
        debug!(id, "Fetching entry metadata");
        let url = self.url(&format!("/files/{id}"));
        let mut params = self.shared_drive_params();
        params.retain(|(k, _)| *k == "supportsAllDrives");
        params.push(("fields", ENTRY_FIELDS.to_string()));

        let response = self
            .send_with_retry("files.get", |token| {
                self.client.get(&url).bearer_auth(token).query(&params)
            })
            .await?;

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| AppError::remote("Failed to parse files.get response", e))?;

        Ok(file.into_entry())
    }

    async fn list_children(&self, container_id: &str) -> Result<Vec<RemoteEntry>> {
        let url = self.url("/files");
        let query = format!("'{container_id}' in parents and trashed = false");
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params = vec![
                ("q", query.clone()),
                ("fields", LIST_FIELDS.to_string()),
                ("pageSize", self.page_size.to_string()),
            ];
            params.extend(self.shared_drive_params());
            if let Some(ref token) = page_token {
                params.push(("pageToken", token.clone()));
            }

            let response = self
                .send_with_retry("files.list", |token| {
                    self.client.get(&url).bearer_auth(token).query(&params)
                })
                .await?;

            let page: FileListResponse = response
                .json()
                .await
                .map_err(|e| AppError::remote("Failed to parse files.list response", e))?;

            pages += 1;
            entries.extend(page.files.into_iter().map(DriveFile::into_entry));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        debug!(
            container = container_id,
            entries = entries.len(),
            pages,
            "Listed folder"
        );
        Ok(entries)
    }

    async fn fetch_raw(&self, id: &str, sink: &mut ByteSink<'_>) -> Result<u64> {
        let url = self.url(&format!("/files/{id}"));
        let mut params = vec![("alt", "media".to_string())];
        if self.include_shared_drives {
            params.push(("supportsAllDrives", "true".to_string()));
        }

        let response = self
            .send_with_retry("files.get(media)", |token| {
                self.client.get(&url).bearer_auth(token).query(&params)
            })
            .await?;

        let written = Self::stream_body("files.get(media)", response, sink).await?;
        debug!(id, bytes = written, "Downloaded file");
        Ok(written)
    }

    async fn fetch_exported(&self, id: &str, mime: &str, sink: &mut ByteSink<'_>) -> Result<u64> {
        let url = self.url(&format!("/files/{id}/export"));
        let params = [("mimeType", mime)];

        let response = self
            .send_with_retry("files.export", |token| {
                self.client.get(&url).bearer_auth(token).query(&params)
            })
            .await?;

        let written = Self::stream_body("files.export", response, sink).await?;
        debug!(id, mime, bytes = written, "Exported document");
        Ok(written)
    }
}

/// Parse `Retry-After` given in seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

/// Best-effort human-readable reason from an error response.
async fn error_detail(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|env| env.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(200).collect())
}
