//! Boundary to the remote storage provider.
//!
//! The engine only knows this trait; the Drive HTTP client is one
//! implementation and tests supply an in-memory one.

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use super::error::Result;
use super::models::RemoteEntry;

/// Destination for streamed file contents.
pub type ByteSink<'a> = dyn AsyncWrite + Unpin + Send + 'a;

/// Read access to a hierarchical remote store.
#[async_trait]
pub trait RemoteDrive: Send + Sync {
    /// Metadata for a single entry; used to validate the root.
    async fn get_entry(&self, id: &str) -> Result<RemoteEntry>;

    /// All direct children of a container, with every page already fetched.
    async fn list_children(&self, container_id: &str) -> Result<Vec<RemoteEntry>>;

    /// Stream the raw bytes of a regular file into `sink`; returns bytes written.
    async fn fetch_raw(&self, id: &str, sink: &mut ByteSink<'_>) -> Result<u64>;

    /// Stream a native document converted to `mime` into `sink`.
    async fn fetch_exported(&self, id: &str, mime: &str, sink: &mut ByteSink<'_>) -> Result<u64>;
}
