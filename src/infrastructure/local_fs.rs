//! Local filesystem side of a sync: directories, size probes and
//! write-then-rename file replacement.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::domain::{AppError, LocalTarget, Result};

/// Create a directory and all missing parents.
///
/// # Errors
/// Returns error if the directory cannot be created.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| AppError::io(format!("Failed to create directory {}", path.display()), e))
}

/// Byte length of an existing regular file, or `None` if there is none.
pub async fn existing_size(path: &Path) -> Option<u64> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        Ok(_) => None,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot stat local file");
            }
            None
        }
    }
}

/// Prefix of staging files. The random suffix `tempfile` appends keeps them
/// from ever taking the name of an existing file.
pub const STAGING_PREFIX: &str = ".gdrive-sync-";

/// A file being written next to its final location.
///
/// Bytes go to a hidden, uniquely named file in the target's directory;
/// `commit` renames it over the target and `discard` removes it. The target
/// is never left half-written and no other file is ever truncated.
pub struct PartialFile {
    file: File,
    staged: TempPath,
    target: PathBuf,
}

impl PartialFile {
    /// Create a fresh staging file for `target`.
    ///
    /// # Errors
    /// Returns error if the file cannot be created.
    pub fn create(target: &LocalTarget) -> Result<Self> {
        let dir = target.path.parent().unwrap_or_else(|| Path::new("."));
        let staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(".partial")
            .tempfile_in(dir)
            .map_err(|e| {
                AppError::io(format!("Failed to create staging file in {}", dir.display()), e)
            })?;
        let (file, staged) = staged.into_parts();

        Ok(Self {
            file: File::from_std(file),
            staged,
            target: target.path.clone(),
        })
    }

    /// Sink to stream into.
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Flush and move into place, replacing any previous file.
    ///
    /// # Errors
    /// Returns error if flushing or renaming fails; the staging file is
    /// removed in that case.
    pub async fn commit(mut self) -> Result<()> {
        let flushed = async {
            self.file.flush().await?;
            self.file.sync_all().await
        }
        .await;

        if let Err(e) = flushed {
            self.discard();
            return Err(AppError::io("Failed to flush downloaded file", e));
        }

        drop(self.file);

        // On failure the returned `TempPath` is dropped, which removes the file.
        self.staged.persist(&self.target).map_err(|e| {
            AppError::io(
                format!("Failed to move file into place at {}", self.target.display()),
                e.error,
            )
        })
    }

    /// Throw away whatever was written so far.
    pub fn discard(self) {
        drop(self.file);
        let path = self.staged.to_path_buf();
        if let Err(e) = self.staged.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging file");
        }
    }
}
