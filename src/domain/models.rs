//! Domain models for the remote tree and the outcome of a sync run.
//!
//! These types are provider-agnostic; the Drive MIME strings only appear in
//! the `from_mime` constructors.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// MIME type Google Drive uses for folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Prefix shared by all Google-native document MIME types.
const NATIVE_MIME_PREFIX: &str = "application/vnd.google-apps.";

/// Subtype of a provider-native document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Document,
    Spreadsheet,
    Presentation,
    Drawing,
    Script,
    Form,
    Site,
    /// The folder pseudo-type, if it ever reaches classification as a document.
    Folder,
    /// Any other native subtype (shortcut, jam, map, ...).
    Other(String),
}

impl NativeKind {
    /// Parse the suffix after `application/vnd.google-apps.`.
    #[must_use]
    pub fn from_subtype(subtype: &str) -> Self {
        match subtype {
            "document" => Self::Document,
            "spreadsheet" => Self::Spreadsheet,
            "presentation" => Self::Presentation,
            "drawing" => Self::Drawing,
            "script" => Self::Script,
            "form" => Self::Form,
            "site" => Self::Site,
            "folder" => Self::Folder,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for NativeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
            Self::Presentation => write!(f, "presentation"),
            Self::Drawing => write!(f, "drawing"),
            Self::Script => write!(f, "script"),
            Self::Form => write!(f, "form"),
            Self::Site => write!(f, "site"),
            Self::Folder => write!(f, "folder"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// What kind of node a remote entry is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    NativeDocument(NativeKind),
    RegularFile,
}

impl EntryKind {
    /// Classify a Drive MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        if mime == FOLDER_MIME {
            return Self::Folder;
        }
        mime.strip_prefix(NATIVE_MIME_PREFIX)
            .map_or(Self::RegularFile, |subtype| {
                Self::NativeDocument(NativeKind::from_subtype(subtype))
            })
    }
}

/// One item in the remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Opaque identifier, stable across listing calls.
    pub id: String,
    /// Raw name; may contain characters that are illegal locally.
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes; absent for native documents.
    pub size: Option<u64>,
}

impl RemoteEntry {
    /// Build an entry from raw listing fields.
    #[must_use]
    pub fn from_mime(
        id: impl Into<String>,
        name: impl Into<String>,
        mime: &str,
        size: Option<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::from_mime(mime),
            size,
        }
    }

    #[must_use]
    pub const fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder)
    }
}

#[cfg(test)]
impl RemoteEntry {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::Folder,
            size: None,
        }
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::RegularFile,
            size,
        }
    }

    pub fn native(id: impl Into<String>, name: impl Into<String>, kind: NativeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: EntryKind::NativeDocument(kind),
            size: None,
        }
    }
}

/// Filesystem destination computed for a remote entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    pub path: PathBuf,
}

impl LocalTarget {
    /// `dir / sanitized_name [+ extension]`.
    ///
    /// `sanitized_name` must already be free of path separators.
    #[must_use]
    pub fn new(dir: &Path, sanitized_name: &str, extension: Option<&str>) -> Self {
        let file_name = match extension {
            Some(ext) => format!("{sanitized_name}{ext}"),
            None => sanitized_name.to_string(),
        };
        Self {
            path: dir.join(file_name),
        }
    }
}

/// Result of processing one leaf entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded,
    Exported,
    Skipped,
    Unsupported,
    Failed,
}

/// Outcome counters for one top-level sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub downloaded: u64,
    pub exported: u64,
    pub skipped: u64,
    pub unsupported: u64,
    pub failed: u64,
}

impl SyncStats {
    /// Count one outcome.
    pub fn record(&mut self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Downloaded => &mut self.downloaded,
            Outcome::Exported => &mut self.exported,
            Outcome::Skipped => &mut self.skipped,
            Outcome::Unsupported => &mut self.unsupported,
            Outcome::Failed => &mut self.failed,
        };
        *counter += 1;
    }

    /// Sum of all counters.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.downloaded + self.exported + self.skipped + self.unsupported + self.failed
    }

    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "downloaded {}, exported {} native documents, skipped {} up to date, {} unsupported, {} failed",
            self.downloaded, self.exported, self.skipped, self.unsupported, self.failed
        )
    }
}

/// What a finished (or interrupted) run hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub stats: SyncStats,
    /// The run stopped early on user request; `stats` covers completed work.
    pub cancelled: bool,
    pub elapsed_ms: u64,
}
