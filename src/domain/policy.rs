//! Per-entry decision policy: recurse, export, copy or skip.

use super::models::{EntryKind, NativeKind, RemoteEntry};

/// Export target for a native document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    pub mime: &'static str,
    /// Appended to the sanitized name, dot included.
    pub extension: &'static str,
}

/// What the engine should do with one remote entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Recurse,
    Export(ExportFormat),
    Unsupported,
    CopyIfStale,
}

/// Native subtypes that can be exported, and what they export to.
///
/// Supporting a new subtype means adding a row here.
const EXPORT_TABLE: &[(NativeKind, ExportFormat)] = &[
    (
        NativeKind::Document,
        ExportFormat {
            mime: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            extension: ".docx",
        },
    ),
    (
        NativeKind::Spreadsheet,
        ExportFormat {
            mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            extension: ".xlsx",
        },
    ),
    (
        NativeKind::Presentation,
        ExportFormat {
            mime: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            extension: ".pptx",
        },
    ),
    (
        NativeKind::Drawing,
        ExportFormat {
            mime: "image/png",
            extension: ".png",
        },
    ),
    (
        NativeKind::Script,
        ExportFormat {
            mime: "application/vnd.google-apps.script+json",
            extension: ".json",
        },
    ),
];

/// Look up the export target for a native subtype.
#[must_use]
pub fn export_format(kind: &NativeKind) -> Option<ExportFormat> {
    EXPORT_TABLE
        .iter()
        .find(|(k, _)| k == kind)
        .map(|(_, format)| *format)
}

/// Decide how to handle an entry. Pure; performs no I/O.
#[must_use]
pub fn classify(entry: &RemoteEntry) -> SyncDecision {
    match &entry.kind {
        EntryKind::Folder => SyncDecision::Recurse,
        EntryKind::NativeDocument(kind) => {
            export_format(kind).map_or(SyncDecision::Unsupported, SyncDecision::Export)
        }
        EntryKind::RegularFile => SyncDecision::CopyIfStale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_recurses() {
        let entry = RemoteEntry::folder("f1", "Reports");
        assert_eq!(classify(&entry), SyncDecision::Recurse);
    }

    #[test]
    fn test_regular_file_copies() {
        let entry = RemoteEntry::file("x", "x.bin", Some(50));
        assert_eq!(classify(&entry), SyncDecision::CopyIfStale);

        let unknown_size = RemoteEntry::file("y", "y.bin", None);
        assert_eq!(classify(&unknown_size), SyncDecision::CopyIfStale);
    }

    #[test]
    fn test_exportable_native_documents() {
        let cases = [
            (NativeKind::Document, ".docx"),
            (NativeKind::Spreadsheet, ".xlsx"),
            (NativeKind::Presentation, ".pptx"),
            (NativeKind::Drawing, ".png"),
            (NativeKind::Script, ".json"),
        ];
        for (kind, ext) in cases {
            let entry = RemoteEntry::native("id", "doc", kind.clone());
            match classify(&entry) {
                SyncDecision::Export(format) => assert_eq!(format.extension, ext, "{kind}"),
                other => panic!("{kind} classified as {other:?}"),
            }
        }
    }

    #[test]
    fn test_spreadsheet_export_mime() {
        let format = export_format(&NativeKind::Spreadsheet).unwrap();
        assert_eq!(
            format.mime,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_unexportable_native_documents() {
        for kind in [
            NativeKind::Form,
            NativeKind::Site,
            NativeKind::Folder,
            NativeKind::Other("shortcut".into()),
        ] {
            let entry = RemoteEntry::native("id", "thing", kind);
            assert_eq!(classify(&entry), SyncDecision::Unsupported);
        }
    }
}
