//! Recursive remote-to-local mirroring.
//!
//! Walks the remote tree depth-first, one fully listed directory at a time,
//! and decides per entry whether to recurse, export, download or skip.
//! A failing entry only bumps the `failed` counter; cancellation is the one
//! condition that unwinds the whole walk, and it still yields the counters
//! gathered so far.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{
    classify, sanitize, AppError, EntryKind, LocalTarget, Outcome, RemoteDrive, RemoteEntry,
    Result, SyncDecision, SyncReport, SyncStats,
};
use crate::infrastructure::{ensure_dir, existing_size, PartialFile};

use super::progress::{SyncReporter, Transfer};

type DirFuture<'s> = Pin<Box<dyn Future<Output = Result<()>> + Send + 's>>;

/// How the bytes for a leaf entry are obtained.
#[derive(Debug, Clone, Copy)]
enum Fetch {
    Raw,
    Export(&'static str),
}

/// Mirrors a remote folder into a local directory.
pub struct SyncEngine<'a, R: RemoteDrive + ?Sized> {
    remote: &'a R,
    reporter: &'a dyn SyncReporter,
    cancel: CancellationToken,
}

impl<'a, R: RemoteDrive + ?Sized> SyncEngine<'a, R> {
    /// Create an engine; `cancel` stops the run cooperatively.
    pub fn new(remote: &'a R, reporter: &'a dyn SyncReporter, cancel: CancellationToken) -> Self {
        Self {
            remote,
            reporter,
            cancel,
        }
    }

    /// Mirror the remote folder `remote_root_id` into `local_root`.
    ///
    /// # Errors
    /// Returns `AppError::LocalRoot` if the local root cannot be created and
    /// the listing error if the root folder itself cannot be listed.
    /// Failures below the root are counted, not returned.
    pub async fn sync(&self, remote_root_id: &str, local_root: &Path) -> Result<SyncReport> {
        let started = Instant::now();
        info!(remote = remote_root_id, local = %local_root.display(), "Starting sync");

        tokio::fs::create_dir_all(local_root)
            .await
            .map_err(|source| AppError::LocalRoot {
                path: local_root.to_path_buf(),
                source,
            })?;

        let mut stats = SyncStats::default();
        let cancelled = match self.sync_dir(remote_root_id, local_root, 0, &mut stats).await {
            Ok(()) => false,
            Err(e) if e.is_cancelled() => {
                warn!("Sync cancelled, keeping completed work");
                true
            }
            Err(e) => return Err(e),
        };

        let elapsed = started.elapsed();
        info!(
            downloaded = stats.downloaded,
            exported = stats.exported,
            skipped = stats.skipped,
            unsupported = stats.unsupported,
            failed = stats.failed,
            total = stats.total(),
            cancelled,
            duration_ms = elapsed.as_millis(),
            "Sync finished"
        );

        Ok(SyncReport {
            stats,
            cancelled,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Sync one directory level; `dir` must already exist.
    ///
    /// Only listing failures and cancellation come back as errors.
    fn sync_dir<'s>(
        &'s self,
        container_id: &'s str,
        dir: &'s Path,
        depth: usize,
        stats: &'s mut SyncStats,
    ) -> DirFuture<'s> {
        Box::pin(async move {
            let entries = self.list(container_id).await?;
            let mut targets = HashSet::new();

            for entry in &entries {
                if self.cancel.is_cancelled() {
                    return Err(AppError::Cancelled);
                }

                let name = sanitize(&entry.name);
                match classify(entry) {
                    SyncDecision::Recurse => {
                        self.sync_subfolder(entry, &name, dir, depth, stats).await?;
                    }
                    SyncDecision::Unsupported => {
                        if let EntryKind::NativeDocument(kind) = &entry.kind {
                            self.reporter.unsupported(&name, kind, depth);
                        }
                        debug!(id = %entry.id, name = %name, "Unsupported native document");
                        stats.record(Outcome::Unsupported);
                    }
                    SyncDecision::Export(format) => {
                        let target = LocalTarget::new(dir, &name, Some(format.extension));
                        note_collision(&mut targets, &target);
                        self.reporter.fetch_started(
                            &name,
                            Transfer::Export {
                                extension: format.extension,
                            },
                            depth,
                        );
                        let outcome = self
                            .fetch(entry, &name, &target, Fetch::Export(format.mime), depth)
                            .await?;
                        stats.record(outcome);
                    }
                    SyncDecision::CopyIfStale => {
                        let target = LocalTarget::new(dir, &name, None);
                        note_collision(&mut targets, &target);
                        if is_up_to_date(entry, &target).await {
                            self.reporter.up_to_date(&name, depth);
                            stats.record(Outcome::Skipped);
                            continue;
                        }
                        self.reporter.fetch_started(
                            &name,
                            Transfer::Download { size: entry.size },
                            depth,
                        );
                        let outcome = self.fetch(entry, &name, &target, Fetch::Raw, depth).await?;
                        stats.record(outcome);
                    }
                }
            }

            Ok(())
        })
    }

    /// Create the local folder and descend. A failure here costs one
    /// `failed` count; siblings carry on.
    async fn sync_subfolder(
        &self,
        entry: &RemoteEntry,
        name: &str,
        dir: &Path,
        depth: usize,
        stats: &mut SyncStats,
    ) -> Result<()> {
        self.reporter.folder(name, depth);
        let child_dir = dir.join(name);

        if let Err(e) = ensure_dir(&child_dir).await {
            warn!(dir = %child_dir.display(), error = %e, "Skipping folder");
            self.reporter.folder_failed(name, &e, depth);
            stats.record(Outcome::Failed);
            return Ok(());
        }

        match self.sync_dir(&entry.id, &child_dir, depth + 1, stats).await {
            Err(e) if !e.is_cancelled() => {
                warn!(id = %entry.id, dir = %child_dir.display(), error = %e, "Folder failed");
                self.reporter.folder_failed(name, &e, depth);
                stats.record(Outcome::Failed);
                Ok(())
            }
            other => other,
        }
    }

    /// Full child listing, abandoned if the run is cancelled meanwhile.
    async fn list(&self, container_id: &str) -> Result<Vec<RemoteEntry>> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(AppError::Cancelled),
            listed = self.remote.list_children(container_id) => listed,
        }
    }

    /// Fetch one leaf into `target` via a staging file.
    ///
    /// Returns `Err` only on cancellation; every other failure becomes
    /// `Outcome::Failed`.
    async fn fetch(
        &self,
        entry: &RemoteEntry,
        name: &str,
        target: &LocalTarget,
        how: Fetch,
        depth: usize,
    ) -> Result<Outcome> {
        let mut partial = match PartialFile::create(target) {
            Ok(partial) => partial,
            Err(e) => return Ok(self.failed(entry, name, &e, depth)),
        };

        let result = {
            let sink = partial.file_mut();
            let transfer = async {
                match how {
                    Fetch::Raw => self.remote.fetch_raw(&entry.id, sink).await,
                    Fetch::Export(mime) => self.remote.fetch_exported(&entry.id, mime, sink).await,
                }
            };
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                done = transfer => Some(done),
            }
        };

        match result {
            None => {
                partial.discard();
                debug!(id = %entry.id, "Transfer aborted by cancellation");
                Err(AppError::Cancelled)
            }
            Some(Err(e)) => {
                partial.discard();
                Ok(self.failed(entry, name, &e, depth))
            }
            Some(Ok(bytes)) => match partial.commit().await {
                Ok(()) => {
                    self.reporter.fetch_finished(name, bytes, depth);
                    debug!(id = %entry.id, path = %target.path.display(), bytes, "Stored");
                    Ok(match how {
                        Fetch::Raw => Outcome::Downloaded,
                        Fetch::Export(_) => Outcome::Exported,
                    })
                }
                Err(e) => Ok(self.failed(entry, name, &e, depth)),
            },
        }
    }

    fn failed(&self, entry: &RemoteEntry, name: &str, error: &AppError, depth: usize) -> Outcome {
        warn!(id = %entry.id, name = %entry.name, error = %error, "Entry failed");
        self.reporter.fetch_failed(name, error, depth);
        Outcome::Failed
    }
}

/// A regular file is current when the local copy exists and has exactly the
/// remote size. Unknown remote size always means stale.
async fn is_up_to_date(entry: &RemoteEntry, target: &LocalTarget) -> bool {
    match entry.size {
        Some(remote_size) => existing_size(&target.path).await == Some(remote_size),
        None => false,
    }
}

fn note_collision(seen: &mut HashSet<PathBuf>, target: &LocalTarget) {
    if !seen.insert(target.path.clone()) {
        warn!(
            path = %target.path.display(),
            "Several remote entries map to the same local file; the later one wins"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::application::progress::SilentReporter;
    use crate::domain::{ByteSink, NativeKind};
    use crate::infrastructure::local_fs::STAGING_PREFIX;

    const ROOT: &str = "root";

    /// In-memory remote tree.
    #[derive(Default)]
    struct FakeDrive {
        children: HashMap<String, Vec<RemoteEntry>>,
        contents: HashMap<String, Vec<u8>>,
        failing: HashSet<String>,
        failing_lists: HashSet<String>,
        /// Fetching this id cancels the token once the bytes are written.
        cancel_on: Option<(String, CancellationToken)>,
        /// Fetching this id writes a little and then never finishes.
        hang_on: Option<String>,
        fetches: Mutex<Vec<String>>,
    }

    impl FakeDrive {
        fn with_children(mut self, parent: &str, entries: Vec<RemoteEntry>) -> Self {
            self.children.insert(parent.to_string(), entries);
            self
        }

        fn with_content(mut self, id: &str, bytes: &[u8]) -> Self {
            self.contents.insert(id.to_string(), bytes.to_vec());
            self
        }

        fn failing(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        fn fetches(&self) -> Vec<String> {
            self.fetches.lock().unwrap().clone()
        }

        async fn serve(&self, key: String, id: &str, sink: &mut ByteSink<'_>) -> Result<u64> {
            self.fetches.lock().unwrap().push(key);

            if self.failing.contains(id) {
                sink.write_all(b"trunc").await.unwrap();
                return Err(AppError::remote_status("simulated transport failure", 503));
            }

            if self.hang_on.as_deref() == Some(id) {
                sink.write_all(b"half").await.unwrap();
                std::future::pending::<()>().await;
            }

            let bytes = self.contents.get(id).cloned().unwrap_or_default();
            sink.write_all(&bytes).await.unwrap();

            if let Some((cancel_id, token)) = &self.cancel_on {
                if cancel_id == id {
                    token.cancel();
                }
            }
            Ok(bytes.len() as u64)
        }
    }

    #[async_trait]
    impl RemoteDrive for FakeDrive {
        async fn get_entry(&self, id: &str) -> Result<RemoteEntry> {
            Ok(RemoteEntry::folder(id, id))
        }

        async fn list_children(&self, container_id: &str) -> Result<Vec<RemoteEntry>> {
            if self.failing_lists.contains(container_id) {
                return Err(AppError::remote_status("listing failed", 500));
            }
            Ok(self.children.get(container_id).cloned().unwrap_or_default())
        }

        async fn fetch_raw(&self, id: &str, sink: &mut ByteSink<'_>) -> Result<u64> {
            self.serve(format!("raw:{id}"), id, sink).await
        }

        async fn fetch_exported(&self, id: &str, mime: &str, sink: &mut ByteSink<'_>) -> Result<u64> {
            self.serve(format!("export:{id}:{mime}"), id, sink).await
        }
    }

    fn staging_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(STAGING_PREFIX))
            .collect()
    }

    async fn run(drive: &FakeDrive, local: &Path) -> SyncReport {
        SyncEngine::new(drive, &SilentReporter, CancellationToken::new())
            .sync(ROOT, local)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_nested_file_is_downloaded() {
        let drive = FakeDrive::default()
            .with_children(ROOT, vec![RemoteEntry::folder("reports", "Reports")])
            .with_children("reports", vec![RemoteEntry::file("a", "a.txt", Some(100))])
            .with_content("a", &[b'a'; 100]);
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(
            report.stats,
            SyncStats {
                downloaded: 1,
                ..SyncStats::default()
            }
        );
        assert!(!report.cancelled);
        let local = dir.path().join("Reports").join("a.txt");
        assert_eq!(std::fs::read(local).unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_native_spreadsheet_is_exported() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![RemoteEntry::native("b", "Budget", NativeKind::Spreadsheet)],
            )
            .with_content("b", b"PK-xlsx-bytes");
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.exported, 1);
        assert_eq!(report.stats.total(), 1);
        assert_eq!(
            std::fs::read(dir.path().join("Budget.xlsx")).unwrap(),
            b"PK-xlsx-bytes"
        );
        assert_eq!(
            drive.fetches(),
            vec![
                "export:b:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_same_size_file_is_skipped_without_fetch() {
        let drive = FakeDrive::default()
            .with_children(ROOT, vec![RemoteEntry::file("x", "x.bin", Some(50))])
            .with_content("x", &[1; 50]);
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.bin"), [0u8; 50]).unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(
            report.stats,
            SyncStats {
                skipped: 1,
                ..SyncStats::default()
            }
        );
        assert!(drive.fetches().is_empty());
        // Local bytes untouched
        assert_eq!(std::fs::read(dir.path().join("x.bin")).unwrap(), [0u8; 50]);
    }

    #[tokio::test]
    async fn test_different_size_or_unknown_size_is_refetched() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::file("x", "x.bin", Some(50)),
                    RemoteEntry::file("u", "u.bin", None),
                ],
            )
            .with_content("x", &[1; 50])
            .with_content("u", &[2; 7]);
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.bin"), [0u8; 49]).unwrap();
        std::fs::write(dir.path().join("u.bin"), [2u8; 7]).unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.downloaded, 2);
        assert_eq!(report.stats.skipped, 0);
        assert_eq!(drive.fetches(), vec!["raw:x", "raw:u"]);
        assert_eq!(std::fs::read(dir.path().join("x.bin")).unwrap(), [1u8; 50]);
    }

    #[tokio::test]
    async fn test_form_is_unsupported_and_not_written() {
        let drive = FakeDrive::default().with_children(
            ROOT,
            vec![RemoteEntry::native("s", "Signup", NativeKind::Form)],
        );
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(
            report.stats,
            SyncStats {
                unsupported: 1,
                ..SyncStats::default()
            }
        );
        assert!(drive.fetches().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_stop_siblings() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::file("y", "y.bin", Some(10)),
                    RemoteEntry::file("z", "z.bin", Some(3)),
                    RemoteEntry::folder("sub", "Sub"),
                ],
            )
            .with_children("sub", vec![RemoteEntry::file("w", "w.txt", Some(2))])
            .with_content("z", b"zzz")
            .with_content("w", b"ww")
            .failing("y");
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.downloaded, 2);
        assert!(!dir.path().join("y.bin").exists());
        assert!(staging_files(dir.path()).is_empty());
        assert!(dir.path().join("Sub").join("w.txt").exists());
        assert!(report.stats.summary().contains("1 failed"));
    }

    #[tokio::test]
    async fn test_sibling_named_like_staging_suffix_survives() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::file("p", "a.partial", Some(5)),
                    RemoteEntry::file("a", "a", Some(3)),
                ],
            )
            .with_content("p", b"ppppp")
            .with_content("a", b"aaa");
        let dir = tempdir().unwrap();

        let first = run(&drive, dir.path()).await;
        assert_eq!(first.stats.downloaded, 2);
        assert_eq!(std::fs::read(dir.path().join("a.partial")).unwrap(), b"ppppp");
        assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), b"aaa");

        let second = run(&drive, dir.path()).await;
        assert_eq!(
            second.stats,
            SyncStats {
                skipped: 2,
                ..SyncStats::default()
            }
        );
        assert!(staging_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_export_is_counted_and_leaves_nothing() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::native("d", "Notes", NativeKind::Document),
                    RemoteEntry::file("z", "z.txt", Some(3)),
                    RemoteEntry::native("s", "Budget", NativeKind::Spreadsheet),
                ],
            )
            .with_content("z", b"zzz")
            .with_content("s", b"xlsx")
            .failing("d");
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(
            report.stats,
            SyncStats {
                downloaded: 1,
                exported: 1,
                failed: 1,
                ..SyncStats::default()
            }
        );
        assert!(!dir.path().join("Notes.docx").exists());
        assert!(dir.path().join("z.txt").exists());
        assert!(dir.path().join("Budget.xlsx").exists());
        assert!(staging_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_copy() {
        let drive = FakeDrive::default()
            .with_children(ROOT, vec![RemoteEntry::file("y", "y.bin", Some(10))])
            .failing("y");
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("y.bin"), b"old").unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.failed, 1);
        assert_eq!(std::fs::read(dir.path().join("y.bin")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_counters_sum_to_leaf_count() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::folder("f1", "One"),
                    RemoteEntry::native("d", "Doc", NativeKind::Document),
                    RemoteEntry::native("site", "Site", NativeKind::Site),
                    RemoteEntry::file("bad", "bad.bin", Some(1)),
                ],
            )
            .with_children(
                "f1",
                vec![
                    RemoteEntry::folder("f2", "Two"),
                    RemoteEntry::file("p", "p.png", Some(3)),
                ],
            )
            .with_children(
                "f2",
                vec![
                    RemoteEntry::native("dr", "Sketch", NativeKind::Drawing),
                    RemoteEntry::native("sc", "Shortcut", NativeKind::Other("shortcut".into())),
                ],
            )
            .with_content("p", b"png")
            .failing("bad");
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.total(), 6);
        assert_eq!(report.stats.downloaded, 1);
        assert_eq!(report.stats.exported, 2);
        assert_eq!(report.stats.unsupported, 2);
        assert_eq!(report.stats.failed, 1);
        assert!(dir.path().join("One").join("Two").join("Sketch.png").exists());
    }

    #[tokio::test]
    async fn test_second_run_only_reexports() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::file("a", "a.txt", Some(3)),
                    RemoteEntry::native("d", "Notes", NativeKind::Document),
                ],
            )
            .with_content("a", b"abc")
            .with_content("d", b"docx");
        let dir = tempdir().unwrap();

        let first = run(&drive, dir.path()).await;
        assert_eq!(first.stats.downloaded, 1);
        assert_eq!(first.stats.exported, 1);

        let second = run(&drive, dir.path()).await;
        assert_eq!(second.stats.downloaded, 0);
        assert_eq!(second.stats.skipped, 1);
        assert_eq!(second.stats.exported, 1);
        assert_eq!(std::fs::read(dir.path().join("Notes.docx")).unwrap(), b"docx");
    }

    #[tokio::test]
    async fn test_names_are_sanitized() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::folder("f", "Q1/Q2: plans"),
                    RemoteEntry::file("e", "   ", Some(1)),
                ],
            )
            .with_children("f", vec![RemoteEntry::file("t", "..", Some(1))])
            .with_content("e", b"e")
            .with_content("t", b"t");
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.downloaded, 2);
        assert!(dir.path().join("Q1_Q2_ plans").join("__").is_file());
        assert!(dir.path().join("unnamed").is_file());
    }

    #[tokio::test]
    async fn test_subfolder_creation_failure_is_counted() {
        let drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::folder("f", "Blocked"),
                    RemoteEntry::file("a", "a.txt", Some(1)),
                ],
            )
            .with_children("f", vec![RemoteEntry::file("inner", "inner.txt", Some(1))])
            .with_content("a", b"a");
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Blocked"), b"i am a file").unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.downloaded, 1);
        assert!(!drive.fetches().contains(&"raw:inner".to_string()));
    }

    #[tokio::test]
    async fn test_subfolder_listing_failure_is_counted() {
        let mut drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::folder("f", "Broken"),
                    RemoteEntry::file("a", "a.txt", Some(1)),
                ],
            )
            .with_content("a", b"a");
        drive.failing_lists.insert("f".to_string());
        let dir = tempdir().unwrap();

        let report = run(&drive, dir.path()).await;

        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.downloaded, 1);
    }

    #[tokio::test]
    async fn test_root_listing_failure_is_fatal() {
        let mut drive = FakeDrive::default();
        drive.failing_lists.insert(ROOT.to_string());
        let dir = tempdir().unwrap();

        let result = SyncEngine::new(&drive, &SilentReporter, CancellationToken::new())
            .sync(ROOT, dir.path())
            .await;

        assert!(matches!(result, Err(AppError::Remote { .. })));
    }

    #[tokio::test]
    async fn test_uncreatable_root_is_fatal() {
        let drive = FakeDrive::default();
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let result = SyncEngine::new(&drive, &SilentReporter, CancellationToken::new())
            .sync(ROOT, &blocker.join("root"))
            .await;

        assert!(matches!(result, Err(AppError::LocalRoot { .. })));
    }

    #[tokio::test]
    async fn test_cancellation_keeps_completed_work() {
        let token = CancellationToken::new();
        let mut drive = FakeDrive::default()
            .with_children(
                ROOT,
                vec![
                    RemoteEntry::file("a", "a.txt", Some(1)),
                    RemoteEntry::file("b", "b.txt", Some(1)),
                    RemoteEntry::file("c", "c.txt", Some(1)),
                ],
            )
            .with_content("a", b"a")
            .with_content("b", b"b");
        drive.cancel_on = Some(("a".to_string(), token.clone()));
        let dir = tempdir().unwrap();

        let report = SyncEngine::new(&drive, &SilentReporter, token)
            .sync(ROOT, dir.path())
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.stats.downloaded, 1);
        assert_eq!(report.stats.total(), 1);
        assert_eq!(drive.fetches(), vec!["raw:a"]);
        assert!(dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_inflight_transfer() {
        let token = CancellationToken::new();
        let mut drive = FakeDrive::default().with_children(
            ROOT,
            vec![RemoteEntry::file("slow", "slow.bin", Some(1000))],
        );
        drive.hang_on = Some("slow".to_string());
        let dir = tempdir().unwrap();

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = SyncEngine::new(&drive, &SilentReporter, token)
            .sync(ROOT, dir.path())
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.stats.total(), 0);
        assert!(!dir.path().join("slow.bin").exists());
        assert!(staging_files(dir.path()).is_empty());
    }
}
