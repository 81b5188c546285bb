//! The sync run: scan, classify, archive, upload, clean up.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use outbox_archive::archive_dir;
use outbox_collector::{
    Artifact, ChunkUploader, CollectorError, CollectorTransport, CompletionResult, ErrorKind,
};
use outbox_notify::Notifier;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::entry::{EntryKind, classify, list_entries, remove_stale_staging};
use crate::error::SyncError;
use crate::report::{EntryOutcome, RunReport};

/// Ships every entry of the outbox to the collector.
///
/// Entries are handled one at a time. A failing entry is reported and left
/// in place; it never stops the entries after it. Nothing is deleted before
/// the collector has confirmed the transfer.
pub struct SyncOrchestrator {
    config: SyncConfig,
    transport: Arc<dyn CollectorTransport>,
    notifier: Option<Arc<dyn Notifier>>,
    run_lock: Mutex<()>,
}

impl SyncOrchestrator {
    pub fn new(config: SyncConfig, transport: Arc<dyn CollectorTransport>) -> Self {
        Self {
            config,
            transport,
            notifier: None,
            run_lock: Mutex::new(()),
        }
    }

    /// Sends a message through `notifier` for every failed entry.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Performs one run over the outbox.
    ///
    /// Returns immediately with [`RunReport::skipped`] if another run is
    /// still active.
    pub async fn run(&self) -> RunReport {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("sync run already in progress, skipping trigger");
            return RunReport::skipped();
        };

        let mut report = RunReport::begin();
        let root = self.config.outbox_dir.clone();
        info!(outbox = %root.display(), "sync run starting");

        // Holding the run lock, nothing else is archiving into the outbox.
        let listing = {
            let root = root.clone();
            blocking(move || {
                remove_stale_staging(&root)?;
                list_entries(&root)
            })
            .await
        };
        let entries = match listing {
            Ok(Ok(entries)) => entries,
            Ok(Err(source)) => {
                let err = SyncError::Scan { path: root, source };
                self.scan_failed(&mut report, err).await;
                return report;
            }
            Err(err) => {
                self.scan_failed(&mut report, err).await;
                return report;
            }
        };

        debug!(count = entries.len(), "outbox listed");

        for path in entries {
            let outcome = match self.process_entry(&path).await {
                Ok(outcome) => outcome,
                Err(err) if err.kind() == ErrorKind::UnknownEntry => {
                    warn!(path = %path.display(), "not a regular file or directory, skipping");
                    EntryOutcome::Skipped {
                        reason: err.to_string(),
                    }
                }
                Err(err) => {
                    error!(
                        path = %path.display(),
                        kind = %err.kind(),
                        error = %err,
                        "entry failed, leaving it for the next run"
                    );
                    self.notify(&format!("{}: {err}", path.display())).await;
                    EntryOutcome::Failed {
                        kind: err.kind(),
                        error: err.to_string(),
                    }
                }
            };
            report.record(path, outcome);
        }

        report.finish();
        info!(
            uploaded = report.uploaded(),
            failed = report.failed(),
            skipped = report.skipped_entries(),
            "sync run finished"
        );
        report
    }

    async fn scan_failed(&self, report: &mut RunReport, err: SyncError) {
        error!(error = %err, "cannot list outbox");
        self.notify(&err.to_string()).await;
        report.scan_error = Some(err.to_string());
        report.finish();
    }

    async fn process_entry(&self, path: &Path) -> Result<EntryOutcome, SyncError> {
        let kind = {
            let path = path.to_path_buf();
            blocking(move || classify(&path)).await?
        };
        let kind = match kind {
            Ok(kind) => kind,
            // Taken away by its producer after listing.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "entry vanished before processing");
                return Ok(EntryOutcome::Skipped {
                    reason: "vanished".into(),
                });
            }
            Err(source) => {
                return Err(SyncError::Inspect {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        debug!(path = %path.display(), kind = kind.as_str(), "processing entry");

        let (artifact_path, archived) = match kind {
            EntryKind::Other => {
                return Err(SyncError::UnsupportedEntry {
                    path: path.to_path_buf(),
                });
            }
            EntryKind::File => (path.to_path_buf(), false),
            EntryKind::Directory => (self.archive(path).await?, true),
        };

        let algorithm = self.config.digest;
        let artifact = {
            let path = artifact_path.clone();
            blocking(move || Artifact::prepare(&path, algorithm)).await??
        };

        let result = self.upload(&artifact).await?;

        tokio::fs::remove_file(&artifact.path)
            .await
            .map_err(|source| SyncError::Cleanup {
                path: artifact.path.clone(),
                source,
            })?;

        info!(
            artifact = %artifact.display_name,
            content_id = %artifact.content_id,
            size = artifact.size,
            chunks_sent = result.chunks_sent,
            "artifact delivered and removed"
        );

        Ok(EntryOutcome::Uploaded {
            artifact: artifact.display_name,
            chunks_sent: result.chunks_sent,
            chunk_total: result.chunk_total,
            archived,
        })
    }

    /// Archives `dir` next to itself and removes the directory.
    ///
    /// If an archive with the same name is still waiting for delivery, the
    /// directory is left alone for this run.
    async fn archive(&self, dir: &Path) -> Result<PathBuf, SyncError> {
        let archived = {
            let source = dir.to_path_buf();
            let dest = self.config.outbox_dir.clone();
            let device_id = self.config.device_id.clone();
            let divisor = self.config.unit_divisor;
            blocking(move || archive_dir(&source, &dest, &device_id, divisor)).await??
        };

        // The archive is safe on disk; a leftover directory only means its
        // contents are shipped again next run.
        if let Err(e) = tokio::fs::remove_dir_all(dir).await {
            warn!(
                dir = %dir.display(),
                archive = %archived.path.display(),
                error = %e,
                "failed to remove archived directory"
            );
        }

        Ok(archived.path)
    }

    /// Uploads with retries until the collector confirms completion.
    async fn upload(&self, artifact: &Artifact) -> Result<CompletionResult, SyncError> {
        let uploader = ChunkUploader::new(self.transport.as_ref(), self.config.chunk_size);
        let uploader = &uploader;
        let label = format!("upload {}", artifact.display_name);

        let result = self
            .config
            .retry
            .run(&label, move || async move {
                let result = uploader.upload(artifact).await?;
                if result.completed {
                    Ok(result)
                } else {
                    Err(CollectorError::Unconfirmed {
                        chunks_sent: result.chunks_sent,
                    })
                }
            })
            .await?;

        Ok(result)
    }

    async fn notify(&self, message: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let text = format!("[outbox {}] {message}", self.config.device_id);
        if let Err(e) = notifier.notify(&text).await {
            warn!(error = %e, "failed to send failure notification");
        }
    }
}

/// Runs blocking filesystem work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, SyncError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::Join(e.to_string()))
}
