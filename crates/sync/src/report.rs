//! Run report.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use outbox_collector::ErrorKind;

/// What happened to one outbox entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Collector confirmed the artifact and it was deleted locally.
    Uploaded {
        artifact: String,
        chunks_sent: u32,
        chunk_total: u32,
        /// Whether the entry was a directory shipped as an archive.
        archived: bool,
    },
    /// Left in place for the next run.
    Failed { kind: ErrorKind, error: String },
    /// Never touched.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub path: PathBuf,
    pub outcome: EntryOutcome,
}

/// Summary of one sync run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub entries: Vec<EntryReport>,
    /// Set when the outbox itself could not be listed.
    pub scan_error: Option<String>,
    /// Set when the run was refused because another run was active.
    pub overlapped: bool,
}

impl RunReport {
    pub(crate) fn begin() -> Self {
        let now = Local::now();
        Self {
            started_at: now,
            finished_at: now,
            entries: Vec::new(),
            scan_error: None,
            overlapped: false,
        }
    }

    /// Report for a trigger that arrived while a run was already active.
    pub fn skipped() -> Self {
        Self {
            overlapped: true,
            ..Self::begin()
        }
    }

    pub(crate) fn record(&mut self, path: PathBuf, outcome: EntryOutcome) {
        self.entries.push(EntryReport { path, outcome });
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Local::now();
    }

    pub fn uploaded(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Uploaded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed { .. }))
    }

    pub fn skipped_entries(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Skipped { .. }))
    }

    /// No failures and the outbox could be read.
    pub fn is_clean(&self) -> bool {
        self.scan_error.is_none() && self.failed() == 0
    }

    pub fn outcome_for(&self, name: &str) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|e| e.path.file_name().is_some_and(|n| n == name))
            .map(|e| &e.outcome)
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}
