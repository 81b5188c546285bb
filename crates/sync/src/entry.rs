//! Outbox entry listing and classification.

use std::path::{Path, PathBuf};

use outbox_archive::is_staging_name;
use tracing::{debug, warn};

/// What an outbox entry is, judged without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlink, socket, FIFO, device.
    Other,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Other => "other",
        }
    }
}

/// Classifies `path` by its own metadata.
pub fn classify(path: &Path) -> std::io::Result<EntryKind> {
    let file_type = std::fs::symlink_metadata(path)?.file_type();
    Ok(if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    })
}

/// Lists the immediate children of `root`, sorted by name.
///
/// The list is taken once up front, so archives created while a run walks
/// the list are picked up by the next run, not this one. Unfinished archives
/// (staging files) are never listed.
pub fn list_entries(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !is_staging(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Deletes staging files left in `root` by an archive write that never
/// finished. Returns how many were removed.
///
/// Only call this while no archive is being written into `root`.
pub fn remove_stale_staging(root: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if !is_staging(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed unfinished archive");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove unfinished archive");
            }
        }
    }
    Ok(removed)
}

fn is_staging(path: &Path) -> bool {
    path.file_name().is_some_and(|n| is_staging_name(&n.to_string_lossy()))
}
