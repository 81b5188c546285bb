//! Directory pre-scan for archiving.
//!
//! Recursively walks a directory and produces the list of regular files
//! with relative paths normalized to forward slashes, plus the counts the
//! archive name is derived from.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ArchiveError;

/// A regular file found under the scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,
    /// Path relative to the scanned root, `/`-separated. Used as the entry
    /// name inside the archive.
    pub relative_path: String,
    pub size: u64,
}

/// Result of scanning a directory tree.
#[derive(Debug, Clone, Default)]
pub struct DirScan {
    /// Regular files, sorted by relative path.
    pub files: Vec<ScannedFile>,
    /// Number of immediate children of the root (files, dirs and others).
    pub top_level_children: usize,
    pub total_size: u64,
}

impl DirScan {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Scans `root` recursively.
///
/// Only regular files are collected; symlinks and special files are not
/// followed or archived. Sorting the result keeps archive entry order
/// independent of directory iteration order.
pub fn scan_dir(root: &Path) -> Result<DirScan, ArchiveError> {
    let mut scan = DirScan::default();

    let entries = std::fs::read_dir(root)?;
    for entry in entries {
        let entry = entry?;
        scan.top_level_children += 1;
        visit(root, &entry, &mut scan)?;
    }

    scan.files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(scan)
}

fn walk_dir(root: &Path, current: &Path, scan: &mut DirScan) -> Result<(), ArchiveError> {
    for entry in std::fs::read_dir(current)? {
        visit(root, &entry?, scan)?;
    }
    Ok(())
}

fn visit(root: &Path, entry: &std::fs::DirEntry, scan: &mut DirScan) -> Result<(), ArchiveError> {
    let path = entry.path();
    let file_type = entry.file_type()?;

    if file_type.is_dir() {
        walk_dir(root, &path, scan)?;
    } else if file_type.is_file() {
        let rel_path = path.strip_prefix(root).map_err(std::io::Error::other)?;

        // Normalize to forward slashes.
        let relative_path = rel_path.to_string_lossy().replace('\\', "/");
        let size = entry.metadata()?.len();

        scan.files.push(ScannedFile {
            path,
            relative_path,
            size,
        });
        scan.total_size += size;
    } else {
        debug!(path = %path.display(), "not a regular file, left out of archive");
    }

    Ok(())
}
