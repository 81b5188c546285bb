//! Zip writer for outbox directories.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::ArchiveError;
use crate::naming::ArchiveName;
use crate::scanner::{DirScan, scan_dir};

/// Name prefix of archives still being written.
///
/// Staging files live next to their final destination so the last step is a
/// same-filesystem rename. Anything carrying this prefix is an unfinished
/// archive and must never be shipped.
pub const STAGING_PREFIX: &str = ".outbox-staging-";

/// Archive produced from a directory.
#[derive(Debug, Clone)]
pub struct ArchivedDir {
    /// Location of the written archive.
    pub path: PathBuf,
    pub name: ArchiveName,
    pub file_count: usize,
    /// Uncompressed bytes read from the source tree.
    pub source_bytes: u64,
}

/// Returns true for names produced by an archive write in progress.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX)
}

/// Archives `source` into `dest_dir`.
///
/// The archive is written under a staging name and renamed into place only
/// once it is complete and synced, so a crash never leaves a truncated
/// archive under its final name. An existing file with the final name is
/// never replaced: [`ArchiveError::DestinationExists`] is returned and
/// nothing is written.
///
/// The source directory is left untouched; deleting it once the archive is
/// on disk is the caller's job.
pub fn archive_dir(
    source: &Path,
    dest_dir: &Path,
    device_id: &str,
    unit_divisor: usize,
) -> Result<ArchivedDir, ArchiveError> {
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::InvalidSource(source.display().to_string()))?;

    let scan = scan_dir(source)?;
    let name = ArchiveName::derive(device_id, &source_name, scan.file_count(), unit_divisor);
    let dest = dest_dir.join(name.file_name());

    debug!(
        source = %source.display(),
        files = scan.file_count(),
        children = scan.top_level_children,
        archive = %dest.display(),
        "scan complete"
    );

    if std::fs::symlink_metadata(&dest).is_ok() {
        return Err(ArchiveError::DestinationExists(dest));
    }

    // Dropping the staging file on any error below deletes it.
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".part")
        .tempfile_in(dest_dir)?;
    write_archive(&scan, staging.as_file())?;

    staging.persist_noclobber(&dest).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            ArchiveError::DestinationExists(dest.clone())
        } else {
            ArchiveError::Io(e.error)
        }
    })?;

    info!(
        source = %source.display(),
        archive = %dest.display(),
        files = scan.file_count(),
        bytes = scan.total_size,
        "directory archived"
    );

    Ok(ArchivedDir {
        path: dest,
        name,
        file_count: scan.file_count(),
        source_bytes: scan.total_size,
    })
}

/// Writes every scanned file into a deflate archive in `file`.
fn write_archive(scan: &DirScan, file: &File) -> Result<(), ArchiveError> {
    let mut zip = zip::ZipWriter::new(BufWriter::new(file));

    for entry in &scan.files {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(entry.size >= u32::MAX as u64);
        zip.start_file(entry.relative_path.as_str(), options)?;

        let mut src = File::open(&entry.path)?;
        std::io::copy(&mut src, &mut zip)?;
    }

    let mut inner = zip.finish()?;
    std::io::Write::flush(&mut inner)?;
    inner.get_ref().sync_all()?;
    Ok(())
}
