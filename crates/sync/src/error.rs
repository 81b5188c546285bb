//! Per-entry pipeline errors.

use std::path::PathBuf;

use outbox_archive::ArchiveError;
use outbox_collector::{CollectorError, ErrorKind, RetryError};
use outbox_transfer::TransferError;

/// Why one outbox entry could not be shipped in this run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to read outbox {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to inspect {}: {source}", .path.display())]
    Inspect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported entry type: {}", .path.display())]
    UnsupportedEntry { path: PathBuf },

    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("failed to hash artifact: {0}")]
    Prepare(#[from] TransferError),

    #[error("upload failed: {0}")]
    Upload(#[from] RetryError<CollectorError>),

    #[error("uploaded but failed to delete {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("task join error: {0}")]
    Join(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::UnsupportedEntry { .. } => ErrorKind::UnknownEntry,
            SyncError::Upload(e) => e.last.kind(),
            SyncError::Scan { .. }
            | SyncError::Inspect { .. }
            | SyncError::Archive(_)
            | SyncError::Prepare(_)
            | SyncError::Cleanup { .. }
            | SyncError::Join(_) => ErrorKind::LocalIo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_kind_comes_from_last_attempt() {
        let err = SyncError::Upload(RetryError {
            attempts: 5,
            last: CollectorError::Status {
                status: 503,
                body: String::new(),
            },
        });
        assert_eq!(err.kind(), ErrorKind::TransientTransport);

        let err = SyncError::Upload(RetryError {
            attempts: 5,
            last: CollectorError::Unconfirmed { chunks_sent: 3 },
        });
        assert_eq!(err.kind(), ErrorKind::ApplicationRejected);
    }

    #[test]
    fn local_kinds() {
        let err = SyncError::Archive(ArchiveError::InvalidSource("/".into()));
        assert_eq!(err.kind(), ErrorKind::LocalIo);

        let err = SyncError::Archive(ArchiveError::DestinationExists(
            "/outbox/dev1-batch-0.zip".into(),
        ));
        assert_eq!(err.kind(), ErrorKind::LocalIo);
        assert!(err.to_string().contains("dev1-batch-0.zip"));

        let err = SyncError::UnsupportedEntry {
            path: "/outbox/link".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UnknownEntry);
        assert!(err.to_string().contains("/outbox/link"));
    }
}
