//! Data types for the upload flow.

use std::path::{Path, PathBuf};

use outbox_transfer::{ContentId, DigestAlgorithm, TransferError, hash_file};

use crate::wire::ChunkMeta;

/// The single file that is the unit of upload.
///
/// The content identifier is computed once, before any chunk is sent, and
/// reused for every chunk of every retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
    pub content_id: ContentId,
    /// File name sent to the collector.
    pub display_name: String,
}

impl Artifact {
    /// Hashes `path` and captures its size. Blocking.
    pub fn prepare(path: &Path, algorithm: DigestAlgorithm) -> Result<Self, TransferError> {
        let size = std::fs::metadata(path)?.len();
        let content_id = hash_file(path, algorithm)?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            size,
            content_id,
            display_name,
        })
    }
}

/// One chunk upload, as handed to a [`crate::CollectorTransport`].
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub meta: ChunkMeta,
    pub data: Vec<u8>,
}

/// Outcome of one upload pass over an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Whether the collector reported the transfer complete.
    pub completed: bool,
    pub chunks_sent: u32,
    pub chunk_total: u32,
    /// Status or message from the final response, if any.
    pub server_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbox_transfer::checksum_bytes;

    #[test]
    fn prepare_hashes_and_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();

        let artifact = Artifact::prepare(&path, DigestAlgorithm::Md5).unwrap();
        assert_eq!(artifact.size, 8);
        assert_eq!(artifact.display_name, "data.csv");
        assert_eq!(
            artifact.content_id,
            checksum_bytes(b"a,b\n1,2\n", DigestAlgorithm::Md5)
        );
    }

    #[test]
    fn prepare_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Artifact::prepare(&dir.path().join("gone"), DigestAlgorithm::Md5).is_err());
    }
}
