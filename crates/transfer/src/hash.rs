use std::fmt;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Digest used to derive an artifact's content identifier.
///
/// The collector verifies merged uploads against MD5, so that is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Sha256,
}

/// Lowercase hex digest identifying an artifact's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the digest of `data` and returns it hex-encoded.
pub fn checksum_bytes(data: &[u8], algorithm: DigestAlgorithm) -> ContentId {
    let hex = match algorithm {
        DigestAlgorithm::Md5 => hex::encode(Md5::digest(data)),
        DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
    };
    ContentId(hex)
}

/// Streams a file through the digest in [`DEFAULT_CHUNK_SIZE`] blocks.
///
/// Memory use is bounded by one block regardless of file size.
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> Result<ContentId, TransferError> {
    let file = std::fs::File::open(path)?;
    let hex = match algorithm {
        DigestAlgorithm::Md5 => stream_digest::<Md5>(file)?,
        DigestAlgorithm::Sha256 => stream_digest::<Sha256>(file)?,
    };
    Ok(ContentId(hex))
}

fn stream_digest<D: Digest>(mut file: std::fs::File) -> Result<String, TransferError> {
    let mut hasher = D::new();
    let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn md5_known_vector() {
        let id = checksum_bytes(b"hello world", DigestAlgorithm::Md5);
        assert_eq!(id.as_str(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn sha256_is_64_hex_chars() {
        let id = checksum_bytes(b"hello world", DigestAlgorithm::Sha256);
        assert_eq!(id.as_str().len(), 64);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_file_matches_in_memory_digest() {
        let dir = TempDir::new().unwrap();
        let data = b"test content for checksum";
        let path = write_file(dir.path(), "a.bin", data);

        for algo in [DigestAlgorithm::Md5, DigestAlgorithm::Sha256] {
            assert_eq!(hash_file(&path, algo).unwrap(), checksum_bytes(data, algo));
        }
    }

    #[test]
    fn hash_file_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.bin", &vec![7u8; 3 * 1024 * 1024 + 11]);

        let first = hash_file(&path, DigestAlgorithm::Md5).unwrap();
        let second = hash_file(&path, DigestAlgorithm::Md5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_byte_change_changes_id() {
        let dir = TempDir::new().unwrap();
        let mut data = vec![0u8; DEFAULT_CHUNK_SIZE + 5];
        let path = write_file(dir.path(), "a.bin", &data);
        let before = hash_file(&path, DigestAlgorithm::Md5).unwrap();

        // Flip a byte past the first block boundary.
        data[DEFAULT_CHUNK_SIZE + 2] = 1;
        std::fs::write(&path, &data).unwrap();
        let after = hash_file(&path, DigestAlgorithm::Md5).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = hash_file(&dir.path().join("gone.bin"), DigestAlgorithm::Md5).unwrap_err();
        assert!(matches!(err, TransferError::Io(_)));
    }

    #[test]
    fn digest_algorithm_serde_lowercase() {
        let json = serde_json::to_string(&DigestAlgorithm::Sha256).unwrap();
        assert_eq!(json, "\"sha256\"");
        let parsed: DigestAlgorithm = serde_json::from_str("\"md5\"").unwrap();
        assert_eq!(parsed, DigestAlgorithm::Md5);
    }
}
