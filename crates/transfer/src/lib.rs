//! Content hashing and fixed-size chunk reading for outbox artifacts.
//!
//! An artifact is identified by the digest of its bytes and split into
//! fixed-size chunks addressed by a 0-based index. Both are re-derived on
//! every upload attempt, so the collector can recognize chunks it already
//! holds without any client-side resume state.

mod chunked;
mod hash;
mod types;

pub use chunked::ChunkReader;
pub use hash::{ContentId, DigestAlgorithm, checksum_bytes, hash_file};
pub use types::{Chunk, ChunkLayout};

/// Block size used for hashing and for upload chunks: 2 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact changed while reading: expected {expected} bytes, found {actual}")]
    SizeChanged { expected: u64, actual: u64 },
}
