//! Chunked, content-addressed uploads to the collection server.
//!
//! This crate implements the client side of the collector's upload
//! protocol. It has no knowledge of the outbox: callers hand it an
//! [`Artifact`] and get back whether the collector confirmed the transfer.
//!
//! # Protocol
//!
//! 1. **Identify**: hash the artifact once; the digest keys the server-side session
//! 2. **Send**: one multipart request per chunk, ascending index from 0
//! 3. **Confirm**: a `"completed"` status ends the upload, even mid-sequence
//!
//! The transport sits behind [`CollectorTransport`] so the upload logic can
//! be driven by mocks in tests and by [`HttpTransport`] in production.

pub mod error;
pub mod http;
pub mod retry;
pub mod transport;
pub mod types;
pub mod uploader;
pub mod wire;

pub use error::{CollectorError, ErrorKind};
pub use http::{HttpTransport, HttpTransportConfig};
pub use retry::{RetryError, RetryPolicy};
pub use transport::CollectorTransport;
pub use types::{Artifact, ChunkRequest, CompletionResult};
pub use uploader::ChunkUploader;
pub use wire::{ChunkAck, ChunkMeta, CollectorResponse, STATUS_COMPLETED};
