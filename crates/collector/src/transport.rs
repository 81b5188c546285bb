//! Collector transport trait.
//!
//! `CollectorTransport` is the "send bytes, get a response" seam between
//! the upload logic and the network. [`crate::HttpTransport`] implements it
//! with multipart HTTP; tests implement it with scripted mocks.

use std::future::Future;
use std::pin::Pin;

use crate::error::CollectorError;
use crate::types::ChunkRequest;
use crate::wire::CollectorResponse;

/// Abstract connection to the collection server.
pub trait CollectorTransport: Send + Sync {
    /// Sends one chunk and waits for the collector's response.
    ///
    /// Implementations return `Err` for transport failures and non-2xx
    /// responses; a 2xx body is returned as-is for the caller to interpret.
    fn send_chunk(
        &self,
        request: ChunkRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CollectorResponse, CollectorError>> + Send + '_>>;

    /// Human-readable endpoint description for logs.
    fn endpoint(&self) -> &str;
}
