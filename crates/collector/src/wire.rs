//! Collector wire types.
//!
//! Each chunk is one multipart request with two parts:
//!
//! | Part | Content |
//! |------|---------|
//! | `json` | [`ChunkMeta`] serialized as JSON text |
//! | `chunk` | raw chunk bytes, filename = artifact name |
//!
//! The collector answers with a [`CollectorResponse`]. Field names follow
//! the collector's schema, so the content identifier travels as `file_md5`
//! regardless of the digest used to compute it.

use serde::{Deserialize, Serialize};

/// Multipart field carrying the JSON metadata.
pub const META_FIELD: &str = "json";

/// Multipart field carrying the chunk bytes.
pub const CHUNK_FIELD: &str = "chunk";

/// Status value the collector sends once every chunk has been merged.
pub const STATUS_COMPLETED: &str = "completed";

/// Per-chunk metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Display name of the artifact (its file name).
    pub file_name: String,
    /// Content identifier of the whole artifact.
    pub file_md5: String,
    pub chunk_index: u32,
    pub chunk_total: u32,
}

/// Response body returned by the collector for each chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Number of chunks the collector holds for this content identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,

    #[serde(default, alias = "errcode", skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(
        default,
        alias = "errmsg",
        alias = "error",
        skip_serializing_if = "Option::is_none"
    )]
    pub msg: Option<String>,
}

/// What a collector response means for the upload sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkAck {
    /// Collector holds the full artifact; stop sending.
    Completed,
    /// Chunk accepted, keep going.
    Accepted { progress: Option<u64> },
    /// Collector refused the chunk.
    Rejected { code: Option<i64>, message: String },
}

impl CollectorResponse {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETED)
    }

    /// Interprets the response.
    ///
    /// A non-zero `code` or an `error`/`failed` status is a rejection;
    /// `completed` ends the upload; anything else continues the sequence.
    pub fn ack(&self) -> ChunkAck {
        let error_status = matches!(self.status.as_deref(), Some("error" | "failed"));
        let error_code = self.code.is_some_and(|c| c != 0);

        if error_status || error_code {
            return ChunkAck::Rejected {
                code: self.code,
                message: self
                    .msg
                    .clone()
                    .or_else(|| self.status.clone())
                    .unwrap_or_default(),
            };
        }

        if self.is_completed() {
            ChunkAck::Completed
        } else {
            ChunkAck::Accepted {
                progress: self.progress,
            }
        }
    }

    /// Whether an error response body carries structured error details.
    pub fn has_error_details(&self) -> bool {
        matches!(self.ack(), ChunkAck::Rejected { .. }) || self.msg.is_some()
    }
}
