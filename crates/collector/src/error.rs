//! Collector error types.

use std::fmt;

/// Coarse classification of a failure, shared across the pipeline.
///
/// Every upload-path kind is currently retried the same way; the kind is
/// carried so the retry boundary can tell permanent rejections apart once
/// the collector documents its error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeout, connection failure, or non-2xx without a structured body.
    TransientTransport,
    /// Well-formed response carrying an error code or error status.
    ApplicationRejected,
    /// Local filesystem failure (artifact vanished, disk full).
    LocalIo,
    /// Outbox entry that is neither a file nor a directory.
    UnknownEntry,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::TransientTransport => "transient-transport",
            ErrorKind::ApplicationRejected => "application-rejected",
            ErrorKind::LocalIo => "local-io",
            ErrorKind::UnknownEntry => "unknown-entry",
        };
        f.write_str(s)
    }
}

/// Errors produced while uploading to the collector.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collector returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("collector rejected chunk {chunk_index}: {message} (code {code:?})")]
    Rejected {
        chunk_index: u32,
        code: Option<i64>,
        message: String,
    },

    #[error("malformed collector response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("failed to encode chunk metadata: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("all {chunks_sent} chunks sent but the collector never reported completion")]
    Unconfirmed { chunks_sent: u32 },

    #[error("transfer error: {0}")]
    Transfer(#[from] outbox_transfer::TransferError),

    #[error("task join error: {0}")]
    Join(String),

    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl CollectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectorError::Http(_) | CollectorError::Status { .. } => {
                ErrorKind::TransientTransport
            }
            CollectorError::Rejected { .. }
            | CollectorError::MalformedResponse(_)
            | CollectorError::Encode(_)
            | CollectorError::Unconfirmed { .. }
            | CollectorError::InvalidConfig(_) => ErrorKind::ApplicationRejected,
            CollectorError::Transfer(_) | CollectorError::Join(_) => ErrorKind::LocalIo,
        }
    }
}
