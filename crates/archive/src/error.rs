//! Archive error types.

/// Errors produced while archiving a directory.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid source directory: {0}")]
    InvalidSource(String),

    /// An archive with the same name is still waiting for delivery.
    #[error("archive {} already exists and has not been delivered yet", .0.display())]
    DestinationExists(std::path::PathBuf),
}
