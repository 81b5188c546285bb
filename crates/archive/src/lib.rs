//! Deterministic-named zip archiving of outbox directories.
//!
//! A directory dropped into the outbox is uploaded as a single deflate
//! archive. The archive name is derived from the device, the directory name
//! and a unit count observed before compression starts:
//!
//! ```text
//! {device-id}-{source-name}-{unit-count}.zip
//! ```
//!
//! # Pipeline
//!
//! 1. **Scan**: walk the tree, collect regular files and count children
//! 2. **Name**: derive the [`ArchiveName`] from the scan (pure, no I/O)
//! 3. **Write**: compress every file under its relative path into a hidden
//!    staging file, then rename it to the final name. A failed write removes
//!    the staging file and an existing archive is never replaced

pub mod error;
pub mod naming;
pub mod scanner;
pub mod writer;

pub use error::ArchiveError;
pub use naming::{ArchiveName, DEFAULT_UNIT_DIVISOR};
pub use scanner::{DirScan, ScannedFile, scan_dir};
pub use writer::{ArchivedDir, STAGING_PREFIX, archive_dir, is_staging_name};
