//! Outbox synchronization pipeline.
//!
//! One run takes every immediate child of the outbox directory through
//! **scan -> classify -> archive (directories only) -> upload with retry ->
//! delete on confirmation**. Regular files are uploaded as-is; directories
//! are zipped first and removed once the archive is on disk; anything else
//! is skipped with a warning.
//!
//! Delivery is at-least-once: an artifact is deleted only after the
//! collector reports `"completed"`, so a failed entry is simply retried from
//! chunk 0 on the next run.

pub mod config;
pub mod entry;
pub mod error;
pub mod orchestrator;
pub mod report;

pub use config::SyncConfig;
pub use entry::{EntryKind, classify, list_entries};
pub use error::SyncError;
pub use orchestrator::SyncOrchestrator;
pub use report::{EntryOutcome, EntryReport, RunReport};
