//! Orchestrator configuration.

use std::path::PathBuf;

use outbox_archive::DEFAULT_UNIT_DIVISOR;
use outbox_collector::RetryPolicy;
use outbox_transfer::{DEFAULT_CHUNK_SIZE, DigestAlgorithm};

/// Everything one sync run needs besides the transport and notifier.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Prefix for archive names; identifies this machine to the collector.
    pub device_id: String,
    /// Directory whose immediate children are shipped.
    pub outbox_dir: PathBuf,
    pub chunk_size: usize,
    pub retry: RetryPolicy,
    pub unit_divisor: usize,
    pub digest: DigestAlgorithm,
}

impl SyncConfig {
    pub fn new(device_id: impl Into<String>, outbox_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_id: device_id.into(),
            outbox_dir: outbox_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            unit_divisor: DEFAULT_UNIT_DIVISOR,
            digest: DigestAlgorithm::default(),
        }
    }
}
