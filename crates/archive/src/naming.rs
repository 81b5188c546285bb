//! Archive naming heuristic.
//!
//! Kept free of I/O: the name is computed from counts gathered by the
//! scanner, so the rule can be tested on its own.

use std::fmt;

/// Files per logical unit when deriving the unit count.
pub const DEFAULT_UNIT_DIVISOR: usize = 2;

/// Derived archive name: `{device_id}-{source_name}-{unit_count}.zip`.
///
/// Two directories with the same name and unit count on the same device map
/// to the same archive name. The collector keeps the last one delivered; a
/// local archive still waiting for delivery is never replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub device_id: String,
    pub source_name: String,
    pub unit_count: usize,
}

impl ArchiveName {
    /// Derives the name from a file count.
    ///
    /// `unit_count = file_count / divisor` (integer division). A divisor of
    /// 0 is treated as 1.
    pub fn derive(device_id: &str, source_name: &str, file_count: usize, divisor: usize) -> Self {
        Self {
            device_id: sanitize(device_id),
            source_name: sanitize(source_name),
            unit_count: file_count / divisor.max(1),
        }
    }

    /// Archive file name including the `.zip` extension.
    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}.zip",
            self.device_id, self.source_name, self.unit_count
        )
    }
}

/// Replaces path separators so a component can never escape the outbox.
fn sanitize(component: &str) -> String {
    component.replace(['/', '\\'], "_")
}
