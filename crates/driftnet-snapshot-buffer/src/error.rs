//! Error types for driftnet-snapshot-buffer

use thiserror::Error;

/// Snapshot buffer error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Capacity must be at least one slot
    #[error("Invalid capacity {0}: must be greater than 0")]
    InvalidCapacity(usize),
}

/// Result type for snapshot buffer operations
pub type Result<T> = std::result::Result<T, Error>;
