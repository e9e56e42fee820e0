//! Error types for driftnet-core

use thiserror::Error;

/// Simulation error type
#[derive(Debug, Error)]
pub enum Error {
    /// Fixed timestep must be strictly positive
    #[error("Invalid timestep: must be greater than zero")]
    InvalidTimestep,

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, Error>;
