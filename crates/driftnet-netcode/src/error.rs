//! Error types for driftnet-netcode

use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Clock sample received before it was sent
    #[error("Causality violation: received at {received} before sent at {sent}")]
    Causality { sent: u64, received: u64 },

    /// Packet shorter than the two-byte header
    #[error("Packet too short: {len} bytes, header needs 2")]
    PacketTooShort { len: usize },

    /// Compressed payload but no decompressor supplied
    #[error("Packet is compressed but no decompressor was supplied")]
    MissingDecompressor,

    /// Kind tag outside the known range
    #[error("Unknown packet kind {0}")]
    UnknownPacketKind(u8),

    /// Compression flag other than 0 or 1
    #[error("Invalid compression flag {0}")]
    InvalidCompressionFlag(u8),

    /// Message payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Compressor or decompressor failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Snapshots with differing position counts
    #[error("Shape mismatch: expected {expected} positions, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Snapshot with too few position components
    #[error("Snapshot has {actual} positions, at least {required} required")]
    InsufficientDimensions { required: usize, actual: usize },

    /// Interpolation factor outside [0, 1]
    #[error("Interpolation alpha {0} outside [0, 1]")]
    AlphaOutOfRange(f32),

    /// Version counter reached `Version::MAX`
    #[error("{0} versions exhausted")]
    VersionsExhausted(&'static str),

    /// Snapshot buffer error
    #[error(transparent)]
    Buffer(#[from] driftnet_snapshot_buffer::Error),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
