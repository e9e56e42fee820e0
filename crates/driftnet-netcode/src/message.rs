//! Wire message types
//!
//! Each message serializes itself with bincode's little-endian, fixed-width
//! integer encoding. `Snapshot::positions` carries a u64 length prefix
//! followed by little-endian f32 values. A payload must be consumed exactly:
//! trailing bytes are an error.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Version number assigned by the producer of a message
pub type Version = u32;

/// Binary representation of a single message payload
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Serialize to payload bytes
    fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(wire_options().serialize(self)?)
    }

    /// Deserialize from payload bytes
    fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Ok(wire_options().deserialize(bytes)?)
    }
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_little_endian()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// One tick of local input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// Monotonic per-sender version
    pub version: Version,
    /// Horizontal axis
    pub horizontal: f32,
    /// Vertical axis
    pub vertical: f32,
}

impl Input {
    /// Create an input with the given version and axes
    pub fn new(version: Version, horizontal: f32, vertical: f32) -> Self {
        Self {
            version,
            horizontal,
            vertical,
        }
    }
}

/// Authoritative positional state
///
/// Never mutated in place by this crate: interpolation and reconciliation
/// always produce a new `Snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonic server-assigned version
    pub version: Version,
    /// Position components, fixed length per session
    pub positions: Vec<f32>,
}

impl Snapshot {
    /// Create a snapshot from its version and position components
    pub fn new(version: Version, positions: Vec<f32>) -> Self {
        Self { version, positions }
    }
}

/// Acknowledgement of inputs processed up to a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Server-assigned message version
    pub version: Version,
    /// Highest input version processed by the server
    pub input_tick: Version,
}

/// Server wall-clock reading, used for clock sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTime {
    /// Probe version, echoed by the server in its reply
    pub version: Version,
    /// Server wall clock in milliseconds since the Unix epoch
    pub unix_milliseconds: u64,
}

impl WireMessage for Input {}
impl WireMessage for Snapshot {}
impl WireMessage for Ack {}
impl WireMessage for ServerTime {}
