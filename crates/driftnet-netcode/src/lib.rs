//! Driftnet Netcode - Client-side prediction and server reconciliation
//!
//! This crate provides the networking half of the driftnet stack:
//!
//! - **Packet codec**: tagged, optionally compressed binary framing
//! - **Input buffering**: ordered queue of unacknowledged local inputs
//! - **Reconciliation**: replay pending inputs onto an authoritative snapshot
//! - **Interpolation**: smooth display between buffered snapshots
//! - **Clock sync**: smoothed ping and server clock offset
//! - **Session**: all of the above behind one packet-in / packet-out type
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ClientSession                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │ Input Buffer │─▶│  Reconciler  │─▶│  predicted state  │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────┘  │
//! │         ▲                 ▲                                  │
//! │         │          ┌──────────────┐  ┌───────────────────┐  │
//! │   local input      │ Packet Codec │─▶│  Snapshot Buffer  │  │
//! │                    └──────────────┘  └───────────────────┘  │
//! │                           │                   │              │
//! │                    ┌──────────────┐  ┌───────────────────┐  │
//! │                    │  Clock Sync  │  │   Interpolator    │  │
//! │                    └──────────────┘  └───────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here performs I/O or spawns work: the caller owns the transport
//! and passes local time in milliseconds.
//!
//! # Example
//!
//! ```rust
//! use driftnet_netcode::{encode, ClientSession, Message, NetcodeConfig, Snapshot};
//!
//! let mut session = ClientSession::new(&NetcodeConfig::default()).unwrap();
//! for _ in 0..3 {
//!     session.record_input(1.0, 0.0).unwrap();
//! }
//!
//! // server has processed input 1
//! let packet = encode(&Message::Snapshot(Snapshot::new(1, vec![0.0, 0.0])), None).unwrap();
//! session.handle_packet(&packet, 1_000).unwrap();
//!
//! let predicted = session.predicted().unwrap();
//! assert_eq!(predicted.positions, vec![2.0, 0.0]);
//! assert_eq!(predicted.version, 3);
//! ```

mod clock_sync;
pub mod codec;
mod config;
mod error;
mod input_buffer;
mod interpolation;
pub mod message;
mod reconciliation;
mod session;

pub use clock_sync::ClockSync;
#[cfg(feature = "lz4")]
pub use codec::Lz4Compressor;
pub use codec::{decode, encode, Compressor, Message, PacketKind};
pub use config::NetcodeConfig;
pub use error::{Error, Result};
pub use input_buffer::InputBuffer;
pub use interpolation::Interpolator;
pub use message::{Ack, Input, ServerTime, Snapshot, Version, WireMessage};
pub use reconciliation::Reconciler;
pub use session::ClientSession;

// Re-export the buffer types used in this crate's API
pub use driftnet_snapshot_buffer::{BufferStats, SnapshotBuffer, TimestampedEntry};
