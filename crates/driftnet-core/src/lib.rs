//! Driftnet Core - Deterministic fixed-timestep simulation
//!
//! This crate provides the locally predicted half of the driftnet stack:
//! - `DeterministicRng` - a seeded generator whose whole state is one `u64`
//! - `TimeSource` - injectable monotonic clocks (`SystemClock`, `ManualClock`)
//! - `SimulationEngine` - a fixed-step-with-accumulator loop over any state type
//! - `SimulationSnapshot` - a serializable capture used for rollback and resumption
//!
//! ## Determinism
//!
//! Two engines built with the same seed, the same update function and fed the
//! same sequence of `frame`/`advance` calls produce bit-identical state. The
//! update function must draw randomness only from the generator it is handed.
//!
//! # Example
//!
//! ```rust
//! use driftnet_core::{DeterministicRng, SimulationConfig, SimulationEngine};
//! use std::time::Duration;
//!
//! let config = SimulationConfig::default();
//! let update = |count: &mut u64, rng: &mut DeterministicRng, _dt: Duration| {
//!     *count += rng.range_i64(0, 1) as u64;
//! };
//! let mut engine = SimulationEngine::new(&config, 0u64, update).unwrap();
//!
//! engine.advance(10);
//! assert_eq!(engine.tick(), 10);
//! ```

mod config;
mod engine;
mod error;
mod rng;
mod snapshot;
pub mod time;

pub use config::SimulationConfig;
pub use engine::SimulationEngine;
pub use error::{Error, Result};
pub use rng::DeterministicRng;
pub use snapshot::SimulationSnapshot;
pub use time::{ManualClock, SystemClock, TimeSource};
