//! Engine state capture for rollback and cross-process resumption

use crate::time::Tick;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Everything needed to resume a `SimulationEngine`
///
/// `tick`, `rng_state` and `state` fully determine every future tick given
/// the same update function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot<S> {
    /// Number of ticks executed so far
    pub tick: Tick,
    /// Internal state of the deterministic RNG
    pub rng_state: u64,
    /// Owned copy of the simulated state
    pub state: S,
}

impl<S> SimulationSnapshot<S> {
    /// Create a snapshot from its parts
    pub fn new(tick: Tick, rng_state: u64, state: S) -> Self {
        Self {
            tick,
            rng_state,
            state,
        }
    }
}

impl<S: Serialize> SimulationSnapshot<S> {
    /// Serialize with bincode for persistence or transfer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl<S: DeserializeOwned> SimulationSnapshot<S> {
    /// Deserialize a snapshot produced by `to_bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}
