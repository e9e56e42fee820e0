//! Deterministic random number generator
//!
//! A xorshift64 generator: its full internal state is a single `u64`, so a
//! `SimulationSnapshot` captures it exactly and a restored engine continues
//! the same sequence on every platform.

use serde::{Deserialize, Serialize};

/// Seeded deterministic random source handed to simulation update functions
///
/// Never reach for thread-local or OS randomness inside an update function;
/// anything not drawn from this generator breaks replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a new RNG from an integer seed
    pub fn new(seed: u64) -> Self {
        Self::from_state(seed)
    }

    /// Rebuild an RNG from a previously captured state
    pub fn from_state(state: u64) -> Self {
        // xorshift never leaves the zero state
        let state = if state == 0 { 1 } else { state };
        Self { state }
    }

    /// The complete internal state
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random u32 from the high bits
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a random f64 in range [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        // 53 high bits map exactly onto the f64 mantissa
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a random f64 in range [min, max)
    pub fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Generate a random i64 in range [min, max]
    pub fn range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max.wrapping_sub(min) as u64).wrapping_add(1);
        if span == 0 {
            // full i64 range
            return self.next_u64() as i64;
        }
        min.wrapping_add((self.next_u64() % span) as i64)
    }

    /// Generate a random bool with given probability of true
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(12345)
    }
}
