//! Simulation configuration
//!
//! Fixed timestep and seed, loadable from RON so both peers of a session can
//! share one document.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a `SimulationEngine`
///
/// # Example
///
/// ```
/// use driftnet_core::SimulationConfig;
/// use std::time::Duration;
///
/// let config = SimulationConfig::from_ron("(timestep: (secs: 0, nanos: 50000000), seed: 7)").unwrap();
/// assert_eq!(config.timestep, Duration::from_millis(50));
/// assert_eq!(config.seed, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Duration of one simulation tick
    pub timestep: Duration,
    /// Seed for the deterministic RNG of a fresh engine
    pub seed: u64,
}

impl SimulationConfig {
    /// Create a configuration with an explicit timestep and seed
    pub fn new(timestep: Duration, seed: u64) -> Self {
        Self { timestep, seed }
    }

    /// Create a configuration from a tick rate in Hz
    ///
    /// The timestep is truncated to whole nanoseconds.
    pub fn with_tick_rate(hz: u32, seed: u64) -> Self {
        let timestep = if hz == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(1_000_000_000 / u64::from(hz))
        };
        Self { timestep, seed }
    }

    /// Parse a RON document, then validate it
    pub fn from_ron(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        if self.timestep.is_zero() {
            return Err(Error::InvalidTimestep);
        }
        Ok(())
    }

    /// Timestep in (fractional) milliseconds
    pub fn timestep_ms(&self) -> f64 {
        self.timestep.as_secs_f64() * 1000.0
    }
}

impl Default for SimulationConfig {
    /// 60 Hz with the default seed
    fn default() -> Self {
        Self::with_tick_rate(60, 12345)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sixty_hz() {
        let config = SimulationConfig::default();
        assert_eq!(config.timestep, Duration::from_nanos(16_666_666));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timestep_rejected() {
        let config = SimulationConfig::new(Duration::ZERO, 1);
        assert!(matches!(config.validate(), Err(Error::InvalidTimestep)));
        assert!(SimulationConfig::with_tick_rate(0, 1).validate().is_err());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimulationConfig::from_ron("(seed: 99)").unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.timestep, SimulationConfig::default().timestep);
    }

    #[test]
    fn test_malformed_ron_rejected() {
        assert!(matches!(
            SimulationConfig::from_ron("(seed: \"nope\")"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
