//! Netcode configuration
//!
//! Client-side tuning knobs, loadable from RON. Partial documents fill the
//! missing fields from `Default`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a `ClientSession`
///
/// # Example
///
/// ```
/// use driftnet_netcode::NetcodeConfig;
///
/// let config = NetcodeConfig::from_ron("(smoothing_factor: 0.5, compress: true)").unwrap();
/// assert_eq!(config.smoothing_factor, 0.5);
/// assert_eq!(config.snapshot_capacity, 32);
/// assert!(config.compress);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetcodeConfig {
    /// EMA weight for ping/offset samples, in (0, 1]
    pub smoothing_factor: f64,
    /// Number of authoritative snapshots kept for interpolation
    pub snapshot_capacity: usize,
    /// How far behind the local clock display state is rendered
    pub interpolation_delay_ms: i64,
    /// Compress outgoing payloads with LZ4
    pub compress: bool,
}

impl NetcodeConfig {
    /// Parse a RON document, then validate it
    pub fn from_ron(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would fail at construction
    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "smoothing factor {} outside (0, 1]",
                self.smoothing_factor
            )));
        }
        if self.snapshot_capacity == 0 {
            return Err(Error::InvalidConfig("snapshot capacity must be greater than 0".into()));
        }
        if self.interpolation_delay_ms < 0 {
            return Err(Error::InvalidConfig(format!(
                "interpolation delay {}ms is negative",
                self.interpolation_delay_ms
            )));
        }
        Ok(())
    }
}

impl Default for NetcodeConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.1,
            snapshot_capacity: 32,
            interpolation_delay_ms: 100,
            compress: false,
        }
    }
}
