//! Round-trip time and clock offset estimation
//!
//! Each ping/pong exchange yields one sample:
//!
//! ```text
//! rtt    = received - sent
//! offset = server_time - (sent + rtt / 2)
//! ```
//!
//! assuming one-way latency is half the round trip. Both values are smoothed
//! with an exponential moving average seeded by the first sample.

use crate::{Error, Result};
use tracing::trace;

/// Smoothed ping and clock offset estimator
#[derive(Debug, Clone)]
pub struct ClockSync {
    /// EMA weight of each new sample, in (0, 1]
    smoothing: f64,
    /// Smoothed round-trip time in milliseconds
    ping: f64,
    /// Smoothed server-minus-client offset in milliseconds
    offset: f64,
    /// Samples accepted so far
    samples: u64,
}

impl ClockSync {
    /// Create an estimator with smoothing factor `smoothing`
    ///
    /// Fails with [`Error::InvalidConfig`] unless `0 < smoothing <= 1`.
    pub fn new(smoothing: f64) -> Result<Self> {
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "smoothing factor {smoothing} outside (0, 1]"
            )));
        }
        Ok(Self {
            smoothing,
            ping: 0.0,
            offset: 0.0,
            samples: 0,
        })
    }

    /// Ingest one measurement, all values in milliseconds
    ///
    /// A sample received before it was sent is rejected with
    /// [`Error::Causality`] and leaves the estimates unchanged.
    pub fn sample(&mut self, client_sent: u64, server_time: u64, client_received: u64) -> Result<()> {
        if client_received < client_sent {
            return Err(Error::Causality {
                sent: client_sent,
                received: client_received,
            });
        }

        let rtt = (client_received - client_sent) as f64;
        let offset = server_time as f64 - (client_sent as f64 + rtt / 2.0);

        if self.samples == 0 {
            self.ping = rtt;
            self.offset = offset;
        } else {
            self.ping += self.smoothing * (rtt - self.ping);
            self.offset += self.smoothing * (offset - self.offset);
        }
        self.samples += 1;

        trace!(rtt, offset, ping = self.ping, smoothed_offset = self.offset, "clock sample");
        Ok(())
    }

    /// Smoothed round-trip time in milliseconds (0 before any sample)
    pub fn ping(&self) -> f64 {
        self.ping
    }

    /// Smoothed server-minus-client offset in milliseconds (0 before any sample)
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Estimated server clock reading for a local reading
    pub fn server_time(&self, local_ms: u64) -> f64 {
        local_ms as f64 + self.offset
    }

    /// Number of accepted samples
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Smoothing factor
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Drop all estimates; the next sample seeds them again
    pub fn reset(&mut self) {
        self.ping = 0.0;
        self.offset = 0.0;
        self.samples = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_to_zero() {
        let sync = ClockSync::new(0.5).unwrap();
        assert_eq!(sync.ping(), 0.0);
        assert_eq!(sync.offset(), 0.0);
        assert_eq!(sync.sample_count(), 0);
    }

    #[test]
    fn test_invalid_smoothing_rejected() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            assert!(matches!(ClockSync::new(bad), Err(Error::InvalidConfig(_))));
        }
        assert!(ClockSync::new(1.0).is_ok());
    }

    #[test]
    fn test_first_sample_seeds_estimates() {
        let mut sync = ClockSync::new(0.1).unwrap();
        sync.sample(1000, 1090, 1100).unwrap();
        assert_relative_eq!(sync.ping(), 100.0);
        assert_relative_eq!(sync.offset(), 40.0);
    }

    #[test]
    fn test_converges_under_jitter() {
        let mut sync = ClockSync::new(0.5).unwrap();
        let mut sent = 10_000u64;

        for rtt in [100u64, 120, 80, 110, 90] {
            let server = sent + rtt / 2 + 40;
            sync.sample(sent, server, sent + rtt).unwrap();
            sent += 1000;
        }

        assert!((sync.ping() - 100.0).abs() < 10.0);
        assert!((sync.offset() - 40.0).abs() < 10.0);
        assert_eq!(sync.sample_count(), 5);
    }

    #[test]
    fn test_causality_violation_keeps_estimates() {
        let mut sync = ClockSync::new(0.5).unwrap();
        sync.sample(0, 60, 100).unwrap();

        let result = sync.sample(500, 0, 400);
        assert!(matches!(result, Err(Error::Causality { sent: 500, received: 400 })));
        assert_relative_eq!(sync.ping(), 100.0);
        assert_relative_eq!(sync.offset(), 10.0);
        assert_eq!(sync.sample_count(), 1);
    }

    #[test]
    fn test_server_behind_gives_negative_offset() {
        let mut sync = ClockSync::new(1.0).unwrap();
        sync.sample(1000, 950, 1100).unwrap();
        assert_relative_eq!(sync.offset(), -100.0);
        assert_relative_eq!(sync.server_time(2000), 1900.0);
    }

    #[test]
    fn test_full_smoothing_tracks_latest() {
        let mut sync = ClockSync::new(1.0).unwrap();
        sync.sample(0, 0, 100).unwrap();
        sync.sample(0, 0, 300).unwrap();
        assert_relative_eq!(sync.ping(), 300.0);
    }
}
