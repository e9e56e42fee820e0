//! Snapshot interpolation for smooth rendering
//!
//! Produces an intermediate snapshot between two buffered authoritative
//! snapshots, so display can run behind the server by a fixed delay and
//! always have a bracketing pair to blend.

use crate::message::{Snapshot, Version};
use crate::{Error, Result};
use driftnet_snapshot_buffer::{SnapshotBuffer, Timestamp};

/// Render-time interpolator
#[derive(Debug, Clone)]
pub struct Interpolator {
    /// How far behind the local clock rendering runs, in milliseconds
    delay_ms: i64,
}

impl Interpolator {
    /// Create an interpolator rendering `delay_ms` behind the local clock
    pub fn new(delay_ms: i64) -> Self {
        Self { delay_ms }
    }

    /// Blend two snapshots component-wise
    ///
    /// `alpha` must be in [0, 1] and both snapshots must have the same number
    /// of positions. The version is interpolated and rounded.
    pub fn interpolate(previous: &Snapshot, next: &Snapshot, alpha: f32) -> Result<Snapshot> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(Error::AlphaOutOfRange(alpha));
        }
        if previous.positions.len() != next.positions.len() {
            return Err(Error::ShapeMismatch {
                expected: previous.positions.len(),
                actual: next.positions.len(),
            });
        }

        let positions = previous
            .positions
            .iter()
            .zip(&next.positions)
            .map(|(p, n)| p + (n - p) * alpha)
            .collect();

        Ok(Snapshot::new(
            Self::interpolate_version(previous.version, next.version, alpha),
            positions,
        ))
    }

    fn interpolate_version(previous: Version, next: Version, alpha: f32) -> Version {
        let p = f64::from(previous);
        let n = f64::from(next);
        let blended = (p + (n - p) * f64::from(alpha)).round();
        blended.clamp(0.0, f64::from(Version::MAX)) as Version
    }

    /// Interpolated display state at `now_ms`
    ///
    /// Renders at `now_ms - delay`, using the buffered pair that brackets
    /// that time. Returns `Ok(None)` when the buffer has no such pair.
    pub fn sample(
        &self,
        buffer: &SnapshotBuffer<Snapshot>,
        now_ms: Timestamp,
    ) -> Result<Option<Snapshot>> {
        let render_time = now_ms - self.delay_ms;
        let Some((previous, next)) = buffer.pair_around(render_time) else {
            return Ok(None);
        };

        let span = (next.timestamp - previous.timestamp) as f64;
        let alpha = ((render_time - previous.timestamp) as f64 / span).clamp(0.0, 1.0) as f32;

        Self::interpolate(&previous.value, &next.value, alpha).map(Some)
    }

    /// Render delay in milliseconds
    pub fn delay_ms(&self) -> i64 {
        self.delay_ms
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_midpoint() {
        let previous = Snapshot::new(0, vec![0.0, 0.0]);
        let next = Snapshot::new(2, vec![2.0, 2.0]);

        let mid = Interpolator::interpolate(&previous, &next, 0.5).unwrap();
        assert_eq!(mid.positions, vec![1.0, 1.0]);
        assert_eq!(mid.version, 1);
    }

    #[test]
    fn test_endpoints() {
        let previous = Snapshot::new(10, vec![1.0, -4.0, 3.5]);
        let next = Snapshot::new(20, vec![2.0, 6.0, 3.5]);

        let start = Interpolator::interpolate(&previous, &next, 0.0).unwrap();
        assert_eq!(start, previous);

        let end = Interpolator::interpolate(&previous, &next, 1.0).unwrap();
        assert_eq!(end, next);
    }

    #[test]
    fn test_version_rounds() {
        let previous = Snapshot::new(1, vec![0.0]);
        let next = Snapshot::new(2, vec![0.0]);
        assert_eq!(Interpolator::interpolate(&previous, &next, 0.4).unwrap().version, 1);
        assert_eq!(Interpolator::interpolate(&previous, &next, 0.6).unwrap().version, 2);
    }

    #[test]
    fn test_alpha_out_of_range() {
        let s = Snapshot::new(0, vec![0.0]);
        assert!(matches!(
            Interpolator::interpolate(&s, &s, 1.5),
            Err(Error::AlphaOutOfRange(_))
        ));
        assert!(matches!(
            Interpolator::interpolate(&s, &s, -0.1),
            Err(Error::AlphaOutOfRange(_))
        ));
        assert!(Interpolator::interpolate(&s, &s, f32::NAN).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        let previous = Snapshot::new(0, vec![0.0, 0.0]);
        let next = Snapshot::new(1, vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            Interpolator::interpolate(&previous, &next, 0.5),
            Err(Error::ShapeMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_sample_from_buffer() {
        let mut buffer = SnapshotBuffer::new(8).unwrap();
        buffer.push(1000, Snapshot::new(1, vec![0.0, 0.0]));
        buffer.push(1100, Snapshot::new(2, vec![10.0, 20.0]));

        let interpolator = Interpolator::new(100);
        let sampled = interpolator.sample(&buffer, 1125).unwrap().unwrap();
        assert_relative_eq!(sampled.positions[0], 2.5);
        assert_relative_eq!(sampled.positions[1], 5.0);
        assert_eq!(sampled.version, 1);

        // render time before the oldest snapshot
        assert!(interpolator.sample(&buffer, 1050).unwrap().is_none());
        // render time at the newest snapshot: no extrapolation
        assert!(interpolator.sample(&buffer, 1200).unwrap().is_none());
    }

    proptest! {
        #[test]
        fn prop_endpoints_match_inputs(
            positions in prop::collection::vec((-1.0e4f32..1.0e4, -1.0e4f32..1.0e4), 0..16),
            versions in (0u32..100_000, 0u32..100_000)
        ) {
            let previous = Snapshot::new(versions.0, positions.iter().map(|p| p.0).collect());
            let next = Snapshot::new(versions.1, positions.iter().map(|p| p.1).collect());

            let start = Interpolator::interpolate(&previous, &next, 0.0).unwrap();
            prop_assert_eq!(&start, &previous);

            let end = Interpolator::interpolate(&previous, &next, 1.0).unwrap();
            prop_assert_eq!(end.version, next.version);
            for (got, want) in end.positions.iter().zip(&next.positions) {
                prop_assert!((got - want).abs() <= want.abs() * 1e-6 + 1e-3);
            }
        }
    }
}
