//! Server state reconciliation
//!
//! Folds the inputs the server has not yet acknowledged onto an
//! authoritative snapshot, producing the corrected predicted state.
//!
//! A reconciliation call takes the input buffer by `&mut`, so no push can
//! interleave between acknowledging and replaying: every pending input is
//! replayed exactly once.

use crate::message::Snapshot;
use crate::{Error, InputBuffer, Result};
use tracing::debug;

/// Number of leading position components treated as the 2D input target
const PLANAR_DIMENSIONS: usize = 2;

/// Replay-after-acknowledge prediction corrector
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    /// Session-constant position count, locked by the first snapshot
    positions_len: Option<usize>,
    /// Result of the last successful reconciliation
    last_reconciled: Option<Snapshot>,
}

impl Reconciler {
    /// Create a reconciler with no session shape yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Correct the predicted state against an authoritative snapshot
    ///
    /// Acknowledges `authoritative.version` in `inputs`, then adds each
    /// remaining input's axes to position components 0 and 1. The result
    /// carries the last replayed input's version, or the authoritative
    /// version when nothing is pending.
    ///
    /// Validation happens before anything is touched: on error the input
    /// buffer and this reconciler are unchanged.
    pub fn reconcile(&mut self, authoritative: &Snapshot, inputs: &mut InputBuffer) -> Result<Snapshot> {
        let actual = authoritative.positions.len();
        if actual < PLANAR_DIMENSIONS {
            return Err(Error::InsufficientDimensions {
                required: PLANAR_DIMENSIONS,
                actual,
            });
        }
        if let Some(expected) = self.positions_len {
            if expected != actual {
                return Err(Error::ShapeMismatch { expected, actual });
            }
        }

        inputs.acknowledge(authoritative.version);

        let mut positions = authoritative.positions.clone();
        let mut version = authoritative.version;
        for input in inputs.iter() {
            positions[0] += input.horizontal;
            positions[1] += input.vertical;
            version = input.version;
        }

        debug!(
            server_version = authoritative.version,
            replayed = inputs.len(),
            predicted_version = version,
            "reconciled"
        );

        let reconciled = Snapshot::new(version, positions);
        self.positions_len = Some(actual);
        self.last_reconciled = Some(reconciled.clone());
        Ok(reconciled)
    }

    /// Last corrected prediction, if any
    pub fn last_reconciled(&self) -> Option<&Snapshot> {
        self.last_reconciled.as_ref()
    }

    /// Position count locked for this session
    pub fn positions_len(&self) -> Option<usize> {
        self.positions_len
    }

    /// Forget the session shape and last result
    pub fn reset(&mut self) {
        self.positions_len = None;
        self.last_reconciled = None;
    }
}
