//! Input buffering for network synchronization
//!
//! Holds local inputs that have been sent to the server but not yet
//! acknowledged, so they can be replayed on top of an authoritative snapshot.
//!
//! Inputs must be pushed in ascending `version` order, and acknowledgements
//! must use the same version space. The buffer relies on this to trim a
//! prefix and does not re-sort.

use crate::message::{Input, Version};
use std::collections::VecDeque;
use tracing::trace;

/// Ordered queue of unacknowledged local inputs
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    /// Pending inputs (oldest first)
    inputs: VecDeque<Input>,
    /// Last version acknowledged by the server
    last_acknowledged: Option<Version>,
}

impl InputBuffer {
    /// Create an empty input buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` inputs before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inputs: VecDeque::with_capacity(capacity),
            last_acknowledged: None,
        }
    }

    /// Append an input at the tail
    pub fn push(&mut self, input: Input) {
        self.inputs.push_back(input);
    }

    /// Drop every input with `version <= server_version`
    ///
    /// The cut point is the first input newer than `server_version`; if no
    /// such input exists the buffer is cleared.
    pub fn acknowledge(&mut self, server_version: Version) {
        self.last_acknowledged = Some(server_version);

        let cut = self
            .inputs
            .iter()
            .position(|input| input.version > server_version)
            .unwrap_or(self.inputs.len());
        self.inputs.drain(..cut);

        trace!(server_version, dropped = cut, pending = self.inputs.len(), "inputs acknowledged");
    }

    /// Copy of the remaining inputs, in push order
    pub fn unacknowledged(&self) -> Vec<Input> {
        self.inputs.iter().copied().collect()
    }

    /// Iterate over the remaining inputs without copying
    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.inputs.iter()
    }

    /// Version of the oldest pending input
    pub fn oldest_version(&self) -> Option<Version> {
        self.inputs.front().map(|i| i.version)
    }

    /// Version of the newest pending input
    pub fn newest_version(&self) -> Option<Version> {
        self.inputs.back().map(|i| i.version)
    }

    /// Last version passed to `acknowledge`
    pub fn last_acknowledged(&self) -> Option<Version> {
        self.last_acknowledged
    }

    /// Get the number of pending inputs
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Clear all inputs
    pub fn clear(&mut self) {
        self.inputs.clear();
    }
}
