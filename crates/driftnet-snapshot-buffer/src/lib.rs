//! Driftnet Snapshot Buffer - Fixed-capacity chronological store
//!
//! This crate provides a bounded ring buffer of timestamped values, used to
//! hold recent authoritative snapshots for render-time interpolation.
//!
//! # Features
//!
//! - **Bounded memory**: slots are allocated once at construction
//! - **O(1) insertion**: once full, each push overwrites the oldest entry
//! - **Bracketing lookup**: `pair_around` finds the two entries surrounding a
//!   timestamp, never extrapolating past either end
//!
//! # Example
//!
//! ```rust
//! use driftnet_snapshot_buffer::SnapshotBuffer;
//!
//! let mut buffer = SnapshotBuffer::new(5).unwrap();
//! for ts in [0, 110, 230, 360] {
//!     buffer.push(ts, ts * 2);
//! }
//!
//! let (previous, next) = buffer.pair_around(250).unwrap();
//! assert_eq!(previous.timestamp, 230);
//! assert_eq!(next.timestamp, 360);
//! assert!(buffer.pair_around(400).is_none());
//! ```

mod error;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds
pub type Timestamp = i64;

/// A value stamped with the time it was received or produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEntry<T> {
    /// Milliseconds on the caller's clock
    pub timestamp: Timestamp,
    /// Stored value
    pub value: T,
}

impl<T> TimestampedEntry<T> {
    /// Create a new entry
    pub fn new(timestamp: Timestamp, value: T) -> Self {
        Self { timestamp, value }
    }
}

/// Ring buffer of timestamped values
///
/// Entries are kept in push order. Once the buffer holds `capacity` entries,
/// every push evicts the oldest one.
#[derive(Debug, Clone)]
pub struct SnapshotBuffer<T> {
    /// Slot storage; `None` until first written
    slots: Vec<Option<TimestampedEntry<T>>>,
    /// Next slot to write
    head: usize,
    /// Number of occupied slots
    len: usize,
}

impl<T> SnapshotBuffer<T> {
    /// Create a buffer holding at most `capacity` entries
    ///
    /// Fails with [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        })
    }

    /// Append an entry, overwriting the oldest once full
    pub fn push(&mut self, timestamp: Timestamp, value: T) {
        let capacity = self.capacity();
        self.slots[self.head] = Some(TimestampedEntry::new(timestamp, value));
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Most recently pushed entry
    pub fn latest(&self) -> Option<&TimestampedEntry<T>> {
        if self.len == 0 {
            return None;
        }
        let index = (self.head + self.capacity() - 1) % self.capacity();
        self.slots[index].as_ref()
    }

    /// Oldest retained entry
    pub fn oldest(&self) -> Option<&TimestampedEntry<T>> {
        self.iter().next()
    }

    /// Find `(previous, next)` with `previous.timestamp <= timestamp < next.timestamp`
    ///
    /// Scans chronologically from the oldest retained entry. Returns `None`
    /// with fewer than two entries, before the oldest entry, or at/after the
    /// newest entry.
    pub fn pair_around(
        &self,
        timestamp: Timestamp,
    ) -> Option<(&TimestampedEntry<T>, &TimestampedEntry<T>)> {
        if self.len < 2 {
            return None;
        }

        let mut entries = self.iter();
        let mut previous = entries.next()?;
        if timestamp < previous.timestamp {
            return None;
        }

        for next in entries {
            if previous.timestamp <= timestamp && timestamp < next.timestamp {
                return Some((previous, next));
            }
            previous = next;
        }
        None
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedEntry<T>> {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).filter_map(move |offset| self.slots[(start + offset) % capacity].as_ref())
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the next push will evict
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Get statistics about the buffer
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            capacity: self.capacity(),
            count: self.len,
            oldest_timestamp: self.oldest().map(|e| e.timestamp),
            newest_timestamp: self.latest().map(|e| e.timestamp),
        }
    }
}

/// Statistics about a snapshot buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of stored entries
    pub count: usize,
    /// Timestamp of the oldest entry
    pub oldest_timestamp: Option<Timestamp>,
    /// Timestamp of the newest entry
    pub newest_timestamp: Option<Timestamp>,
}

impl BufferStats {
    /// Time covered by the buffer (newest - oldest)
    pub fn span(&self) -> Timestamp {
        match (self.oldest_timestamp, self.newest_timestamp) {
            (Some(oldest), Some(newest)) => newest - oldest,
            _ => 0,
        }
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}
