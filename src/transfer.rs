//! Outbound transfers and transfer ID generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

use bytes::Bytes;

use crate::fragment;
use crate::types::{Priority, TransferId};

/// A point in time, recorded on both the wall clock and the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Wall-clock time.
    pub system: SystemTime,
    /// Monotonic time.
    pub monotonic: Instant,
}

impl Timestamp {
    /// Capture the current time from the standard library clocks.
    pub fn now() -> Self {
        Self {
            system: SystemTime::now(),
            monotonic: Instant::now(),
        }
    }
}

/// One logical message instance, carried as an ordered sequence of fragments.
///
/// A transfer is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    timestamp: Timestamp,
    priority: Priority,
    transfer_id: TransferId,
    fragments: Vec<Bytes>,
}

impl Transfer {
    /// Create a new transfer.
    pub fn new(
        timestamp: Timestamp,
        priority: Priority,
        transfer_id: TransferId,
        fragments: Vec<Bytes>,
    ) -> Self {
        Self {
            timestamp,
            priority,
            transfer_id,
            fragments,
        }
    }

    /// Time the transfer was created.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn transfer_id(&self) -> TransferId {
        self.transfer_id
    }

    /// Fragments in sequence order.
    pub fn fragments(&self) -> &[Bytes] {
        &self.fragments
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Total payload length across all fragments.
    pub fn payload_len(&self) -> usize {
        fragment::total_len(&self.fragments)
    }

    /// The payload, reconstructed by concatenating the fragments in order.
    pub fn payload(&self) -> Bytes {
        fragment::concat(&self.fragments)
    }

    /// Consume the transfer, returning its fragments.
    pub fn into_fragments(self) -> Vec<Bytes> {
        self.fragments
    }
}

/// Monotonically increasing transfer ID source for one output session.
///
/// Starts at 0 and wraps at `u64::MAX`.
#[derive(Debug, Default)]
pub struct TransferIdSequence {
    next: AtomicU64,
}

impl TransferIdSequence {
    /// Create a sequence starting at 0.
    pub fn new() -> Self {
        Self::starting_at(TransferId(0))
    }

    /// Create a sequence starting at `first`.
    pub fn starting_at(first: TransferId) -> Self {
        Self {
            next: AtomicU64::new(first.0),
        }
    }

    /// Take the next transfer ID.
    pub fn next_id(&self) -> TransferId {
        let taken = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some(TransferId(id).next().0)
            })
            .unwrap_or_else(|id| id);
        TransferId(taken)
    }

    /// The ID the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> TransferId {
        TransferId(self.next.load(Ordering::Relaxed))
    }
}
