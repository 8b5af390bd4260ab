//! Per-stream sequence numbering.
//!
//! Senders number frames from 1. Receivers accept only frames newer than the
//! last accepted one, so a duplicated or reordered frame is applied at most once.

/// Sequence number type alias.
pub type SequenceNumber = u32;

/// Hands out increasing sequence numbers for one outbound stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceCounter {
    last: SequenceNumber,
}

impl SequenceCounter {
    /// Creates a counter whose first number is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Gets the next sequence number and increments it.
    #[inline]
    pub fn next_sequence(&mut self) -> SequenceNumber {
        self.last = self.last.wrapping_add(1);
        self.last
    }
}

/// Outcome of checking an inbound sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Exactly the next expected frame.
    InOrder,
    /// Newer than expected; `missing` frames were skipped.
    Gap {
        /// Number of skipped frames.
        missing: u32,
    },
    /// Already seen or older; must be discarded.
    Stale,
}

impl SequenceCheck {
    /// True unless the frame must be dropped.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        !matches!(self, Self::Stale)
    }
}

/// Tracks the newest accepted sequence number of one inbound stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceTracker {
    last_accepted: SequenceNumber,
}

impl SequenceTracker {
    /// Creates a tracker that has accepted nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_accepted: 0 }
    }

    /// Creates a tracker that treats `sequence` as already accepted.
    #[must_use]
    pub const fn resume_after(sequence: SequenceNumber) -> Self {
        Self {
            last_accepted: sequence,
        }
    }

    /// Last accepted sequence number (0 before the first frame).
    #[must_use]
    pub const fn last_accepted(&self) -> SequenceNumber {
        self.last_accepted
    }

    /// Checks `sequence` and records it if accepted.
    pub fn accept(&mut self, sequence: SequenceNumber) -> SequenceCheck {
        // Newer means within half the number space ahead, so wrap-around works.
        let diff = sequence.wrapping_sub(self.last_accepted);
        if diff == 0 || diff > u32::MAX / 2 {
            return SequenceCheck::Stale;
        }
        self.last_accepted = sequence;
        if diff == 1 {
            SequenceCheck::InOrder
        } else {
            SequenceCheck::Gap { missing: diff - 1 }
        }
    }
}
