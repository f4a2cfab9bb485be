/// Outcome of asking a [`SequenceCounter`] for its next value.
///
/// - [`CounterStatus::Ready`] carries a value never issued before in this
///   epoch.
/// - [`CounterStatus::Exhausted`] means the ceiling has been reached. This is
///   the normal end-of-epoch signal: the caller must rotate to a new epoch
///   before asking again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStatus {
    /// A fresh value is available.
    Ready {
        /// Strictly greater than every value previously returned.
        value: u64,
    },
    /// No further values remain in this epoch.
    Exhausted,
}

/// A bounded, strictly increasing per-epoch sequence.
///
/// The first value is always 1. Every following value is the previous one
/// plus `step`. Once the next value would exceed `max_sequence` (or overflow
/// `u64`) the counter reports [`CounterStatus::Exhausted`] forever. It never
/// wraps.
///
/// # Example
///
/// ```
/// use epochid::{CounterStatus, SequenceCounter};
///
/// let mut counter = SequenceCounter::new(1, 2);
/// assert_eq!(counter.next_value(), CounterStatus::Ready { value: 1 });
/// assert_eq!(counter.next_value(), CounterStatus::Ready { value: 2 });
/// assert_eq!(counter.next_value(), CounterStatus::Exhausted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCounter {
    next: Option<u64>,
    step: u64,
    max_sequence: u64,
}

impl SequenceCounter {
    /// Creates a counter starting at 1 with the given `step` and ceiling.
    ///
    /// A `step` of 0 is treated as 1 so the sequence is always strictly
    /// increasing.
    pub const fn new(step: u64, max_sequence: u64) -> Self {
        Self {
            next: Some(1),
            step: if step == 0 { 1 } else { step },
            max_sequence,
        }
    }

    /// Returns the next value, or [`CounterStatus::Exhausted`] once the
    /// ceiling is passed.
    pub fn next_value(&mut self) -> CounterStatus {
        match self.next {
            Some(value) if value <= self.max_sequence => {
                self.next = value.checked_add(self.step);
                CounterStatus::Ready { value }
            }
            _ => {
                self.next = None;
                CounterStatus::Exhausted
            }
        }
    }

    /// The step between consecutive values.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// The highest value this counter may return.
    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }
}
