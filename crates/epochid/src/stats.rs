use portable_atomic::{AtomicU64, Ordering};

/// Why an epoch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// The epoch lived for its full interval.
    Timer,
    /// The epoch's counter hit its ceiling first.
    Exhausted,
}

impl RotationTrigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Live counters shared between the scheduler, producers and consumers.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    produced: AtomicU64,
    delivered: AtomicU64,
    epochs: AtomicU64,
    timer_rotations: AtomicU64,
    exhaustion_rotations: AtomicU64,
}

impl Stats {
    pub fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_epoch(&self) {
        self.epochs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rotation(&self, trigger: RotationTrigger) {
        let counter = match trigger {
            RotationTrigger::Timer => &self.timer_rotations,
            RotationTrigger::Exhausted => &self.exhaustion_rotations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            epochs: self.epochs.load(Ordering::Relaxed),
            timer_rotations: self.timer_rotations.load(Ordering::Relaxed),
            exhaustion_rotations: self.exhaustion_rotations.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a generator's counters.
///
/// Fields are read independently, so a snapshot taken while the generator is
/// busy may be off by one between fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Identifiers pushed onto the queue.
    pub produced: u64,
    /// Identifiers handed to callers.
    pub delivered: u64,
    /// Epochs opened, including the first.
    pub epochs: u64,
    /// Rotations caused by the interval elapsing.
    pub timer_rotations: u64,
    /// Rotations caused by counter exhaustion.
    pub exhaustion_rotations: u64,
}

impl StatsSnapshot {
    /// Total rotations from either trigger.
    pub const fn rotations(&self) -> u64 {
        self.timer_rotations + self.exhaustion_rotations
    }
}
