//! Per-rotation state.
//!
//! An [`Epoch`] is created fresh for every rotation and moved into the
//! producer task that serves it; nothing about it is shared or mutated after
//! that. The [`EpochPlanner`] is owned by the rotation scheduler and decides
//! when a new epoch may open, what it is called, and how long it lives.

use crate::{GeneratorConfig, Jitter, MIN_ROTATION_INTERVAL, SequenceCounter};
use chrono::{DateTime, Utc};
use core::time::Duration;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// One (prefix, counter-range) pair.
#[derive(Debug)]
pub(crate) struct Epoch {
    /// 1-based rotation number, for logs.
    pub number: u64,
    pub prefix: String,
    pub counter: SequenceCounter,
}

pub(crate) struct EpochPlanner {
    /// Unix second the previous epoch opened in.
    last_second: Option<i64>,
    opened: u64,
    max_sequence: u64,
    rotation_interval: Duration,
    jitter: Option<(Jitter, StdRng)>,
}

impl EpochPlanner {
    pub fn new(config: &GeneratorConfig) -> Self {
        let jitter = config.jitter().map(|jitter| {
            let rng = match jitter.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            (jitter, rng)
        });

        Self {
            last_second: None,
            opened: 0,
            max_sequence: config.max_sequence(),
            rotation_interval: config.rotation_interval(),
            jitter,
        }
    }

    /// How long to wait before `now` falls in a second later than the
    /// previous epoch's. Zero means an epoch may open immediately.
    ///
    /// Prefixes have one-second resolution, so two epochs opened within the
    /// same second would share a prefix and restart their counters at 1.
    pub fn wait_for_fresh_second(&self, now: &DateTime<Utc>) -> Duration {
        match self.last_second {
            Some(last) if now.timestamp() <= last => {
                let elapsed_ms = u64::from(now.timestamp_subsec_millis()).min(999);
                let behind = u64::try_from(last - now.timestamp()).unwrap_or_default();
                Duration::from_millis(1000 - elapsed_ms + behind * 1000)
            }
            _ => Duration::ZERO,
        }
    }

    /// Opens the next epoch at `now` under `prefix`.
    ///
    /// The caller must have observed [`Self::wait_for_fresh_second`] return
    /// zero for the same `now`.
    pub fn open(&mut self, now: &DateTime<Utc>, prefix: String) -> Epoch {
        debug_assert!(self.wait_for_fresh_second(now).is_zero());

        self.last_second = Some(now.timestamp());
        self.opened += 1;

        let step = match &mut self.jitter {
            Some((jitter, rng)) => rng.random_range(1..=jitter.max_step),
            None => 1,
        };

        Epoch {
            number: self.opened,
            prefix,
            counter: SequenceCounter::new(step, self.max_sequence),
        }
    }

    /// Draws the lifetime of the epoch about to run.
    pub fn lifetime(&mut self) -> Duration {
        match &mut self.jitter {
            Some((_, rng)) => {
                let min = millis(MIN_ROTATION_INTERVAL);
                let max = millis(self.rotation_interval).max(min);
                Duration::from_millis(rng.random_range(min..=max))
            }
            None => self.rotation_interval,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
