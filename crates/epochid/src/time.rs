use chrono::{DateTime, Utc};

/// A source of wall-clock time used to derive epoch prefixes.
///
/// This abstraction allows you to plug in the real system clock or a
/// simulated one in tests. Prefixes have one-second resolution, so only the
/// whole-second part of the returned instant affects identifiers; the
/// sub-second part is used to decide how long to wait for the next second.
///
/// # Example
///
/// ```
/// use chrono::{DateTime, TimeZone, Utc};
/// use epochid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now(&self) -> DateTime<Utc> {
///         Utc.timestamp_opt(1_700_000_000, 0).unwrap()
///     }
/// }
///
/// assert_eq!(FixedTime.now().timestamp(), 1_700_000_000);
/// ```
pub trait TimeSource {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The system's wall clock.
///
/// Rollback is not corrected for: a clock stepping backwards across a
/// rotation can reproduce an earlier prefix.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
