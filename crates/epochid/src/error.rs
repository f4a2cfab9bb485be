//! Error types for the identifier engine.
//!
//! Construction-time validation failures are reported through
//! [`Error::InvalidConfiguration`]. Counter exhaustion is not an error at all:
//! it is consumed internally as a rotation trigger and never reaches callers.

use core::time::Duration;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `epochid` can surface to callers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The supplied [`crate::Options`] were rejected. Never retried; no
    /// generator is built.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// `start` was called on a generator that is already running or has
    /// already stopped. A generator runs at most one lifecycle.
    #[error("generator has already been started")]
    AlreadyStarted,

    /// The generator has shut down and its queue is drained.
    #[error("generator has stopped")]
    Stopped,

    /// The producer task for an epoch panicked or was aborted.
    #[error("producer failed: {context}")]
    ProducerFailed { context: String },
}

/// The individual construction rules behind [`Error::InvalidConfiguration`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("buffer size must be at least 1")]
    ZeroBufferSize,

    #[error("buffer size {buffer_size} exceeds the queue limit of {max}")]
    BufferTooLarge { buffer_size: usize, max: usize },

    #[error("rotation interval must be at least 1s, got {interval:?}")]
    IntervalTooShort { interval: Duration },

    #[error("prefix format {pattern:?} is missing the {component} component")]
    MissingCalendarComponent {
        pattern: String,
        component: &'static str,
    },

    #[error("base must lie in [2, 36], got {base}")]
    BaseOutOfRange { base: u32 },

    #[error("max sequence must be at least 1")]
    ZeroMaxSequence,

    #[error("jitter max step must be at least 1")]
    ZeroJitterStep,
}
