use crate::{ConfigError, Error, PrefixEncoder, Result};
use core::time::Duration;

/// Shortest rotation interval a generator accepts.
pub const MIN_ROTATION_INTERVAL: Duration = Duration::from_secs(1);

/// Queue capacity used by the presets.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Largest queue capacity the underlying channel can hold.
pub const MAX_BUFFER_SIZE: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Rotation interval used by the presets.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default per-epoch counter ceiling. Reaching it forces a rotation.
pub const DEFAULT_MAX_SEQUENCE: u64 = i64::MAX as u64;

/// Calendar pattern used by [`Options::date`].
pub const DATE_PREFIX_FORMAT: &str = "YYYYMMDDhhmmss-";

/// Randomised rotation timing and counter stepping.
///
/// Jitter desynchronises independent generator instances that were started at
/// the same moment. With jitter, each epoch draws:
///
/// - its lifetime uniformly from `[MIN_ROTATION_INTERVAL, rotation_interval]`
/// - its counter step uniformly from `[1, max_step]`
///
/// Counter values stay strictly increasing within an epoch regardless of the
/// step drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Jitter {
    /// Largest counter step an epoch may draw. Must be at least 1.
    pub max_step: u64,
    /// Fixed RNG seed for reproducible draws. `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// What blocked and future callers observe once the generator has stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Values already queued are still handed out; after that every accessor
    /// returns [`Error::Stopped`].
    #[default]
    Close,
    /// Values already queued are still handed out; after that accessors wait
    /// forever.
    Block,
}

/// Named construction options for a [`crate::Generator`].
///
/// Options are plain data; nothing is checked until they are converted into a
/// [`GeneratorConfig`] (which [`crate::Generator::new`] does for you).
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use epochid::{GeneratorConfig, Options};
///
/// let options = Options {
///     buffer_size: 10,
///     rotation_interval: Duration::from_secs(1),
///     ..Options::string()
/// };
/// assert!(GeneratorConfig::try_from(options).is_ok());
///
/// let bad = Options { base: 37, ..Options::number() };
/// assert!(GeneratorConfig::try_from(bad).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Capacity of the identifier queue, in `[1, MAX_BUFFER_SIZE]`.
    pub buffer_size: usize,
    /// Longest lifetime of one epoch. Must be at least one second.
    pub rotation_interval: Duration,
    /// Calendar pattern for the prefix, or empty to encode the raw Unix
    /// timestamp in `base`.
    pub prefix_format: String,
    /// Radix for the timestamp prefix and the counter suffix, in `[2, 36]`.
    pub base: u32,
    /// Highest counter value issued in one epoch.
    pub max_sequence: u64,
    /// Optional randomisation of epoch lifetime and counter step.
    pub jitter: Option<Jitter>,
    /// Behaviour of accessors after shutdown.
    pub shutdown: ShutdownMode,
}

impl Default for Options {
    fn default() -> Self {
        Self::string()
    }
}

impl Options {
    fn preset(prefix_format: &str, base: u32) -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            rotation_interval: DEFAULT_ROTATION_INTERVAL,
            prefix_format: prefix_format.to_owned(),
            base,
            max_sequence: DEFAULT_MAX_SEQUENCE,
            jitter: None,
            shutdown: ShutdownMode::Close,
        }
    }

    /// Base-36 timestamp prefix, e.g. `p4k5f81`.
    pub fn string() -> Self {
        Self::preset("", 36)
    }

    /// Decimal timestamp prefix, e.g. `15193130121`.
    pub fn number() -> Self {
        Self::preset("", 10)
    }

    /// Calendar prefix with decimal counter, e.g. `20180222232332-1`.
    pub fn date() -> Self {
        Self::preset(DATE_PREFIX_FORMAT, 10)
    }
}

/// Validated, immutable generator configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    buffer_size: usize,
    rotation_interval: Duration,
    prefix: PrefixEncoder,
    base: u32,
    max_sequence: u64,
    jitter: Option<Jitter>,
    shutdown: ShutdownMode,
}

impl TryFrom<Options> for GeneratorConfig {
    type Error = Error;

    fn try_from(options: Options) -> Result<Self> {
        if options.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize.into());
        }

        if options.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::BufferTooLarge {
                buffer_size: options.buffer_size,
                max: MAX_BUFFER_SIZE,
            }
            .into());
        }

        if options.rotation_interval < MIN_ROTATION_INTERVAL {
            return Err(ConfigError::IntervalTooShort {
                interval: options.rotation_interval,
            }
            .into());
        }

        if options.max_sequence == 0 {
            return Err(ConfigError::ZeroMaxSequence.into());
        }

        if options.jitter.is_some_and(|jitter| jitter.max_step == 0) {
            return Err(ConfigError::ZeroJitterStep.into());
        }

        let prefix = PrefixEncoder::new(&options.prefix_format, options.base)?;

        Ok(Self {
            buffer_size: options.buffer_size,
            rotation_interval: options.rotation_interval,
            prefix,
            base: options.base,
            max_sequence: options.max_sequence,
            jitter: options.jitter,
            shutdown: options.shutdown,
        })
    }
}

impl GeneratorConfig {
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub const fn rotation_interval(&self) -> Duration {
        self.rotation_interval
    }

    pub const fn prefix(&self) -> &PrefixEncoder {
        &self.prefix
    }

    pub const fn base(&self) -> u32 {
        self.base
    }

    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    pub const fn jitter(&self) -> Option<Jitter> {
        self.jitter
    }

    pub const fn shutdown(&self) -> ShutdownMode {
        self.shutdown
    }
}
