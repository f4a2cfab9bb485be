use anyhow::Context;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use epochid::{GeneratorConfig, Jitter, Options};

/// Identifier shape to start from. Individual flags override preset fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Base-36 timestamp prefix, e.g. `p4k5f81`.
    String,
    /// Decimal timestamp prefix, e.g. `15193130121`.
    Number,
    /// Calendar prefix, e.g. `20180222232332-1`.
    Date,
}

/// Log output layout on stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Runtime configuration for the `epochid` binary.
///
/// Every value can be supplied as a flag or an environment variable (a `.env`
/// file in the working directory is honoured). Identifiers are written to
/// stdout, one per line; logs go to stderr.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "epochid",
    version,
    about = "Print short, time-prefixed unique identifiers"
)]
pub struct CliArgs {
    /// Starting option set.
    ///
    /// Environment variable: `EPOCHID_PRESET`
    #[arg(long, env = "EPOCHID_PRESET", value_enum, default_value_t = Preset::String)]
    pub preset: Preset,

    /// Capacity of the pre-rendered identifier queue.
    ///
    /// Environment variable: `EPOCHID_BUFFER_SIZE`
    #[arg(long, env = "EPOCHID_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Longest lifetime of one prefix, in seconds (at least 1).
    ///
    /// Environment variable: `EPOCHID_ROTATION_SECS`
    #[arg(long, env = "EPOCHID_ROTATION_SECS")]
    pub rotation_secs: Option<u64>,

    /// Calendar prefix pattern using `YYYY MM DD hh mm ss`. Pass an empty
    /// string to use the raw timestamp.
    ///
    /// Environment variable: `EPOCHID_PREFIX_FORMAT`
    #[arg(long, env = "EPOCHID_PREFIX_FORMAT")]
    pub prefix_format: Option<String>,

    /// Radix for the timestamp prefix and counter, in [2, 36].
    ///
    /// Environment variable: `EPOCHID_BASE`
    #[arg(long, env = "EPOCHID_BASE")]
    pub base: Option<u32>,

    /// Enable jitter: randomise each prefix's lifetime and draw a counter
    /// step from [1, N].
    ///
    /// Environment variable: `EPOCHID_JITTER_MAX_STEP`
    #[arg(long, env = "EPOCHID_JITTER_MAX_STEP")]
    pub jitter_max_step: Option<u64>,

    /// Seed for jitter draws. Requires `--jitter-max-step`.
    ///
    /// Environment variable: `EPOCHID_JITTER_SEED`
    #[arg(long, env = "EPOCHID_JITTER_SEED", requires = "jitter_max_step")]
    pub jitter_seed: Option<u64>,

    /// Number of identifiers to print. 0 prints until interrupted.
    ///
    /// Environment variable: `EPOCHID_COUNT`
    #[arg(short = 'n', long, env = "EPOCHID_COUNT", default_value_t = 1)]
    pub count: u64,

    /// Pause between identifiers, in milliseconds.
    ///
    /// Environment variable: `EPOCHID_INTERVAL_MS`
    #[arg(long, env = "EPOCHID_INTERVAL_MS", default_value_t = 0)]
    pub interval_ms: u64,

    /// Log layout on stderr. Verbosity is controlled with `RUST_LOG`.
    ///
    /// Environment variable: `EPOCHID_LOG_FORMAT`
    #[arg(long, env = "EPOCHID_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub generator: GeneratorConfig,
    /// `None` prints until interrupted.
    pub count: Option<u64>,
    pub interval: Duration,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mut options = match args.preset {
            Preset::String => Options::string(),
            Preset::Number => Options::number(),
            Preset::Date => Options::date(),
        };

        if let Some(buffer_size) = args.buffer_size {
            options.buffer_size = buffer_size;
        }
        if let Some(secs) = args.rotation_secs {
            options.rotation_interval = Duration::from_secs(secs);
        }
        if let Some(prefix_format) = args.prefix_format {
            options.prefix_format = prefix_format;
        }
        if let Some(base) = args.base {
            options.base = base;
        }
        options.jitter = args.jitter_max_step.map(|max_step| Jitter {
            max_step,
            seed: args.jitter_seed,
        });

        let generator =
            GeneratorConfig::try_from(options).context("rejected generator options")?;

        Ok(Self {
            generator,
            count: (args.count > 0).then_some(args.count),
            interval: Duration::from_millis(args.interval_ms),
            log_format: args.log_format,
        })
    }
}
