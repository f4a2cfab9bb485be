//! Log setup for the `epochid` binary.
//!
//! Logs always go to stderr so stdout carries nothing but identifiers.
//! Verbosity follows `RUST_LOG` (default `info`); the engine's rotation
//! events appear at `debug`.

use super::config::LogFormat;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    let fmt = match format {
        LogFormat::Pretty => fmt.pretty().with_line_number(true).with_file(true).boxed(),
        LogFormat::Compact => fmt.compact().boxed(),
        LogFormat::Json => fmt.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt)
        .try_init()?;

    Ok(())
}
