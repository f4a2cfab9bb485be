mod cli;

use clap::Parser;
use cli::config::{CliArgs, CliConfig};
use cli::telemetry::init_telemetry;
use epochid::{Generator, SystemClock};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Why the generator was asked to stop.
#[derive(Debug, Clone, Copy)]
enum StopReason {
    Finished,
    Interrupt,
    Terminate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry(config.log_format)?;
    log_startup_info(&config);

    let generator = Arc::new(Generator::from_config(
        config.generator.clone(),
        SystemClock,
    ));
    let shutdown = CancellationToken::new();

    let lifecycle = tokio::spawn({
        let generator = Arc::clone(&generator);
        let shutdown = shutdown.clone();
        async move { generator.start(shutdown_signal(shutdown)).await }
    });

    let printed = print_ids(&generator, &config, &shutdown).await;
    shutdown.cancel();

    let reason = lifecycle.await??;
    tracing::info!(
        "Stopped ({reason:?}) after printing {} identifiers",
        printed.as_ref().copied().unwrap_or_default()
    );
    printed.map(|_| ())
}

fn log_startup_info(config: &CliConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting generator with full config: {:#?}", config);
    } else {
        tracing::debug!(
            "Starting generator with buffer {} and rotation {:?}",
            config.generator.buffer_size(),
            config.generator.rotation_interval()
        );
    }
}

/// Writes identifiers to stdout until `count` is reached or `shutdown` fires.
async fn print_ids(
    generator: &Generator,
    config: &CliConfig,
    shutdown: &CancellationToken,
) -> anyhow::Result<u64> {
    let mut out = BufWriter::new(tokio::io::stdout());
    let mut printed = 0;

    while config.count.is_none_or(|count| printed < count) {
        let id = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            id = generator.next() => id?,
        };

        out.write_all(id.as_bytes()).await?;
        out.write_all(b"\n").await?;
        printed += 1;

        if !config.interval.is_zero() {
            out.flush().await?;
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(config.interval) => {}
            }
        }
    }

    out.flush().await?;
    Ok(printed)
}

/// Resolves on Ctrl+C, SIGTERM, or when `done` is cancelled by the printer,
/// and cancels `done` so the printer also stops on a signal.
async fn shutdown_signal(done: CancellationToken) -> StopReason {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    let reason = tokio::select! {
        () = done.cancelled() => StopReason::Finished,
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
            StopReason::Interrupt
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
            StopReason::Terminate
        },
    };

    done.cancel();
    reason
}
