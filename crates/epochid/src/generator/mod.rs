//! The externally visible identifier generator.
//!
//! A [`Generator`] owns the bounded identifier queue. Calling
//! [`Generator::start`] drives the rotation scheduler (and through it one
//! producer per epoch) until the supplied shutdown future resolves; any number
//! of tasks may concurrently pull identifiers with [`Generator::next`].
//!
//! # Example
//!
//! ```
//! use epochid::{Generator, Options};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> epochid::Result<()> {
//! let generator = Arc::new(Generator::new(Options::string())?);
//! let shutdown = CancellationToken::new();
//!
//! let running = tokio::spawn({
//!     let generator = Arc::clone(&generator);
//!     let shutdown = shutdown.clone();
//!     async move { generator.start_until_cancelled(shutdown).await }
//! });
//!
//! let a = generator.next().await?;
//! let b = generator.next().await?;
//! assert_ne!(a, b);
//!
//! shutdown.cancel();
//! running.await.unwrap()?;
//! # Ok(())
//! # }
//! ```

use crate::{
    Error, GeneratorConfig, Options, Result, ShutdownMode, StatsSnapshot, SystemClock,
    TimeSource, scheduler::RotationScheduler, stats::Stats,
};
use bytes::Bytes;
use core::pin::pin;
use parking_lot::Mutex;
use portable_atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod tests;

/// Where a generator is in its single start/stop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Lifecycle {
    /// Constructed; nothing is being produced yet.
    Configured = 0,
    /// [`Generator::start`] is running.
    Running = 1,
    /// The shutdown signal fired (or the scheduler failed). Nothing further
    /// is produced.
    Stopped = 2,
}

impl Lifecycle {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Configured,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// A time-prefixed, sequence-suffixed unique identifier generator.
///
/// Identifiers look like `<prefix><counter>` where the prefix is derived from
/// the wall clock once per epoch and the counter restarts at 1 in every
/// epoch. Every identifier handed out over the generator's lifetime is
/// distinct.
///
/// The generator is meant to be shared (typically behind an [`Arc`]): one task
/// runs [`Generator::start`] while others call [`Generator::next`].
///
/// # Caller hazard
///
/// Calling [`Generator::next`] on a generator that was never started waits
/// forever. This is not an error; start the generator first.
#[derive(Debug)]
pub struct Generator<C = SystemClock> {
    config: GeneratorConfig,
    clock: C,
    stats: Arc<Stats>,
    lifecycle: AtomicU8,
    /// Taken by `start`; its presence also keeps the queue open (and `next`
    /// blocking) before the generator is started.
    sender: Mutex<Option<mpsc::Sender<String>>>,
    /// Held forever under [`ShutdownMode::Block`] so the queue never closes.
    parked: Mutex<Option<mpsc::Sender<String>>>,
    receiver: AsyncMutex<mpsc::Receiver<String>>,
}

impl Generator<SystemClock> {
    /// Validates `options` and builds a generator on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if any option is out of range.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_clock(options, SystemClock)
    }
}

impl<C> Generator<C>
where
    C: TimeSource,
{
    /// Validates `options` and builds a generator that reads time from
    /// `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if any option is out of range.
    pub fn with_clock(options: Options, clock: C) -> Result<Self> {
        GeneratorConfig::try_from(options).map(|config| Self::from_config(config, clock))
    }

    /// Builds a generator from an already validated configuration.
    pub fn from_config(config: GeneratorConfig, clock: C) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer_size());
        Self {
            config,
            clock,
            stats: Arc::new(Stats::default()),
            lifecycle: AtomicU8::new(Lifecycle::Configured as u8),
            sender: Mutex::new(Some(tx)),
            parked: Mutex::new(None),
            receiver: AsyncMutex::new(rx),
        }
    }

    /// Runs the generator until `shutdown` resolves, then stops the rotation
    /// scheduler and the active producer and returns `shutdown`'s output as
    /// the terminal reason.
    ///
    /// Identifiers already queued when shutdown fires stay available to
    /// [`Generator::next`]. What happens once they are drained depends on
    /// [`ShutdownMode`].
    ///
    /// Dropping the returned future before it completes also stops
    /// production.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyStarted`] if this generator was started before.
    /// - [`Error::ProducerFailed`] if an epoch's producer task panicked.
    pub async fn start<S, R>(&self, shutdown: S) -> Result<R>
    where
        S: Future<Output = R>,
    {
        let tx = self.sender.lock().take().ok_or(Error::AlreadyStarted)?;
        if self.config.shutdown() == ShutdownMode::Block {
            *self.parked.lock() = Some(tx.clone());
        }
        self.set_lifecycle(Lifecycle::Running);
        // Marks the generator stopped on every exit, including a dropped
        // future.
        let _stopped_on_exit = LifecycleGuard(&self.lifecycle);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Generator started (buffer {}, rotation {:?})",
            self.config.buffer_size(),
            self.config.rotation_interval()
        );

        let stop = CancellationToken::new();
        let _stop_on_drop = stop.clone().drop_guard();

        let scheduler = RotationScheduler::new(&self.config, &self.clock, Arc::clone(&self.stats));
        let mut run = pin!(scheduler.run(tx, stop.clone()));

        let finished = tokio::select! {
            reason = shutdown => Ok(reason),
            result = &mut run => Err(result),
        };

        let outcome = match finished {
            Ok(reason) => {
                stop.cancel();
                run.await.map(|()| reason)
            }
            // The scheduler only returns on its own if a producer failed.
            Err(result) => result.and(Err(Error::Stopped)),
        };

        #[cfg(feature = "tracing")]
        {
            match &outcome {
                Ok(_) => tracing::info!("Generator stopped"),
                Err(e) => tracing::error!("Generator stopped with error: {e}"),
            }
        }

        outcome
    }

    /// [`Generator::start`] with a [`CancellationToken`] as the lifetime
    /// signal.
    ///
    /// # Errors
    ///
    /// See [`Generator::start`].
    pub async fn start_until_cancelled(&self, token: CancellationToken) -> Result<()> {
        self.start(token.cancelled()).await
    }

    /// Waits for and returns the next identifier.
    ///
    /// Cancel safe: if the returned future is dropped before completing, no
    /// identifier is lost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stopped`] once the generator has shut down under
    /// [`ShutdownMode::Close`] and every queued identifier has been handed
    /// out.
    pub async fn next(&self) -> Result<String> {
        let id = self
            .receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or(Error::Stopped)?;
        self.stats.record_delivered();
        Ok(id)
    }

    /// Byte view of [`Generator::next`].
    ///
    /// # Errors
    ///
    /// See [`Generator::next`].
    pub async fn next_bytes(&self) -> Result<Bytes> {
        self.next().await.map(Bytes::from)
    }

    /// Blocking form of [`Generator::next`] for synchronous callers.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; use
    /// [`Generator::next`] there, or wrap the call in
    /// `tokio::task::spawn_blocking`.
    ///
    /// # Errors
    ///
    /// See [`Generator::next`].
    pub fn blocking_next(&self) -> Result<String> {
        let id = self
            .receiver
            .blocking_lock()
            .blocking_recv()
            .ok_or(Error::Stopped)?;
        self.stats.record_delivered();
        Ok(id)
    }

    /// Number of identifiers currently waiting in the queue. Never exceeds
    /// the configured buffer size.
    ///
    /// Derived from the produced and delivered counters rather than the
    /// receiver, so it stays readable while callers are parked in
    /// [`Generator::next`]. An identifier in the middle of a hand-off may be
    /// counted on either side.
    pub fn queued(&self) -> usize {
        let StatsSnapshot {
            produced,
            delivered,
            ..
        } = self.stats.snapshot();
        usize::try_from(produced.saturating_sub(delivered))
            .unwrap_or(usize::MAX)
            .min(self.config.buffer_size())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle as u8, Ordering::Release);
    }
}

/// Stores [`Lifecycle::Stopped`] when dropped.
struct LifecycleGuard<'a>(&'a AtomicU8);

impl Drop for LifecycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(Lifecycle::Stopped as u8, Ordering::Release);
    }
}
