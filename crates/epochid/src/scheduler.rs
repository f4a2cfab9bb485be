//! Epoch rotation.
//!
//! [`RotationScheduler::run`] is the only place epochs are opened or closed.
//! Both rotation triggers (interval elapsed, counter exhausted) are observed
//! by the same loop iteration, and the outgoing producer is always joined
//! before the next one is spawned, so at most one producer exists at any
//! instant and no two epochs overlap.

use crate::{
    Error, GeneratorConfig, Result, RotationTrigger, TimeSource,
    epoch::{Epoch, EpochPlanner},
    pipeline::{ProducerExit, produce},
    stats::Stats,
};
use std::sync::Arc;
use tokio::{sync::mpsc, time::sleep};
use tokio_util::sync::CancellationToken;

pub(crate) struct RotationScheduler<'a, C> {
    config: &'a GeneratorConfig,
    clock: &'a C,
    planner: EpochPlanner,
    stats: Arc<Stats>,
}

impl<'a, C: TimeSource> RotationScheduler<'a, C> {
    pub fn new(config: &'a GeneratorConfig, clock: &'a C, stats: Arc<Stats>) -> Self {
        Self {
            config,
            clock,
            planner: EpochPlanner::new(config),
            stats,
        }
    }

    /// Runs epochs back to back until `shutdown` is cancelled or the queue is
    /// closed.
    ///
    /// Each iteration:
    ///
    /// 1. waits for a wall-clock second later than the previous epoch's and
    ///    opens a new epoch there (prefix rendered, counter reset to 1)
    /// 2. spawns that epoch's producer with a child cancellation token
    /// 3. waits for the epoch lifetime, producer exhaustion, or shutdown
    /// 4. cancels and joins the producer before looping
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProducerFailed`] if a producer task panics.
    pub async fn run(mut self, tx: mpsc::Sender<String>, shutdown: CancellationToken) -> Result<()> {
        let base = self.config.base();

        while let Some(epoch) = self.next_epoch(&shutdown).await {
            let lifetime = self.planner.lifetime();
            self.stats.record_epoch();

            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Opened epoch {} with prefix {:?}, step {}, lifetime {:?}",
                epoch.number,
                epoch.prefix,
                epoch.counter.step(),
                lifetime
            );

            let cancel = shutdown.child_token();
            let mut producer = tokio::spawn(produce(
                epoch,
                base,
                tx.clone(),
                cancel.clone(),
                self.stats.clone(),
            ));

            let (timer_fired, joined) = tokio::select! {
                biased;
                () = shutdown.cancelled() => (false, None),
                joined = &mut producer => (false, Some(joined)),
                () = sleep(lifetime) => (true, None),
            };

            cancel.cancel();
            let joined = match joined {
                Some(joined) => joined,
                None => producer.await,
            };
            let exit = joined.map_err(|e| {
                #[cfg(feature = "tracing")]
                tracing::error!("Producer task failed: {e}");
                Error::ProducerFailed {
                    context: e.to_string(),
                }
            })?;

            if shutdown.is_cancelled() {
                break;
            }

            let trigger = match exit {
                ProducerExit::Closed => break,
                _ if timer_fired => RotationTrigger::Timer,
                _ => RotationTrigger::Exhausted,
            };

            self.stats.record_rotation(trigger);

            #[cfg(feature = "tracing")]
            tracing::debug!("Rotating epoch: {}", trigger.as_str());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Rotation scheduler stopped");

        Ok(())
    }

    /// Opens the next epoch, sleeping first if the clock has not yet left the
    /// previous epoch's second. Returns `None` if shutdown fires while
    /// waiting.
    async fn next_epoch(&mut self, shutdown: &CancellationToken) -> Option<Epoch> {
        loop {
            if shutdown.is_cancelled() {
                return None;
            }

            let now = self.clock.now();
            let wait = self.planner.wait_for_fresh_second(&now);
            if wait.is_zero() {
                let prefix = self.config.prefix().render(&now);
                return Some(self.planner.open(&now, prefix));
            }

            #[cfg(feature = "tracing")]
            tracing::trace!("Clock still in previous epoch's second, waiting {wait:?}");

            tokio::select! {
                biased;
                () = shutdown.cancelled() => return None,
                () = sleep(wait) => {}
            }
        }
    }
}
