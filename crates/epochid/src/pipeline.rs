//! The per-epoch producer task.
//!
//! Exactly one producer runs at a time. It exclusively owns its [`Epoch`] and
//! publishes fully rendered identifiers through the bounded queue, so callers
//! never see a prefix from one epoch paired with a counter from another.

use crate::{CounterStatus, epoch::Epoch, push_radix, stats::Stats};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Why a producer returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProducerExit {
    /// The counter reached its ceiling; the epoch must rotate.
    Exhausted,
    /// The scheduler cancelled this epoch.
    Cancelled,
    /// Every receiver is gone; nothing can consume further values.
    Closed,
}

/// Fills the queue with identifiers for one epoch until the counter is
/// exhausted, `cancel` fires, or the queue is closed.
///
/// A queue slot is reserved *before* the counter is advanced and the value is
/// rendered. While the queue is full the task is parked in `reserve`, so a
/// slow consumer throttles production instead of causing buffering or
/// spinning. Cancellation while parked drops the reservation without having
/// consumed a counter value.
///
/// # Arguments
///
/// - `epoch`: The epoch being served, moved in; dropped when the task ends.
/// - `base`: Radix for the counter suffix.
/// - `tx`: Producer side of the shared identifier queue.
/// - `cancel`: Child token cancelled by the scheduler at rotation or shutdown.
/// - `stats`: Shared counters; `produced` is bumped per enqueued value.
pub(crate) async fn produce(
    epoch: Epoch,
    base: u32,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
    stats: Arc<Stats>,
) -> ProducerExit {
    let Epoch {
        number: _number,
        prefix,
        mut counter,
    } = epoch;

    #[cfg(feature = "tracing")]
    tracing::trace!("Producer for epoch {_number} started with prefix {prefix:?}");

    let exit = loop {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => break ProducerExit::Cancelled,
            permit = tx.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => break ProducerExit::Closed,
            },
        };

        let CounterStatus::Ready { value } = counter.next_value() else {
            break ProducerExit::Exhausted;
        };

        let mut id = String::with_capacity(prefix.len() + 13);
        id.push_str(&prefix);
        push_radix(&mut id, value, base);

        permit.send(id);
        stats.record_produced();
    };

    #[cfg(feature = "tracing")]
    tracing::trace!("Producer for epoch {_number} exited: {exit:?}");

    exit
}
