use crate::{
    Error, Generator, Lifecycle, Options, ShutdownMode, SystemClock, TimeSource,
};
use chrono::{DateTime, TimeZone, Utc};
use core::time::Duration;
use portable_atomic::{AtomicI64, Ordering};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Advances one second per reading, so every epoch gets a fresh prefix
/// without waiting on the wall clock.
struct SteppingClock(AtomicI64);

impl SteppingClock {
    fn starting_at(secs: i64) -> Self {
        Self(AtomicI64::new(secs))
    }
}

impl TimeSource for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.0.fetch_add(1, Ordering::Relaxed);
        Utc.timestamp_opt(secs, 0).unwrap()
    }
}

/// Never leaves one instant.
struct FrozenClock;

impl TimeSource for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }
}

struct Running<C> {
    generator: Arc<Generator<C>>,
    shutdown: CancellationToken,
    handle: JoinHandle<crate::Result<()>>,
}

impl<C> Running<C>
where
    C: TimeSource + Send + Sync + 'static,
{
    fn start(generator: Generator<C>) -> Self {
        let generator = Arc::new(generator);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let generator = Arc::clone(&generator);
            let shutdown = shutdown.clone();
            async move { generator.start_until_cancelled(shutdown).await }
        });
        Self {
            generator,
            shutdown,
            handle,
        }
    }

    async fn stop(self) -> Arc<Generator<C>> {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
        self.generator
    }
}

fn assert_all_unique(ids: &[String]) {
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate identifiers issued");
}

async fn run_concurrent_consumers<C>(
    generator: &Arc<Generator<C>>,
    consumers: usize,
    per_consumer: usize,
) -> Vec<String>
where
    C: TimeSource + Send + Sync + 'static,
{
    let tasks = (0..consumers).map(|_| {
        let generator = Arc::clone(generator);
        tokio::spawn(async move {
            let mut ids = Vec::with_capacity(per_consumer);
            for _ in 0..per_consumer {
                ids.push(generator.next().await.unwrap());
            }
            ids
        })
    });

    futures::future::join_all(tasks)
        .await
        .into_iter()
        .flat_map(Result::unwrap)
        .collect()
}

#[tokio::test]
async fn sequential_ids_within_one_epoch_count_up_from_one() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 10,
            rotation_interval: Duration::from_secs(60),
            ..Options::number()
        })
        .unwrap(),
    );

    let mut ids = Vec::new();
    for _ in 0..500 {
        ids.push(running.generator.next().await.unwrap());
    }
    running.stop().await;

    assert_all_unique(&ids);
    let prefix = ids[0].strip_suffix('1').unwrap();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(*id, format!("{prefix}{}", i + 1));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spaced_requests_across_timer_rotation() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 10,
            rotation_interval: Duration::from_secs(1),
            prefix_format: String::new(),
            base: 36,
            ..Options::string()
        })
        .unwrap(),
    );

    sleep(Duration::from_millis(50)).await;

    let shape = Regex::new("^[0-9a-z]+$").unwrap();
    let mut ids = Vec::with_capacity(100);
    for _ in 0..100 {
        let id = running.generator.next().await.unwrap();
        assert!(!id.is_empty());
        assert!(shape.is_match(&id), "unexpected identifier {id:?}");
        ids.push(id);
        sleep(Duration::from_millis(20)).await;
    }

    let generator = running.stop().await;
    assert_all_unique(&ids);
    assert!(
        generator.stats().timer_rotations >= 1,
        "{:?}",
        generator.stats()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_concurrent_callers_get_a_thousand_distinct_ids() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 10,
            rotation_interval: Duration::from_secs(1),
            ..Options::string()
        })
        .unwrap(),
    );

    let ids = run_concurrent_consumers(&running.generator, 50, 20).await;
    running.stop().await;

    assert_eq!(ids.len(), 1000);
    assert_all_unique(&ids);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn prefix_and_counter_stay_paired_under_rapid_exhaustion() {
    const MAX_SEQUENCE: u64 = 7;

    let running = Running::start(
        Generator::with_clock(
            Options {
                buffer_size: 4,
                max_sequence: MAX_SEQUENCE,
                ..Options::number()
            },
            SteppingClock::starting_at(1_000_000),
        )
        .unwrap(),
    );

    let ids = run_concurrent_consumers(&running.generator, 16, 50).await;
    let generator = running.stop().await;

    assert_eq!(ids.len(), 800);
    assert_all_unique(&ids);

    // Every identifier is a 7-digit epoch prefix followed by one counter
    // digit that the epoch could legitimately have issued.
    for id in &ids {
        assert_eq!(id.len(), 8, "{id}");
        let (prefix, counter) = id.split_at(7);
        assert!(prefix.parse::<u64>().unwrap() >= 1_000_000);
        let counter: u64 = counter.parse().unwrap();
        assert!((1..=MAX_SEQUENCE).contains(&counter), "{id}");
    }

    let stats = generator.stats();
    assert!(stats.exhaustion_rotations >= 100, "{stats:?}");
    // Shutdown may land either before or after the last epoch opened.
    assert!(stats.epochs - stats.rotations() <= 1, "{stats:?}");
}

#[tokio::test]
async fn exhaustion_within_the_same_second_waits_for_a_fresh_prefix() {
    let running = Running::start(
        Generator::with_clock(
            Options {
                buffer_size: 8,
                max_sequence: 3,
                ..Options::number()
            },
            FrozenClock,
        )
        .unwrap(),
    );

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(running.generator.next().await.unwrap());
    }
    assert_eq!(ids, ["17000000001", "17000000002", "17000000003"]);

    // Reusing the prefix would restart the counter at 1 and duplicate the
    // first identifier, so the generator stalls instead.
    assert!(
        timeout(Duration::from_millis(300), running.generator.next())
            .await
            .is_err()
    );

    let generator = running.stop().await;
    assert_eq!(generator.stats().epochs, 1);
}

#[tokio::test]
async fn next_before_start_blocks() {
    let generator = Generator::new(Options::string()).unwrap();
    assert_eq!(generator.lifecycle(), Lifecycle::Configured);
    assert!(
        timeout(Duration::from_millis(100), generator.next())
            .await
            .is_err()
    );
    assert_eq!(generator.stats().produced, 0);
}

#[tokio::test]
async fn start_returns_the_shutdown_reason() {
    let generator = Generator::new(Options {
        buffer_size: 4,
        ..Options::date()
    })
    .unwrap();

    let reason = generator
        .start(async {
            sleep(Duration::from_millis(20)).await;
            "maintenance"
        })
        .await
        .unwrap();

    assert_eq!(reason, "maintenance");
    assert_eq!(generator.lifecycle(), Lifecycle::Stopped);
}

#[tokio::test]
async fn dropping_the_start_future_stops_the_generator() {
    let generator = Generator::new(Options {
        buffer_size: 4,
        ..Options::string()
    })
    .unwrap();

    let abandoned = timeout(
        Duration::from_millis(50),
        generator.start(std::future::pending::<()>()),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(generator.lifecycle(), Lifecycle::Stopped);

    // Production halted with the future, so the queue only drains.
    let produced = generator.stats().produced;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(generator.stats().produced, produced);
    assert_eq!(generator.start(async {}).await, Err(Error::AlreadyStarted));
}

#[tokio::test]
async fn a_generator_starts_only_once() {
    let running = Running::start(Generator::new(Options::string()).unwrap());
    running.generator.next().await.unwrap();
    assert_eq!(running.generator.lifecycle(), Lifecycle::Running);

    assert_eq!(
        running.generator.start(async {}).await,
        Err(Error::AlreadyStarted)
    );

    let generator = running.stop().await;
    assert_eq!(generator.start(async {}).await, Err(Error::AlreadyStarted));
}

#[tokio::test]
async fn close_mode_drains_then_reports_stopped() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 5,
            ..Options::string()
        })
        .unwrap(),
    );
    let before = running.generator.next().await.unwrap();
    let generator = running.stop().await;
    let produced = generator.stats().produced;

    let mut drained = vec![before];
    loop {
        match generator.next().await {
            Ok(id) => drained.push(id),
            Err(err) => {
                assert_eq!(err, Error::Stopped);
                break;
            }
        }
    }

    assert!(drained.len() <= 1 + 5);
    assert_eq!(drained.len() as u64, produced);
    assert_all_unique(&drained);
    assert_eq!(generator.next().await, Err(Error::Stopped));
    assert_eq!(generator.stats().produced, produced);
}

#[tokio::test]
async fn block_mode_waits_after_drain() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 2,
            shutdown: ShutdownMode::Block,
            ..Options::string()
        })
        .unwrap(),
    );
    running.generator.next().await.unwrap();
    let generator = running.stop().await;

    while generator.queued() > 0 {
        generator.next().await.unwrap();
    }
    assert!(
        timeout(Duration::from_millis(100), generator.next())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn slow_consumer_throttles_the_producer() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 1,
            rotation_interval: Duration::from_secs(60),
            ..Options::string()
        })
        .unwrap(),
    );
    let generator = &running.generator;

    // With nobody pulling, the producer fills the single slot and parks.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(generator.queued(), 1);
    assert_eq!(generator.stats().produced, 1);

    for _ in 0..10 {
        generator.next().await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert!(generator.queued() <= 1);
        let stats = generator.stats();
        assert!(
            stats.produced <= stats.delivered + 1,
            "producer ran ahead of the queue: {stats:?}"
        );
    }

    running.stop().await;
}

#[tokio::test]
async fn queued_is_visible_while_a_caller_holds_the_receiver() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 4,
            ..Options::string()
        })
        .unwrap(),
    );
    let generator = &running.generator;
    sleep(Duration::from_millis(200)).await;

    // Stands in for a consumer parked inside `next`.
    let held = generator.receiver.lock().await;
    assert_eq!(generator.queued(), 4);
    drop(held);

    generator.next().await.unwrap();
    assert!(generator.queued() <= 4);

    running.stop().await;
}

#[tokio::test]
async fn date_preset_shape_and_bytes_view() {
    let running = Running::start(
        Generator::new(Options {
            buffer_size: 4,
            ..Options::date()
        })
        .unwrap(),
    );

    let shape = Regex::new("^[0-9]{14}-[0-9]+$").unwrap();
    let text = running.generator.next().await.unwrap();
    let bytes = running.generator.next_bytes().await.unwrap();
    running.stop().await;

    assert!(shape.is_match(&text), "{text}");
    let bytes = core::str::from_utf8(&bytes).unwrap();
    assert!(shape.is_match(bytes), "{bytes}");
    assert_ne!(text, bytes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_next_from_a_sync_thread() {
    let running = Running::start(Generator::new(Options::number()).unwrap());

    let generator = Arc::clone(&running.generator);
    let ids = tokio::task::spawn_blocking(move || {
        (0..10)
            .map(|_| generator.blocking_next().unwrap())
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();
    running.stop().await;

    assert_eq!(ids.len(), 10);
    assert_all_unique(&ids);
}

#[test]
fn invalid_options_build_nothing() {
    let err = Generator::<SystemClock>::new(Options {
        prefix_format: "YYYY-MM-DD".into(),
        ..Options::date()
    })
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));

    assert!(
        Generator::new(Options {
            prefix_format: "YYYYMMDDhhmmss".into(),
            ..Options::date()
        })
        .is_ok()
    );
}
