//! 🎬 "In a world where fetches finish in any order..."
//! 🎬 "One supervisor dared to know when they were ALL done."
//!
//! 📦 The Supervisor module — the fan-out/fan-in coordinator.
//!
//! ⚠️ DO NOT MAKE THE WORKERS PUB. They are the supervisor's private little minions.
//!
//! The run, start to finish:
//! 1. one bounded channel, capacity ≥ width, so no worker's send ever waits on the reader
//! 2. one [`CompletionLatch`], with a guard registered per worker before any of them spawn
//! 3. N [`FetchWorker`]s, each holding a send-only [`FactSender`] and its guard
//! 4. one completion watcher: waits for the latch, then closes the channel, exactly once
//! 5. the [`Aggregator`] drains on the calling task, concurrently with all of the above
//! 6. join everything, then look at [`FirstFailure`] to decide how the run ended

mod latch;
mod workers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app_config::RuntimeConfig;
use crate::backends::SourceBackend;
use crate::common::FactCollection;
use crate::progress::ProgressMetrics;
use latch::CompletionLatch;
use workers::{Aggregator, FactSender, FetchWorker, FirstFailure, Worker};

/// 📦 The Supervisor: the one who knows how many workers went out and waits for all of them to come back.
#[derive(Debug)]
pub(crate) struct Supervisor {
    runtime: RuntimeConfig,
}

impl Supervisor {
    pub(crate) fn new(runtime: RuntimeConfig) -> Self {
        Self { runtime }
    }

    /// 🧵 Fan out `runtime.width` fetches, fan the results back in.
    ///
    /// ✅ Every fetch succeeded → the collection, in arrival order, exactly `width` long.
    /// 💀 Any fetch failed → the first failure. Peers are cancelled, nothing is returned.
    pub(crate) async fn gather(
        &self,
        source: Arc<SourceBackend>,
        progress: ProgressMetrics,
    ) -> Result<FactCollection> {
        self.runtime.validate()?;
        let width = self.runtime.width;
        let capacity = self.runtime.effective_channel_capacity();
        debug!("🧵 fanning out {} fetches over a channel of {}", width, capacity);

        let (tx, rx) = async_channel::bounded(capacity);
        let latch = CompletionLatch::new();
        let cancel = CancellationToken::new();
        let first_failure = Arc::new(FirstFailure::default());

        let mut handles = Vec::with_capacity(width);
        for worker_id in 0..width {
            let worker = FetchWorker::new(
                worker_id,
                Arc::clone(&source),
                FactSender::new(tx.clone()),
                latch.register(),
                cancel.clone(),
                Arc::clone(&first_failure),
            );
            handles.push(worker.start());
        }

        // 🔒 the watcher owns the last raw Sender, and with it the only right to close
        let watcher = tokio::spawn({
            let latch = latch.clone();
            async move {
                latch.wait().await;
                tx.close();
                debug!("🔒 every fetch worker reported in, channel closed");
            }
        });

        let collection = Aggregator::new(rx, progress).drain().await;

        watcher
            .await
            .context("💀 the completion watcher panicked. The one job was closing a channel.")?;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            // 🧾 worker-level Errs are already in first_failure, only a panic is news here
            if let Err(join_error) = handle.await {
                return Err(anyhow::Error::new(join_error)
                    .context(format!("💀 fetch worker {} panicked", worker_id)));
            }
        }

        if let Some(failure) = first_failure.take() {
            return Err(anyhow::Error::new(failure).context(format!(
                "💀 a fetch failed, so the whole batch of {} is abandoned",
                width
            )));
        }

        info!("✅ gathered {} facts from {} workers", collection.len(), width);
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::in_mem::{InMemorySource, Scripted};
    use crate::common::Fact;
    use crate::errors::{FetchError, find_fetch_error};
    use std::time::{Duration, Instant};

    fn supervisor(width: usize) -> Supervisor {
        Supervisor::new(RuntimeConfig {
            width,
            channel_capacity: None,
        })
    }

    fn scripted(lines: Vec<Scripted>) -> Arc<SourceBackend> {
        Arc::new(SourceBackend::InMemory(InMemorySource::new(lines)))
    }

    fn fact(id: &str) -> Fact {
        Fact::new(id, format!("fact {id}"), "test", "http://test.example")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_one_where_the_fastest_fetch_arrives_first() -> Result<()> {
        let source = scripted(vec![
            Scripted::fact_after(fact("a"), Duration::from_millis(30)),
            Scripted::fact_after(fact("b"), Duration::from_millis(10)),
            Scripted::fact_after(fact("c"), Duration::from_millis(5)),
        ]);

        let collection = supervisor(3).gather(source, ProgressMetrics::hidden(3)).await?;

        assert_eq!(collection.ids(), vec!["c", "b", "a"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_one_where_arrival_order_follows_the_delays_not_the_launch() -> Result<()> {
        // 🧪 launch order is 0..6, delays are reversed, arrival order should be reversed too
        let lines = (0..6)
            .map(|i| {
                Scripted::fact_after(
                    fact(&i.to_string()),
                    Duration::from_millis(15 * (6 - i) as u64),
                )
            })
            .collect();

        let collection = supervisor(6).gather(scripted(lines), ProgressMetrics::hidden(6)).await?;

        assert_eq!(collection.ids(), vec!["5", "4", "3", "2", "1", "0"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn the_one_where_a_hundred_workers_do_not_deadlock() -> Result<()> {
        let lines = (0..100)
            .map(|i| Scripted::fact_after(fact(&i.to_string()), Duration::ZERO))
            .collect();

        let collection = tokio::time::timeout(
            Duration::from_secs(10),
            supervisor(100).gather(scripted(lines), ProgressMetrics::hidden(100)),
        )
        .await
        .context("💀 100 workers should not take 10 seconds, something is stuck")??;

        assert_eq!(collection.len(), 100);
        let mut ids: Vec<usize> = collection
            .ids()
            .iter()
            .map(|id| id.parse::<usize>())
            .collect::<std::result::Result<_, _>>()?;
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_single_worker_still_works_on_one_thread() -> Result<()> {
        // 🧪 current_thread runtime: watcher, worker and aggregator all share one thread
        let source = scripted(vec![Scripted::fact_after(fact("solo"), Duration::from_millis(1))]);
        let collection = supervisor(1).gather(source, ProgressMetrics::hidden(1)).await?;
        assert_eq!(collection.ids(), vec!["solo"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_one_where_one_500_sinks_the_whole_batch() -> Result<()> {
        let source = scripted(vec![
            Scripted::fact_after(fact("ok"), Duration::from_millis(5)),
            Scripted::failure_after(FetchError::Status(500), Duration::from_millis(5)),
        ]);

        let err = supervisor(2)
            .gather(source, ProgressMetrics::hidden(2))
            .await
            .expect_err("💀 one failure must fail the run");

        assert!(matches!(find_fetch_error(&err), Some(FetchError::Status(500))));
        assert!(format!("{:#}", err).contains("500"));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_one_where_the_failure_cancels_slow_peers_instead_of_waiting() -> Result<()> {
        // 🧪 four peers would take 30s each. the failure at 10ms should cut them all short.
        let mut lines = vec![Scripted::failure_after(
            FetchError::Status(503),
            Duration::from_millis(10),
        )];
        lines.extend((0..4).map(|i| {
            Scripted::fact_after(fact(&format!("slow{i}")), Duration::from_secs(30))
        }));

        let started = Instant::now();
        let err = supervisor(5)
            .gather(scripted(lines), ProgressMetrics::hidden(5))
            .await
            .expect_err("💀 the 503 must fail the run");

        assert!(started.elapsed() < Duration::from_secs(5), "💀 peers were not cancelled");
        assert!(matches!(find_fetch_error(&err), Some(FetchError::Status(503))));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_one_where_the_first_of_several_failures_wins() -> Result<()> {
        let source = scripted(vec![
            Scripted::failure_after(FetchError::Exhausted, Duration::from_millis(80)),
            Scripted::failure_after(FetchError::Status(429), Duration::from_millis(1)),
            Scripted::fact_after(fact("late"), Duration::from_millis(80)),
        ]);

        let err = supervisor(3)
            .gather(source, ProgressMetrics::hidden(3))
            .await
            .expect_err("💀 the run has two failures in it");

        assert!(matches!(find_fetch_error(&err), Some(FetchError::Status(429))));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_zero_width_is_refused_up_front() {
        let err = supervisor(0)
            .gather(scripted(vec![]), ProgressMetrics::hidden(0))
            .await
            .expect_err("💀 width 0 must be rejected");
        assert!(format!("{:#}", err).contains("runtime.width"));
    }

    #[tokio::test]
    async fn the_one_where_a_giant_channel_is_refused_before_allocating() {
        let err = Supervisor::new(RuntimeConfig {
            width: 1,
            channel_capacity: Some(1 << 40),
        })
        .gather(scripted(vec![]), ProgressMetrics::hidden(1))
        .await
        .expect_err("💀 a 2^40 capacity must be rejected, not allocated");
        assert!(format!("{:#}", err).contains("runtime.channel_capacity"));
    }
}
