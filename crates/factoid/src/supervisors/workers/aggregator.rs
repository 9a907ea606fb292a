//! 🎬 *[a channel fills with facts. somewhere, an aggregator waits.]*
//!
//! 🗑️ The Aggregator — patient, tireless, and deeply unbothered by the chaos
//! happening upstream. It receives facts. It appends facts. It asks no questions.
//! It stops when the channel says closed, and not one moment before.

use async_channel::Receiver;
use tracing::debug;

use crate::common::{Fact, FactCollection};
use crate::progress::ProgressMetrics;

/// 🪣 Drains the fan-in channel into one arrival-ordered collection.
#[derive(Debug)]
pub(crate) struct Aggregator {
    rx: Receiver<Fact>,
    progress: ProgressMetrics,
}

impl Aggregator {
    pub(crate) fn new(rx: Receiver<Fact>, progress: ProgressMetrics) -> Self {
        Self { rx, progress }
    }

    /// 📥 Loop on `recv` until it reports closed-and-drained.
    ///
    /// No count, no timeout. How many facts show up is not our business,
    /// only whether more ever could.
    pub(crate) async fn drain(mut self) -> FactCollection {
        let mut collection = FactCollection::with_capacity(self.rx.capacity().unwrap_or_default());
        debug!("📥 Aggregator started draining channel...");
        while let Ok(fact) = self.rx.recv().await {
            self.progress.record_arrival(&fact);
            collection.push(fact);
        }
        debug!(
            "🏁 Aggregator: channel closed after {} facts. Shutting down.",
            collection.len()
        );
        self.progress.finish();
        collection
    }
}
