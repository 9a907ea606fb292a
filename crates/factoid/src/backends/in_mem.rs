//! # Previously, on factoid...
//!
//! 🎬 The API was down. The train had no Wi-Fi. The demo was in five minutes.
//! Someone needed facts, and they needed them from RAM.
//!
//! `in_mem` provides an in-memory [`Source`] and [`Sink`]. The [`InMemorySource`]
//! works through a script of responses, one per `fetch`, each with its own
//! artificial delay. That's how tests pin down arrival order and inject failures
//! without a network. The [`InMemorySink`] keeps every persisted collection
//! behind an `Arc<Mutex<...>>` so callers can inspect what arrived.
//!
//! ✅ No network calls. No disk I/O. Just vibes and heap memory.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backends::{Sink, Source};
use crate::common::{Fact, FactCollection};
use crate::errors::{FetchError, PersistError};

/// 🔧 Canned facts for offline runs. Every fetch sleeps `delay_ms` first.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct InMemorySourceConfig {
    #[serde(default)]
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub delay_ms: u64,
}

/// 🎬 One line of the script: wait this long, then answer with this.
#[derive(Debug)]
pub(crate) struct Scripted {
    pub(crate) delay: Duration,
    pub(crate) outcome: Result<Fact, FetchError>,
}

impl Scripted {
    pub(crate) fn fact_after(fact: Fact, delay: Duration) -> Self {
        Self {
            delay,
            outcome: Ok(fact),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn failure_after(error: FetchError, delay: Duration) -> Self {
        Self {
            delay,
            outcome: Err(error),
        }
    }
}

/// 📦 A source that reads its lines from a script.
///
/// Each `fetch` pops the next [`Scripted`] entry, sleeps its delay, and returns
/// its outcome. Workers start in no particular order, so which worker gets which
/// entry is up to the scheduler. Arrival order is decided by the delays alone.
///
/// 🪫 An empty script answers `FetchError::Exhausted`.
#[derive(Debug, Default)]
pub(crate) struct InMemorySource {
    script: Mutex<VecDeque<Scripted>>,
}

impl InMemorySource {
    pub(crate) fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub(crate) fn from_config(config: &InMemorySourceConfig) -> Self {
        let delay = Duration::from_millis(config.delay_ms);
        Self::new(
            config
                .facts
                .iter()
                .cloned()
                .map(|fact| Scripted::fact_after(fact, delay)),
        )
    }

    fn next_line(&self) -> Option<Scripted> {
        // 🔒 a poisoned lock only means another fetch panicked mid-pop; the queue itself is fine
        let mut script = match self.script.lock() {
            Ok(script) => script,
            Err(poisoned) => poisoned.into_inner(),
        };
        script.pop_front()
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn fetch(&self) -> Result<Fact, FetchError> {
        let Some(line) = self.next_line() else {
            return Err(FetchError::Exhausted);
        };
        if !line.delay.is_zero() {
            tokio::time::sleep(line.delay).await;
        }
        line.outcome
    }
}

/// 📦 A sink that never forgets.
///
/// Clone-able because tests need to peek inside after handing `self` off to the
/// run. The `Arc` means every clone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemorySink {
    pub(crate) received: Arc<tokio::sync::Mutex<Vec<FactCollection>>>,
}

#[async_trait]
impl Sink for InMemorySink {
    async fn persist(&mut self, collection: &FactCollection) -> Result<(), PersistError> {
        self.received.lock().await.push(collection.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn the_one_where_the_script_is_read_in_order_then_runs_dry() {
        let source = InMemorySource::new([
            Scripted::fact_after(Fact::new("1", "", "", ""), Duration::ZERO),
            Scripted::failure_after(FetchError::Status(502), Duration::ZERO),
        ]);

        let first = source.fetch().await.expect("💀 first line is a fact");
        assert_eq!(first.id, "1");
        assert!(matches!(source.fetch().await, Err(FetchError::Status(502))));
        assert!(matches!(source.fetch().await, Err(FetchError::Exhausted)));
    }

    #[tokio::test]
    async fn the_one_where_config_facts_wait_their_turn() {
        let source = InMemorySource::from_config(&InMemorySourceConfig {
            facts: vec![Fact::new("slow", "", "", "")],
            delay_ms: 20,
        });
        let started = Instant::now();
        let fact = source.fetch().await.expect("💀 one canned fact");
        assert_eq!(fact.id, "slow");
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn the_one_where_every_clone_sees_the_same_pile() {
        let sink = InMemorySink::default();
        let mut handed_off = sink.clone();
        let mut collection = FactCollection::default();
        collection.push(Fact::new("x", "", "", ""));

        handed_off
            .persist(&collection)
            .await
            .expect("💀 in-memory persist cannot fail");
        let received = sink.received.lock().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0], collection);
    }
}
