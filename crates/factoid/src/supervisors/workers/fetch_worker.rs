//! 🎬 *[six requests leave at once. nobody knows who comes back first.]*
//!
//! 📡 The FetchWorker: one fetch, one send, one completion signal. Then it goes home.
//!
//! On failure it doesn't just quit quietly. It writes its error into the run's
//! [`FirstFailure`] slot and cancels the run's token, so every peer still in
//! flight drops what it's doing. The whole run is all-or-nothing.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use async_channel::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::Worker;
use crate::backends::{Source, SourceBackend};
use crate::common::Fact;
use crate::errors::FetchError;
use crate::supervisors::latch::CompletionGuard;

/// ✉️ Send-only handle to the fan-in channel.
///
/// Workers get this instead of a raw `Sender`, so they can send but can never
/// close the channel. Closing belongs to the supervisor's completion watcher, alone.
#[derive(Debug, Clone)]
pub(crate) struct FactSender {
    tx: Sender<Fact>,
}

impl FactSender {
    pub(crate) fn new(tx: Sender<Fact>) -> Self {
        Self { tx }
    }

    pub(crate) async fn send(&self, fact: Fact) -> Result<()> {
        self.tx
            .send(fact)
            .await
            .map_err(|_| anyhow!("💀 the fact channel closed while a worker was still holding a fact. The completion watcher jumped the gun."))
    }
}

/// 🥇 The first worker error of the run. Later ones get logged and dropped.
#[derive(Debug, Default)]
pub(crate) struct FirstFailure {
    slot: Mutex<Option<FetchError>>,
}

impl FirstFailure {
    /// 📝 Returns true if this error won the race to be first.
    pub(crate) fn record(&self, error: FetchError) -> bool {
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            warn!("⚠️ another fetch also failed, keeping the first error: {}", error);
            return false;
        }
        *slot = Some(error);
        true
    }

    pub(crate) fn take(&self) -> Option<FetchError> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// 📡 One unit of fan-out.
#[derive(Debug)]
pub(crate) struct FetchWorker {
    worker_id: usize,
    source: Arc<SourceBackend>,
    tx: FactSender,
    completion: CompletionGuard,
    cancel: CancellationToken,
    first_failure: Arc<FirstFailure>,
}

impl FetchWorker {
    pub(crate) fn new(
        worker_id: usize,
        source: Arc<SourceBackend>,
        tx: FactSender,
        completion: CompletionGuard,
        cancel: CancellationToken,
        first_failure: Arc<FirstFailure>,
    ) -> Self {
        Self {
            worker_id,
            source,
            tx,
            completion,
            cancel,
            first_failure,
        }
    }
}

impl Worker for FetchWorker {
    fn start(self) -> JoinHandle<Result<()>> {
        let FetchWorker {
            worker_id,
            source,
            tx,
            completion,
            cancel,
            first_failure,
        } = self;

        tokio::spawn(async move {
            // 🎟️ held for the whole task, dropped on every way out of it
            let _completion = completion;
            trace!("🚀 fetch worker {} started", worker_id);

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("🛑 fetch worker {} abandoned its fetch, a peer already failed", worker_id);
                    return Ok(());
                }
                fetched = source.fetch() => fetched,
            };

            match fetched {
                Ok(fact) => {
                    // 🛑 a peer may have failed while we were on the wire
                    if cancel.is_cancelled() {
                        debug!("🛑 fetch worker {} dropping fact '{}', run is cancelled", worker_id, fact.id);
                        return Ok(());
                    }
                    trace!("📬 fetch worker {} got fact '{}'", worker_id, fact.id);
                    tx.send(fact)
                        .await
                        .with_context(|| format!("fetch worker {} could not deliver its fact", worker_id))
                }
                Err(error) => {
                    let message = error.to_string();
                    if first_failure.record(error) {
                        warn!("💀 fetch worker {} failed first, cancelling the run: {}", worker_id, message);
                    }
                    cancel.cancel();
                    Err(anyhow!("fetch worker {} failed: {}", worker_id, message))
                }
            }
        })
    }
}
