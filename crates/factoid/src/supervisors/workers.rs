//! 🧵 Workers: the ones who actually do the work while the Supervisor takes all
//! the credit in the sprint retro.
//!
//! Two kinds live here:
//! - [`FetchWorker`]: fetches one fact and drops it in the channel. N of them per run.
//! - [`Aggregator`]: drains the channel into one ordered collection. One per run.

use anyhow::Result;
use tokio::task::JoinHandle;

mod aggregator;
mod fetch_worker;
pub(crate) use aggregator::Aggregator;
pub(crate) use fetch_worker::{FactSender, FetchWorker, FirstFailure};

/// 🏗️ A background worker, that does work. duh.
pub(crate) trait Worker {
    /// 🚀 Start the worker. Returns a JoinHandle because we trust but verify.
    fn start(self) -> JoinHandle<Result<()>>;
}
