//! 📚 factoid — fetch N facts at once, keep the order they arrived in, write them down once.
//!
//! The pipeline: [`backends`] source → N fetch workers → one channel → aggregator →
//! [`backends`] sink. The supervisor in between knows when the last worker is done
//! and is the only one allowed to close the channel. One failed fetch cancels the
//! rest and nothing gets written.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

pub mod app_config;
pub mod backends;
pub mod common;
pub mod errors;
pub mod fatal;
mod progress;
mod supervisors;

use crate::app_config::{AppConfig, RuntimeConfig};
use crate::backends::{Sink, SinkBackend, SourceBackend};
use crate::progress::ProgressMetrics;
use crate::supervisors::Supervisor;

pub use progress::render_report;

/// 🧾 What a successful run did. Failed runs don't get a report, they get an error.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: String,
    pub width: usize,
    pub facts_persisted: usize,
    pub destination: String,
    pub elapsed: Duration,
}

/// 🚀 Build the backends from config and run once.
pub async fn run(app_config: AppConfig) -> Result<RunReport> {
    let source = SourceBackend::from_config(&app_config.source_config)
        .context("💀 couldn't build the fact source")?;
    let sink = SinkBackend::from_config(&app_config.sink_config);
    let progress = ProgressMetrics::new(source.describe(), app_config.runtime.width);
    run_with(source, sink, app_config.runtime, progress).await
}

/// 🧵 Gather, then persist. Persist only happens if every fetch succeeded.
pub(crate) async fn run_with(
    source: SourceBackend,
    mut sink: SinkBackend,
    runtime: RuntimeConfig,
    progress: ProgressMetrics,
) -> Result<RunReport> {
    let started = Instant::now();
    let width = runtime.width;
    let source_name = source.describe();
    info!("🚀 gathering {} facts from {}", width, source_name);

    let collection = Supervisor::new(runtime)
        .gather(Arc::new(source), progress)
        .await
        .context("💀 gathering facts failed")?;

    sink.persist(&collection)
        .await
        .context("💀 persisting the collection failed")?;

    let report = RunReport {
        source: source_name,
        width,
        facts_persisted: collection.len(),
        destination: sink.describe(),
        elapsed: started.elapsed(),
    };
    info!(
        "✅ Code finished running in {:?}, {} facts written to {}",
        report.elapsed, report.facts_persisted, report.destination
    );
    Ok(report)
}
