//! 🔌 Backends — where the real I/O happens.
//!
//! 🚰 Sources hand out one fact per call, Sinks swallow the whole collection in one gulp.
//! Everything between them is the supervisor's problem.
//!
//! 🎭 This module is the casting agency. Need facts from an HTTP API?
//! Need facts from a hardcoded list because the Wi-Fi on the train is down?
//! We've got a backend for that.

use anyhow::Result;
use async_trait::async_trait;

use crate::app_config::{SinkConfig, SourceConfig};
use crate::common::{Fact, FactCollection};
use crate::errors::{FetchError, PersistError};

pub(crate) mod file_sink;
pub(crate) mod http_source;
pub(crate) mod in_mem;

pub use file_sink::FileSinkConfig;
pub use http_source::HttpSourceConfig;
pub use in_mem::InMemorySourceConfig;

// ===== Source Trait and Backend Enum =====

/// 🚰 A source that produces facts, one per call.
///
/// # Contract
/// - `fetch` is one attempt. No retries, no caching, no memory of previous calls
///   (the in-memory test double is the exception, it has a script to work through).
/// - `&self`, not `&mut self`: N workers share one source behind an `Arc` and call it concurrently.
#[async_trait]
pub(crate) trait Source: std::fmt::Debug + Send + Sync {
    /// 📡 Fetch exactly one fact, or explain exactly why not.
    async fn fetch(&self) -> Result<Fact, FetchError>;
}

/// 🎭 The many faces of a Source.
#[derive(Debug)]
pub(crate) enum SourceBackend {
    Http(http_source::HttpSource),
    InMemory(in_mem::InMemorySource),
}

impl SourceBackend {
    /// 🏗️ Build the source named by the config.
    pub(crate) fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(match config {
            SourceConfig::Http(http) => SourceBackend::Http(http_source::HttpSource::new(http.clone())?),
            SourceConfig::InMemory(in_mem) => {
                SourceBackend::InMemory(in_mem::InMemorySource::from_config(in_mem))
            }
        })
    }

    /// 🏷️ A short human name for logs and the progress display.
    pub(crate) fn describe(&self) -> String {
        match self {
            SourceBackend::Http(http) => http.url().to_string(),
            SourceBackend::InMemory(_) => "in-memory".to_string(),
        }
    }
}

#[async_trait]
impl Source for SourceBackend {
    async fn fetch(&self) -> Result<Fact, FetchError> {
        match self {
            SourceBackend::Http(http) => http.fetch().await,
            SourceBackend::InMemory(in_mem) => in_mem.fetch().await,
        }
    }
}

// ===== Sink Trait and Backend Enum =====

/// 🕳️ A sink that persists a finished collection.
///
/// # Contract
/// - `persist` is called once per successful run, after the drain, never during it.
/// - It overwrites whatever was there before. There is no append mode.
#[async_trait]
pub(crate) trait Sink: std::fmt::Debug + Send {
    async fn persist(&mut self, collection: &FactCollection) -> Result<(), PersistError>;
}

/// 🎭 The many faces of a Sink.
#[derive(Debug)]
pub(crate) enum SinkBackend {
    File(file_sink::FileSink),
    InMemory(in_mem::InMemorySink),
}

impl SinkBackend {
    pub(crate) fn from_config(config: &SinkConfig) -> Self {
        match config {
            SinkConfig::File(file) => SinkBackend::File(file_sink::FileSink::new(file.clone())),
            SinkConfig::InMemory => SinkBackend::InMemory(in_mem::InMemorySink::default()),
        }
    }

    /// 🏷️ Where the collection is headed, for the run report.
    pub(crate) fn describe(&self) -> String {
        match self {
            SinkBackend::File(file) => file.path().display().to_string(),
            SinkBackend::InMemory(_) => "in-memory".to_string(),
        }
    }
}

#[async_trait]
impl Sink for SinkBackend {
    async fn persist(&mut self, collection: &FactCollection) -> Result<(), PersistError> {
        match self {
            SinkBackend::File(sink) => sink.persist(collection).await,
            SinkBackend::InMemory(sink) => sink.persist(collection).await,
        }
    }
}
