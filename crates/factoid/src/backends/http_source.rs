//! # 📡 THE HTTP SOURCE
//!
//! One GET. One fact. One chance.
//!
//! This is the remote fetch client: it asks an HTTP endpoint for a single JSON
//! object, checks the status, and decodes the body into a [`Fact`]. It does not
//! retry. If the endpoint is having a bad day, so is the whole run.
//!
//! 🦆 (mandatory duck, no context provided, none shall be requested)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::backends::Source;
use crate::common::Fact;
use crate::errors::FetchError;

/// 🔧 Where to fetch from and how long to wait.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpSourceConfig {
    /// 📡 Full URL, scheme and query string included.
    #[serde(default = "default_url")]
    pub url: String,
    /// ⏱️ Per-request timeout. Per fetch, not per run.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "https://uselessfacts.jsph.pl/api/v2/facts/random?language=en".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 📡 The HTTP side of the source backend.
///
/// The `reqwest::Client` is built once and shared by every worker (the source
/// sits behind an `Arc`), so all N fetches reuse one connection pool.
#[derive(Debug)]
pub(crate) struct HttpSource {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpSource {
    /// 🚀 Build the client with the configured timeout. No network traffic yet.
    pub(crate) fn new(config: HttpSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. Probably a TLS backend issue. We never even got to send a request.")?;
        Ok(Self { client, config })
    }

    pub(crate) fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl Source for HttpSource {
    /// 📡 One round trip.
    ///
    /// - transport failure (connect, DNS, timeout, body read) → `FetchError::Network`
    /// - anything but `200 OK` → `FetchError::Status(code)`
    /// - a body that isn't a fact → `FetchError::Decode`
    async fn fetch(&self) -> Result<Fact, FetchError> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        trace!("📬 {} bytes came back from {}", body.len(), self.config.url);
        serde_json::from_slice::<Fact>(&body).map_err(FetchError::Decode)
    }
}
