//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::backends::{FileSinkConfig, HttpSourceConfig, InMemorySourceConfig};

/// 📦 The AppConfig: one struct to rule them all.
///
/// Every section has a default, so an empty file (or no file at all) is a valid
/// config that does the classic one-shot run: six fetches
/// against the useless facts API, written to `./data.json`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// 📡 where facts come from
    #[serde(default)]
    pub source_config: SourceConfig,
    /// 💾 where the collection lands
    #[serde(default)]
    pub sink_config: SinkConfig,
    /// 🧵 how wide the fan-out goes
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// 📓 where fatal errors get written down
    #[serde(default)]
    pub error_log: ErrorLogConfig,
}

/// 🚰 The many faces of a fact source.
///
/// Variants also answer to their lowercase names, because figment lowercases env keys.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum SourceConfig {
    #[serde(alias = "http")]
    Http(HttpSourceConfig),
    #[serde(alias = "in_memory", alias = "inmemory")]
    InMemory(InMemorySourceConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Http(HttpSourceConfig::default())
    }
}

/// 🕳️ Where the collection goes: a file, or nowhere but RAM.
///
/// The in-memory sink is a unit variant, so in TOML it's just `sink_config = "InMemory"`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub enum SinkConfig {
    #[serde(alias = "file")]
    File(FileSinkConfig),
    #[serde(alias = "in_memory", alias = "inmemory")]
    InMemory,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::File(FileSinkConfig::default())
    }
}

/// 🧱 Ceiling for `width` and `channel_capacity`. Both size up-front allocations.
pub const MAX_WIDTH: usize = 10_000;

/// 🧵 Runtime knobs for the fan-out/fan-in coordinator.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuntimeConfig {
    /// 🔢 How many fetches run in parallel. Fixed for the whole run. Must be ≥ 1.
    #[serde(default = "default_width", alias = "runs")]
    pub width: usize,
    /// 📬 Channel capacity. Never allowed below `width`, so a worker's send never waits on the reader.
    #[serde(default)]
    pub channel_capacity: Option<usize>,
}

fn default_width() -> usize {
    6
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            channel_capacity: None,
        }
    }
}

impl RuntimeConfig {
    /// 🔢 The capacity actually used for the channel: max(width, configured).
    pub fn effective_channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(0).max(self.width)
    }

    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 {
            anyhow::bail!(
                "💀 runtime.width is 0. Zero workers fetch zero facts, and then we write an empty file and call it a day. No. Use 1 or more."
            );
        }
        if self.width > MAX_WIDTH {
            anyhow::bail!(
                "💀 runtime.width is {}. That's a lot of facts. The ceiling is {}.",
                self.width,
                MAX_WIDTH
            );
        }
        if let Some(capacity) = self.channel_capacity {
            if capacity > MAX_WIDTH {
                anyhow::bail!(
                    "💀 runtime.channel_capacity is {}. Nobody needs a mailbox that big. The ceiling is {}.",
                    capacity,
                    MAX_WIDTH
                );
            }
        }
        Ok(())
    }
}

/// 📓 Where the fatal error path appends its one line.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ErrorLogConfig {
    #[serde(default = "default_error_log_file_name")]
    pub file_name: PathBuf,
}

fn default_error_log_file_name() -> PathBuf {
    PathBuf::from("./errors.log")
}

impl Default for ErrorLogConfig {
    fn default() -> Self {
        Self {
            file_name: default_error_log_file_name(),
        }
    }
}

impl AppConfig {
    /// ✅ Cross-field checks serde can't do on its own.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.runtime.validate()?;
        if let SourceConfig::Http(http) = &self.source_config {
            if http.timeout_secs == 0 {
                anyhow::bail!(
                    "💀 source_config.Http.timeout_secs is 0. A zero second timeout is just a very fast failure. Pick something like 10."
                );
            }
        }
        Ok(())
    }
}

/// 🚀 Load the config — an optional TOML file, then env vars, then serde defaults for the gaps.
///
/// 📐 Layering:
///   - if `config_file_name` is Some, the TOML file is the base layer
///   - `FACTOID_*` env vars win over the file. Nested keys use `__`,
///     e.g. `FACTOID_RUNTIME__WIDTH=12` or `FACTOID_SINK_CONFIG__FILE__FILE_NAME=out.json`
///   - anything still missing falls back to the `#[serde(default)]`s above
///
/// 💀 Returns an error if the merged result doesn't parse or fails validation.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new();

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };
    let config = config.merge(Env::prefixed("FACTOID_").split("__"));

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (FACTOID_*). \
             One of them is lying. Probably the one with the typo.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (FACTOID_*). \
                 No file was provided — this one's all on the environment."
            .to_string(),
    };

    let app_config: AppConfig = config.extract().context(context_msg)?;
    app_config
        .validate()
        .context("💀 The configuration parsed, but it doesn't make sense")?;
    Ok(app_config)
}
