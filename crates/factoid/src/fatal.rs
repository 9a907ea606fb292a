//! 💀 The fatal error path — one line in the log, then the process is gone.
//!
//! `ErrorLog` is built once in `main` and handed to whoever ends the process.
//! The file is opened in append mode only when there's something to write,
//! and closed again before `record` returns, so no handle outlives the call.
//!
//! Line format: `2026/10/18 14:03:07 Error: <message chain>`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::error;

#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 📝 Append exactly one line describing `err` (its whole `{:#}` chain, newlines flattened).
    pub fn record(&self, err: &anyhow::Error) -> Result<()> {
        let mut log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| {
                format!(
                    "💀 couldn't open the error log '{}'. The error we wanted to write down is now twice as lost.",
                    self.path.display()
                )
            })?;
        let line = format_line(&chrono::Local::now(), err);
        log_file
            .write_all(line.as_bytes())
            .with_context(|| format!("💀 couldn't append to '{}'", self.path.display()))?;
        Ok(())
    }

    /// 🗑️ Record, report, exit 1. A failure to write the log is reported but never changes the exit code.
    pub fn abort(&self, err: &anyhow::Error) -> ! {
        if let Err(log_err) = self.record(err) {
            error!("⚠️ {:#}", log_err);
        }
        error!("💀 error: {:#}", err);
        std::process::exit(1);
    }
}

fn format_line<Tz>(now: &chrono::DateTime<Tz>, err: &anyhow::Error) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let message = format!("{:#}", err).replace(['\r', '\n'], " ");
    format!("{} Error: {}\n", now.format("%Y/%m/%d %H:%M:%S"), message)
}
