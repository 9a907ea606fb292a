//! 💀 The error taxonomy — every way a run can go sideways, with a name tag on each.
//!
//! Everything else in the crate speaks `anyhow`. These enums exist so the
//! three kinds of fetch failure (and the two kinds of persist failure) stay
//! distinguishable after they've been wrapped in context. Fish them back out
//! with `err.chain()` + `downcast_ref`.

use std::path::PathBuf;

use thiserror::Error;

/// 📡 One fetch, one failure. Never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 🔌 connect, DNS, timeout, or the body stream dying mid-read
    #[error("error making request: {0}")]
    Network(#[source] reqwest::Error),

    /// 🚦 we got an answer, it just wasn't 200
    #[error("unexpected status code: {0}")]
    Status(u16),

    /// 🧩 the body arrived but isn't shaped like a fact
    #[error("error decoding response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// 🪫 in-memory source ran out of scripted responses
    #[error("in-memory source has no responses left")]
    Exhausted,
}

/// 💾 The two ways the final write can fail.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("error encoding collection: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("error writing '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 🔎 Walks an `anyhow` chain looking for a `FetchError`. Returns the first one found.
pub fn find_fetch_error(err: &anyhow::Error) -> Option<&FetchError> {
    err.chain().find_map(|cause| cause.downcast_ref::<FetchError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn the_one_where_status_errors_carry_their_code() {
        let err = FetchError::Status(503);
        assert_eq!(err.to_string(), "unexpected status code: 503");
    }

    #[test]
    fn the_one_where_context_does_not_hide_the_fetch_error() {
        let wrapped: anyhow::Result<()> = Err(FetchError::Status(418))
            .context("fetch worker 2 could not fetch")
            .context("gathering facts failed");
        let err = wrapped.expect_err("💀 this was supposed to fail");
        assert!(matches!(find_fetch_error(&err), Some(FetchError::Status(418))));
    }

    #[test]
    fn the_one_where_write_errors_name_the_path() {
        let err = PersistError::Write {
            path: PathBuf::from("/nope/data.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/nope/data.json"));
    }
}
