//! 🚀 factoid-cli — the front door of factoid.
//!
//! 📦 Thin wrapper: set up logging, load config, run once, print a summary.
//! Any failure goes through the fatal error path: one line in the error log, exit 1.

use anyhow::{Context, Result};
use factoid::app_config::AppConfig;
use factoid::fatal::ErrorLog;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🚀 main() — where it all begins.
///
/// 🔧 Steps:
/// 1. Init tracing
/// 2. Grab the config path (first arg, default `factoid.toml`, fine if missing)
/// 3. Load config
/// 4. Run the thing
/// 5. On any error: error log, exit 1
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path_arg = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("factoid.toml"));

    let app_config = match load(&path_arg) {
        Ok(app_config) => app_config,
        Err(err) => {
            // 📓 no config means no configured log path, so the default one gets the news
            let error_log = ErrorLog::new(factoid::app_config::ErrorLogConfig::default().file_name);
            fail(&error_log, &err);
        }
    };
    let error_log = ErrorLog::new(app_config.error_log.file_name.clone());

    match factoid::run(app_config).await {
        Ok(report) => {
            println!("{}", factoid::render_report(&report));
        }
        Err(err) => fail(&error_log, &err),
    }
}

/// 🔒 Use the config file if it's there, env vars and defaults if it isn't.
fn load(path_arg: &str) -> Result<AppConfig> {
    let config_file = std::path::Path::new(path_arg);
    let config_file_if_it_exists = match config_file.try_exists().context(format!(
        "💀 Couldn't even check whether '{}' exists. Permissions, probably.",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => None,
    };
    factoid::app_config::load_config(config_file_if_it_exists)
        .context("💀 In factoid-cli, main, we couldn't load the configuration")
}

/// 💀 Peel the error chain for a hint, then hand off to the fatal path.
fn fail(error_log: &ErrorLog, err: &anyhow::Error) -> ! {
    let mut the_vibes_are_giving_connection_issues = false;
    for cause in err.chain().skip(1) {
        let cause_str = cause.to_string();
        if cause_str.contains("error sending request")
            || cause_str.contains("error making request")
            || cause_str.contains("Connection refused")
            || cause_str.contains("connection refused")
            || cause_str.contains("dns error")
        {
            the_vibes_are_giving_connection_issues = true;
        }
    }
    if the_vibes_are_giving_connection_issues {
        error!(
            "🔧 hint: looks like the fact API isn't reachable. \
            Check your connection, or point source_config.Http.url somewhere that answers."
        );
    }
    error_log.abort(err)
}
