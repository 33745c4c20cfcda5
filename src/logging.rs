use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "supportbot.log";

/// Path of the log file inside the supportbot home directory
pub fn log_path(home: &Path) -> PathBuf {
    home.join(LOG_FILE)
}

/// Initialize file logging.
///
/// The chat owns the terminal, so events are appended to
/// `<home>/supportbot.log`. `RUST_LOG` overrides the default `info` level.
pub fn init(home: &Path) -> Result<()> {
    std::fs::create_dir_all(home).context("Failed to create log directory")?;

    let path = log_path(home);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_ansi(false)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
