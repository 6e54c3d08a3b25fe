//! Logging initialization

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn env_filter(debug: bool) -> EnvFilter {
    let default = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize logging
///
/// Progress goes to stderr unless `log_file` is given, in which case the
/// file is truncated and written without ANSI codes. `RUST_LOG` overrides
/// the level chosen by `debug`.
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_writer(file)
                .with_env_filter(env_filter(debug))
                .with_ansi(false)
                .with_target(true)
                .with_file(debug)
                .with_line_number(debug)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter(debug))
                .with_target(debug)
                .init();
        }
    }
    Ok(())
}
