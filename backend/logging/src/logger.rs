//! Structured Logger
//!
//! Wraps `tracing` with a console layer and, when a log directory is given,
//! a daily-rolling NDJSON file. `RUST_LOG` overrides the configured level.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for the rolling log (`crossgrid.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "crossgrid.log";

/// Build the level filter: `RUST_LOG` wins, then `level`, then `info`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global structured logger.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(level: &str, log_dir: Option<&Path>) {
    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_falls_back() {
        // Must not panic on directives EnvFilter can't parse.
        let _ = build_filter("info,[[[");
    }

    #[test]
    fn writes_json_lines_to_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        init_logger("info", Some(dir.path()));
        tracing::info!(game = "daily", "logger smoke test");

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries
            .iter()
            .flatten()
            .any(|e| e.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX)));
    }
}
