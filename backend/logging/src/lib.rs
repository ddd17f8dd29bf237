//! Structured logging for the crossgrid server.
//!
//! Console output plus an optional rolling JSON file.

pub mod logger;

pub use logger::{build_filter, init_logger, LOG_FILE_PREFIX};
