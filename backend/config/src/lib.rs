//! `crossgrid-config`: server configuration management.
//!
//! Provides:
//! - Typed config schema
//! - YAML loading from the config directory
//! - `CROSSGRID_*` environment overrides
//! - Default value application
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use schema::CrossgridConfig;
pub use io::{config_dir, config_file_path, load_config};
pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use defaults::apply_all_defaults;
pub use validation::{validate, ValidationReport, ConfigValidationError};

use anyhow::{bail, Result};
use std::path::Path;

/// Load the config file, apply env overrides and defaults, and validate.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<CrossgridConfig> {
    let config = load_config(path).await?;
    let config = apply_env_overrides(config)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{first}");
    }

    Ok(config)
}
