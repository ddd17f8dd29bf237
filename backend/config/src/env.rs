//! `CROSSGRID_*` environment overrides.
//!
//! Applied after the YAML file and before defaults, so the environment always
//! wins over the file.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::schema::{CrossgridConfig, LoggingConfig, ServerConfig, SessionsConfig, StorageConfig};

pub const ENV_BIND: &str = "CROSSGRID_BIND";
pub const ENV_PORT: &str = "CROSSGRID_PORT";
pub const ENV_DATA_DIR: &str = "CROSSGRID_DATA_DIR";
pub const ENV_STATIC_DIR: &str = "CROSSGRID_STATIC_DIR";
pub const ENV_WRITE_BACK_DELAY_MS: &str = "CROSSGRID_WRITE_BACK_DELAY_MS";
pub const ENV_PING_INTERVAL_MS: &str = "CROSSGRID_PING_INTERVAL_MS";
pub const ENV_LOG_LEVEL: &str = "CROSSGRID_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CROSSGRID_LOG_DIR";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: CrossgridConfig) -> Result<CrossgridConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: CrossgridConfig,
    env: &HashMap<String, String>,
) -> Result<CrossgridConfig> {
    let get = |key: &str| env.get(key).filter(|v| !v.is_empty());

    if let Some(bind) = get(ENV_BIND) {
        server(&mut config).bind = Some(bind.clone());
    }
    if let Some(port) = get(ENV_PORT) {
        server(&mut config).port = Some(parse(ENV_PORT, port)?);
    }
    if let Some(dir) = get(ENV_STATIC_DIR) {
        server(&mut config).static_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = get(ENV_DATA_DIR) {
        config
            .storage
            .get_or_insert_with(StorageConfig::default)
            .data_dir = Some(PathBuf::from(dir));
    }
    if let Some(ms) = get(ENV_WRITE_BACK_DELAY_MS) {
        sessions(&mut config).write_back_delay_ms = Some(parse(ENV_WRITE_BACK_DELAY_MS, ms)?);
    }
    if let Some(ms) = get(ENV_PING_INTERVAL_MS) {
        sessions(&mut config).ping_interval_ms = Some(parse(ENV_PING_INTERVAL_MS, ms)?);
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        logging(&mut config).level = Some(level.clone());
    }
    if let Some(dir) = get(ENV_LOG_DIR) {
        logging(&mut config).dir = Some(PathBuf::from(dir));
    }
    Ok(config)
}

fn server(config: &mut CrossgridConfig) -> &mut ServerConfig {
    config.server.get_or_insert_with(ServerConfig::default)
}

fn sessions(config: &mut CrossgridConfig) -> &mut SessionsConfig {
    config.sessions.get_or_insert_with(SessionsConfig::default)
}

fn logging(config: &mut CrossgridConfig) -> &mut LoggingConfig {
    config.logging.get_or_insert_with(LoggingConfig::default)
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {key}: {raw:?}"))
}
