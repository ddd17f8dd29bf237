//! crossgrid server configuration schema.
//!
//! Every field is optional in the file; [`crate::defaults`] fills the gaps and
//! the accessors on [`CrossgridConfig`] return the effective values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::{
    DEFAULT_BIND, DEFAULT_LOG_LEVEL, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PING_INTERVAL_MS,
    DEFAULT_PORT, DEFAULT_WRITE_BACK_DELAY_MS,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossgridConfig {
    /// HTTP listener and uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    /// Where game files live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Session timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionsConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Directory holding the puzzle client (`main.html`, `play.html`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsConfig {
    /// Quiet period before a dirty board is written back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_back_delay_ms: Option<u64>,
    /// Websocket silence before a ping; twice this closes the connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Enables the rolling JSON log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl CrossgridConfig {
    pub fn bind(&self) -> &str {
        self.server
            .as_ref()
            .and_then(|s| s.bind.as_deref())
            .unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn static_dir(&self) -> Option<&PathBuf> {
        self.server.as_ref().and_then(|s| s.static_dir.as_ref())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server
            .as_ref()
            .and_then(|s| s.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Game directory; falls back to `<config_dir>/games`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.data_dir.clone())
            .unwrap_or_else(|| crate::io::config_dir().join("games"))
    }

    pub fn write_back_delay(&self) -> Duration {
        Duration::from_millis(
            self.sessions
                .as_ref()
                .and_then(|s| s.write_back_delay_ms)
                .unwrap_or(DEFAULT_WRITE_BACK_DELAY_MS),
        )
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(
            self.sessions
                .as_ref()
                .and_then(|s| s.ping_interval_ms)
                .unwrap_or(DEFAULT_PING_INTERVAL_MS),
        )
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<&PathBuf> {
        self.logging.as_ref().and_then(|l| l.dir.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
server:
  port: 8123
  staticDir: /srv/crossgrid/static
sessions:
  writeBackDelayMs: 5000
logging:
  level: debug
"#;
        let cfg: CrossgridConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.port(), 8123);
        assert_eq!(cfg.static_dir().unwrap(), &PathBuf::from("/srv/crossgrid/static"));
        assert_eq!(cfg.write_back_delay(), Duration::from_secs(5));
        assert_eq!(cfg.ping_interval(), Duration::from_millis(DEFAULT_PING_INTERVAL_MS));
        assert_eq!(cfg.log_level(), "debug");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = CrossgridConfig::default();
        assert_eq!(cfg.bind(), DEFAULT_BIND);
        assert_eq!(cfg.port(), DEFAULT_PORT);
        assert_eq!(cfg.max_upload_bytes(), DEFAULT_MAX_UPLOAD_BYTES);
        assert!(cfg.log_dir().is_none());
    }
}
