//! Config defaults: applies default values to parsed config.

use crate::schema::{CrossgridConfig, LoggingConfig, ServerConfig, SessionsConfig};

pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 9000;

/// Largest accepted game upload.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1_000_000;

pub const DEFAULT_WRITE_BACK_DELAY_MS: u64 = 20_000;

pub const DEFAULT_PING_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: CrossgridConfig) -> CrossgridConfig {
    let config = apply_server_defaults(config);
    let config = apply_session_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: CrossgridConfig) -> CrossgridConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    if server.bind.is_none() {
        server.bind = Some(DEFAULT_BIND.to_string());
    }
    if server.port.is_none() {
        server.port = Some(DEFAULT_PORT);
    }
    if server.max_upload_bytes.is_none() {
        server.max_upload_bytes = Some(DEFAULT_MAX_UPLOAD_BYTES);
    }
    config
}

fn apply_session_defaults(mut config: CrossgridConfig) -> CrossgridConfig {
    let sessions = config.sessions.get_or_insert_with(SessionsConfig::default);
    if sessions.write_back_delay_ms.is_none() {
        sessions.write_back_delay_ms = Some(DEFAULT_WRITE_BACK_DELAY_MS);
    }
    if sessions.ping_interval_ms.is_none() {
        sessions.ping_interval_ms = Some(DEFAULT_PING_INTERVAL_MS);
    }
    config
}

fn apply_logging_defaults(mut config: CrossgridConfig) -> CrossgridConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_sections() {
        let cfg = apply_all_defaults(CrossgridConfig::default());
        assert_eq!(cfg.server.unwrap().port, Some(DEFAULT_PORT));
        assert_eq!(
            cfg.sessions.unwrap().write_back_delay_ms,
            Some(DEFAULT_WRITE_BACK_DELAY_MS)
        );
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = CrossgridConfig::default();
        cfg.sessions = Some(SessionsConfig {
            ping_interval_ms: Some(1_500),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        let sessions = cfg.sessions.unwrap();
        assert_eq!(sessions.ping_interval_ms, Some(1_500));
        assert_eq!(sessions.write_back_delay_ms, Some(DEFAULT_WRITE_BACK_DELAY_MS));
    }
}
