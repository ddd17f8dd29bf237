use std::path::PathBuf;

use crossgrid_config::CrossgridConfig;
use crossgrid_gateway::{GatewaySettings, SessionSettings};

/// Where to read the config file from: `--config` or the config directory.
pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| crossgrid_config::config_file_path(&crossgrid_config::config_dir()))
}

pub fn session_settings(config: &CrossgridConfig) -> SessionSettings {
    SessionSettings {
        write_back_delay: config.write_back_delay(),
    }
}

pub fn gateway_settings(config: &CrossgridConfig) -> GatewaySettings {
    GatewaySettings {
        ping_interval: config.ping_interval(),
        max_upload_bytes: config.max_upload_bytes(),
        static_dir: config.static_dir().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossgrid_config::schema::{ServerConfig, SessionsConfig};
    use std::time::Duration;

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/etc/crossgrid.yaml")));
        assert_eq!(path, PathBuf::from("/etc/crossgrid.yaml"));
    }

    #[test]
    fn settings_follow_config() {
        let mut cfg = CrossgridConfig::default();
        cfg.server = Some(ServerConfig {
            max_upload_bytes: Some(2048),
            static_dir: Some(PathBuf::from("static")),
            ..Default::default()
        });
        cfg.sessions = Some(SessionsConfig {
            write_back_delay_ms: Some(1500),
            ping_interval_ms: Some(30_000),
        });

        let gateway = gateway_settings(&cfg);
        assert_eq!(gateway.max_upload_bytes, 2048);
        assert_eq!(gateway.ping_interval, Duration::from_secs(30));
        assert_eq!(gateway.static_dir, Some(PathBuf::from("static")));
        assert_eq!(
            session_settings(&cfg).write_back_delay,
            Duration::from_millis(1500)
        );
    }
}
