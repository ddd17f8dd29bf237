//! Config validation with user-friendly error messages.

use crate::schema::CrossgridConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &CrossgridConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_sessions(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_server(config: &CrossgridConfig, report: &mut ValidationReport) {
    let port = config.port();
    if port == 0 {
        report.error("server.port", "port must be > 0");
    } else if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
    if config.max_upload_bytes() == 0 {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
    if let Some(dir) = config.static_dir() {
        if !dir.is_dir() {
            report.warn(
                "server.staticDir",
                format!("{} is not a directory; static pages will 404", dir.display()),
            );
        }
    }
}

fn validate_sessions(config: &CrossgridConfig, report: &mut ValidationReport) {
    if config.write_back_delay().is_zero() {
        report.error("sessions.writeBackDelayMs", "writeBackDelayMs must be > 0");
    }
    if config.ping_interval().is_zero() {
        report.error("sessions.pingIntervalMs", "pingIntervalMs must be > 0");
    }
}

fn validate_logging(config: &CrossgridConfig, report: &mut ValidationReport) {
    let level = config.log_level();
    if !matches!(
        level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        report.warn(
            "logging.level",
            format!("'{level}' is not a plain level; it will be used as a filter directive"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ServerConfig, SessionsConfig};

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&CrossgridConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn zero_delays_are_errors() {
        let mut cfg = CrossgridConfig::default();
        cfg.sessions = Some(SessionsConfig {
            write_back_delay_ms: Some(0),
            ping_interval_ms: Some(0),
        });
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].path.contains("writeBackDelayMs"));
    }

    #[test]
    fn privileged_port_is_a_warning() {
        let mut cfg = CrossgridConfig::default();
        cfg.server = Some(ServerConfig {
            port: Some(81),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "server.port");
    }
}
