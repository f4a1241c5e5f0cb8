use crate::error::{Result, WstunnelServiceError};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    pub service: ServiceSection,
    pub tunnel: TunnelConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceSection {
    /// Name used for the service thread and in log lines
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Method channel name the front end talks to
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Maximum time to wait for the service to wind down
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,

    /// Interval between heartbeat log lines while running
    #[serde(default = "default_heartbeat_seconds")]
    pub heartbeat_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TunnelConfig {
    /// Local address the SOCKS5 listener binds to
    #[serde(default = "default_local_address")]
    pub local_address: String,

    /// Local port the SOCKS5 listener binds to
    #[serde(default = "default_local_port")]
    pub local_port: u16,

    /// Remote wstunnel server
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Path prefix used for the HTTP upgrade request
    #[serde(default = "default_http_upgrade_path_prefix")]
    pub http_upgrade_path_prefix: String,

    /// Minimum number of idle connections kept open
    #[serde(default = "default_connection_min_idle")]
    pub connection_min_idle: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Number of log lines kept for the front end to poll
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for a daily rolling log file
    pub file: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self> {
        Self::load_from_file("wstunnel-service.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("service.name", default_service_name())?
            .set_default("service.channel", default_channel())?
            .set_default(
                "service.stop_timeout_seconds",
                default_stop_timeout_seconds() as i64,
            )?
            .set_default("service.heartbeat_seconds", default_heartbeat_seconds() as i64)?
            .set_default("tunnel.local_address", default_local_address())?
            .set_default("tunnel.local_port", default_local_port())?
            .set_default("tunnel.remote_url", default_remote_url())?
            .set_default(
                "tunnel.http_upgrade_path_prefix",
                default_http_upgrade_path_prefix(),
            )?
            .set_default("tunnel.connection_min_idle", default_connection_min_idle())?
            .set_default("logging.queue_capacity", default_queue_capacity() as i64)?
            .set_default("logging.level", default_log_level())?
            // Configuration file is optional
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("WSTUNNEL_SERVICE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ServiceConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.service.name.trim().is_empty() {
            return Err(invalid("Service name must not be empty".to_string()));
        }

        if self.service.channel.trim().is_empty() {
            return Err(invalid("Service channel must not be empty".to_string()));
        }

        if self.service.stop_timeout_seconds == 0 {
            return Err(invalid("Service stop_timeout_seconds must be greater than 0".to_string()));
        }

        if self.service.heartbeat_seconds == 0 {
            return Err(invalid("Service heartbeat_seconds must be greater than 0".to_string()));
        }

        if self.tunnel.local_port == 0 {
            return Err(invalid("Tunnel local_port must be greater than 0".to_string()));
        }

        if !(self.tunnel.remote_url.starts_with("ws://")
            || self.tunnel.remote_url.starts_with("wss://"))
        {
            return Err(invalid(format!(
                "Tunnel remote_url must use ws:// or wss://, got '{}'",
                self.tunnel.remote_url
            )));
        }

        if self.logging.queue_capacity == 0 {
            return Err(invalid("Logging queue_capacity must be greater than 0".to_string()));
        }

        Ok(())
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.service.stop_timeout_seconds)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.service.heartbeat_seconds)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceSection {
                name: default_service_name(),
                channel: default_channel(),
                stop_timeout_seconds: default_stop_timeout_seconds(),
                heartbeat_seconds: default_heartbeat_seconds(),
            },
            tunnel: TunnelConfig {
                local_address: default_local_address(),
                local_port: default_local_port(),
                remote_url: default_remote_url(),
                http_upgrade_path_prefix: default_http_upgrade_path_prefix(),
                connection_min_idle: default_connection_min_idle(),
            },
            logging: LoggingConfig {
                queue_capacity: default_queue_capacity(),
                level: default_log_level(),
                file: None,
            },
        }
    }
}

fn invalid(message: String) -> WstunnelServiceError {
    WstunnelServiceError::Config(ConfigError::Message(message))
}

// Default value functions
fn default_service_name() -> String {
    "wstunnel".to_string()
}
fn default_channel() -> String {
    "com.example.wstunnel_gui/foreground_service".to_string()
}
fn default_stop_timeout_seconds() -> u64 {
    10
}
fn default_heartbeat_seconds() -> u64 {
    30
}

fn default_local_address() -> String {
    "127.0.0.1".to_string()
}
fn default_local_port() -> u16 {
    1080
}
fn default_remote_url() -> String {
    "wss://localhost:8080".to_string()
}
fn default_http_upgrade_path_prefix() -> String {
    "v1".to_string()
}
fn default_connection_min_idle() -> u32 {
    0
}

fn default_queue_capacity() -> usize {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.queue_capacity, 1000);
        assert_eq!(config.stop_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ServiceConfig::default();
        config.tunnel.remote_url = "https://example.com".to_string();

        // Should fail validation due to non-websocket scheme
        assert!(config.validate().is_err());

        config.tunnel.remote_url = "wss://example.com".to_string();
        assert!(config.validate().is_ok());

        config.service.stop_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = ServiceConfig::load_from_file(&path).unwrap();
        assert_eq!(config.service.name, "wstunnel");
        assert_eq!(config.tunnel.local_port, 1080);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[service]
heartbeat_seconds = 5

[tunnel]
local_port = 9050
remote_url = "wss://tunnel.example.com"
"#
        )
        .unwrap();

        let config = ServiceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.service.heartbeat_seconds, 5);
        assert_eq!(config.tunnel.local_port, 9050);
        assert_eq!(config.tunnel.remote_url, "wss://tunnel.example.com");
        // Untouched values keep their defaults
        assert_eq!(config.tunnel.http_upgrade_path_prefix, "v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_rendering_contains_sections() {
        let rendered = ServiceConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[service]"));
        assert!(rendered.contains("[tunnel]"));
        assert!(rendered.contains("[logging]"));
    }

    #[test]
    fn test_validation_error_is_config_error() {
        let mut config = ServiceConfig::default();
        config.logging.queue_capacity = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, WstunnelServiceError::Config(_)));
        assert!(err.to_string().contains("queue_capacity must be greater than 0"));
    }

    #[test]
    fn test_load_from_malformed_file_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[tunnel]\nlocal_port = \"not a port\"").unwrap();

        let err = ServiceConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, WstunnelServiceError::Config(_)));
    }
}
