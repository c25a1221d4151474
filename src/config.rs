//! Host configuration
//!
//! Plain structs with defaults; the binary fills them from command-line
//! arguments and `SOILSENSE_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{UserPreference, DEFAULT_DEVICE_ID};

/// Serial port the board enumerates as on the reference setup
#[cfg(target_os = "windows")]
pub const DEFAULT_PORT: &str = "COM6";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Origins of the dashboard dev server
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://127.0.0.1:5173", "http://localhost:5173"];

/// Serial link settings
#[derive(Clone, Debug, PartialEq)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Ingest loop settings
#[derive(Clone, Debug, PartialEq)]
pub struct IngestConfig {
    pub poll_interval: Duration,
    pub device_id: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            device_id: DEFAULT_DEVICE_ID.to_string(),
        }
    }
}

/// Classifier artifact locations
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("soil_model.bin"),
            encoder_path: PathBuf::from("label_encoder.bin"),
        }
    }
}

/// HTTP query interface settings
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Browser origins allowed to call the API
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Everything the host process needs to start
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostConfig {
    pub serial: SerialConfig,
    pub ingest: IngestConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
    /// Preference in effect until the first update arrives
    pub initial_preference: UserPreference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.serial.connect_attempts, 3);
        assert_eq!(config.serial.retry_delay, Duration::from_secs(2));
        assert_eq!(config.ingest.poll_interval, Duration::from_millis(100));
        assert_eq!(config.server.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.initial_preference, UserPreference::default());
        assert!(config
            .server
            .cors_allowed_origins
            .iter()
            .any(|o| o == "http://localhost:5173"));
    }
}
