//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `STREAM_BRIDGE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use stream_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Listening on {}", config.server.socket_addr().unwrap());
//! ```

mod bridge;
mod error;
mod server;
mod stream;

pub use bridge::BridgeConfig;
pub use error::{ConfigError, ValidationError};
pub use server::ServerConfig;
pub use stream::{StreamConfig, STDIO_DEVICE};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a bridge
/// between stdio and `0.0.0.0:6638`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listening socket and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// The serial-style byte stream
    #[serde(default)]
    pub stream: StreamConfig,

    /// Tick pacing and client timeouts
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `STREAM_BRIDGE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `STREAM_BRIDGE__SERVER__PORT=6638` -> `server.port = 6638`
    /// - `STREAM_BRIDGE__STREAM__DEVICE=/dev/ttyUSB0` -> `stream.device = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STREAM_BRIDGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.stream.validate()?;
        self.bridge.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("STREAM_BRIDGE__SERVER__HOST");
        env::remove_var("STREAM_BRIDGE__SERVER__PORT");
        env::remove_var("STREAM_BRIDGE__STREAM__DEVICE");
        env::remove_var("STREAM_BRIDGE__BRIDGE__TICK_INTERVAL_MS");
        env::remove_var("STREAM_BRIDGE__BRIDGE__CLIENT_TIMEOUT_SECS");
    }

    #[test]
    fn test_load_defaults_from_empty_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 6638);
        assert!(config.stream.is_stdio());
        assert_eq!(config.bridge.tick_interval(), Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("STREAM_BRIDGE__SERVER__PORT", "3000");
        env::set_var("STREAM_BRIDGE__STREAM__DEVICE", "/dev/ttyUSB0");
        env::set_var("STREAM_BRIDGE__BRIDGE__TICK_INTERVAL_MS", "25");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.stream.device, "/dev/ttyUSB0");
        assert_eq!(config.bridge.tick_interval_ms, 25);
    }

    #[test]
    fn test_client_timeout_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("STREAM_BRIDGE__BRIDGE__CLIENT_TIMEOUT_SECS", "120");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.bridge.client_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_validate_rejects_bad_section() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("STREAM_BRIDGE__BRIDGE__TICK_INTERVAL_MS", "0");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.validate(), Err(ValidationError::InvalidTickInterval));
    }

    #[test]
    fn test_unparseable_port_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("STREAM_BRIDGE__SERVER__PORT", "not-a-port");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
