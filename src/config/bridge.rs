//! Bridge loop configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Tick pacing and client timeout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Milliseconds between bridge ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Seconds without traffic in either direction before a client raises a
    /// timeout (disabled when unset). Broadcasts to the client count as traffic.
    pub client_timeout_secs: Option<u64>,
}

impl BridgeConfig {
    /// Tick interval as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Client idle timeout as a duration
    pub fn client_timeout(&self) -> Option<Duration> {
        self.client_timeout_secs.map(Duration::from_secs)
    }

    /// Validate bridge configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1000 {
            return Err(ValidationError::InvalidTickInterval);
        }
        if self.client_timeout_secs == Some(0) {
            return Err(ValidationError::InvalidClientTimeout);
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            client_timeout_secs: None,
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    10
}
