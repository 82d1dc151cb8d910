//! Stream device configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Device name meaning "use the process's stdin/stdout".
pub const STDIO_DEVICE: &str = "-";

/// Byte stream configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Path of the serial device or file, or `-` for stdio
    #[serde(default = "default_device")]
    pub device: String,
}

impl StreamConfig {
    /// Whether the bridge should use stdio instead of a device
    pub fn is_stdio(&self) -> bool {
        self.device == STDIO_DEVICE
    }

    /// Validate stream configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.device.trim().is_empty() {
            return Err(ValidationError::MissingRequired("stream.device"));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

fn default_device() -> String {
    STDIO_DEVICE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stdio() {
        assert!(StreamConfig::default().is_stdio());
    }

    #[test]
    fn device_path_is_not_stdio() {
        let config = StreamConfig {
            device: "/dev/ttyUSB0".to_string(),
        };
        assert!(!config.is_stdio());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_device_is_rejected() {
        let config = StreamConfig {
            device: "  ".to_string(),
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("stream.device"))
        );
    }
}
