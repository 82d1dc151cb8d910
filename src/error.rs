//! Top-level error type for running the bridge binary.

use thiserror::Error;

use crate::config::{ConfigError, ValidationError};
use crate::ports::{AcceptorError, StreamError};

/// Anything that can stop the bridge from starting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Acceptor(#[from] AcceptorError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("Failed to install log subscriber: {0}")]
    Logging(String),

    #[error("Failed to start async runtime: {0}")]
    Startup(#[source] std::io::Error),

    #[error("Bridge task failed: {0}")]
    Runtime(#[from] tokio::task::JoinError),

    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts() {
        let err: AppError = ValidationError::InvalidPort.into();
        assert_eq!(err.to_string(), "Invalid configuration: Invalid port number");
    }

    #[test]
    fn acceptor_error_is_transparent() {
        let err: AppError = AcceptorError::AlreadyStarted.into();
        assert_eq!(err.to_string(), "Acceptor already started");
    }
}
