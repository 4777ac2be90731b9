//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Subscriber queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("Keep-alive interval must be at least 1 second")]
    InvalidKeepAlive,

    #[error("Idle timeout must exceed the keep-alive interval")]
    InvalidIdleTimeout,

    #[error("Client endpoint must be an http(s) URL")]
    InvalidEndpoint,

    #[error("Reconnect delay must be at least 1 millisecond")]
    InvalidReconnectDelay,
}
