//! Sync client configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Client connection manager configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Realtime endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Fixed delay between reconnect attempts, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Retries allowed after the initial attempt before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Connect as soon as the client is constructed
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidEndpoint);
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ValidationError::InvalidReconnectDelay);
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            auto_connect: default_auto_connect(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8080/api/realtime/events".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_auto_connect() -> bool {
    true
}
