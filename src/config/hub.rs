//! Broadcast hub configuration

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// Broadcast hub and SSE transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Maximum undelivered events buffered per subscriber
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds between keep-alive comment frames
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Seconds of inactivity before a subscriber is reaped
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Seconds between idle-reaper sweeps
    #[serde(default = "default_idle_sweep_secs")]
    pub idle_sweep_secs: u64,
}

impl HubConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn idle_sweep(&self) -> Duration {
        Duration::from_secs(self.idle_sweep_secs)
    }

    /// Validate hub configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.keep_alive_secs == 0 {
            return Err(ValidationError::InvalidKeepAlive);
        }
        // Quiet connections are reaped after the idle window and rely on
        // client auto-reconnect; the window must outlast the keep-alive
        // cadence so reap-and-reconnect churn stays rare relative to
        // stream upkeep.
        if self.idle_timeout_secs <= self.keep_alive_secs {
            return Err(ValidationError::InvalidIdleTimeout);
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            keep_alive_secs: default_keep_alive_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            idle_sweep_secs: default_idle_sweep_secs(),
        }
    }
}

fn default_queue_capacity() -> usize {
    128
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_idle_sweep_secs() -> u64 {
    60
}
