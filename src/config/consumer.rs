/// Native consumer configuration

use serde::{Deserialize, Serialize};
use super::{ConfigError, ConfigResult};

/// Settings of the thread that applies commands and runs deferred releases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Name given to the consumer thread
    pub thread_name: String,

    /// Commands applied per drain step before the release queue is flushed
    pub batch_size: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            thread_name: "ui-command-consumer".to_string(),
            batch_size: 256,
        }
    }
}

impl ConsumerConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "thread_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
