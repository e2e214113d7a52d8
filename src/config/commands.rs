/// Command stream configuration

use serde::{Deserialize, Serialize};
use super::{ConfigError, ConfigResult};

/// Serialisation settings for commands sent to the native side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Fractional digits used for numeric property values on the wire
    pub number_precision: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            number_precision: 6,
        }
    }
}

impl CommandConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.number_precision > 17 {
            return Err(ConfigError::ValidationError(
                "number_precision must be at most 17".to_string(),
            ));
        }
        Ok(())
    }
}
