//! Unified error handling
//!
//! Error types shared across the bridge.
//!
//! ## Layers
//!
//! - **Binding errors** (`BindingError`): recoverable, caused by the calling
//!   script and reported through the engine's own error path.
//! - **Bridge errors** (`BridgeError`): setup failures (configuration, engine
//!   initialisation, I/O).
//!
//! A native method that was never bound is not an error value at all: it is
//! an integration bug and aborts with a panic.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised to the calling script
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Failed to execute '{method}' on '{class}': {required} argument required, but only {given} present.")]
    ArgumentCount {
        class: &'static str,
        method: &'static str,
        required: usize,
        given: usize,
    },

    #[error("Failed to execute '{method}' on '{class}': parameter {index} is not of type '{expected}'.")]
    ArgumentType {
        class: &'static str,
        method: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error("{class}.{name} is not a function")]
    NotCallable { class: &'static str, name: String },
}

/// Bridge setup and runtime errors
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Script engine error: {0}")]
    Script(String),

    #[error("Consumer thread error: {0}")]
    Consumer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rquickjs::Error> for BridgeError {
    fn from(err: rquickjs::Error) -> Self {
        BridgeError::Script(err.to_string())
    }
}

pub type BindingResult<T> = Result<T, BindingError>;
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err = BindingError::NotCallable {
            class: "IFrameElement",
            name: "width".to_string(),
        };
        let bridge_err: BridgeError = err.into();
        assert!(matches!(bridge_err, BridgeError::Binding(_)));
    }

    #[test]
    fn test_error_display() {
        let err = BindingError::ArgumentCount {
            class: "IFrameElement",
            method: "postMessage",
            required: 1,
            given: 0,
        };
        assert_eq!(
            err.to_string(),
            "Failed to execute 'postMessage' on 'IFrameElement': 1 argument required, but only 0 present."
        );
    }
}
