//! Core module
//!
//! - `error` - error types
//! - `logging` - tracing subscriber setup
//! - `macros` - helper macros

pub mod error;
pub mod logging;
#[macro_use]
pub mod macros;

pub use error::{BindingError, BindingResult, BridgeError, BridgeResult};
pub use logging::init_logging;
