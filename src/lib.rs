//! # Element Bridge
//!
//! Script-side element bindings that drive native UI elements through an
//! ordered command stream.
//!
//! ## Features
//!
//! - **Ordered Commands**: create, set-property and invoke commands reach the native side in issue order
//! - **Deferred Release**: native handles outlive their bindings until every earlier command has been applied
//! - **Per-Context Classes**: one constructor/prototype object per element kind and scripting context
//! - **JavaScript**: QuickJS front end exposing `document.createElement` and element constructors
//!
//! ### Example
//!
//! ```ignore
//! use element_bridge::bindings::{Bridge, DefaultAllocator, ElementKind, ScriptValue};
//! use element_bridge::config::BridgeConfig;
//!
//! let (bridge, queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
//! let ctx = bridge.create_context();
//! let mut frame = ctx.create_element(ElementKind::Iframe);
//! frame.set("width", ScriptValue::from(640.0));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Errors, logging and shared macros
//! - [`config`]: Bridge configuration
//! - [`bindings`]: Element bindings, queues, consumer and script adapters

/// Errors, logging setup and shared macros
pub mod core;
/// Configuration system
pub mod config;
/// Element bindings for scripting
pub mod bindings;

pub use crate::bindings::{Bridge, ConsumerQueues, ElementBinding, ElementKind, NativeConsumer, ScriptContext};
pub use crate::config::BridgeConfig;
pub use crate::core::{BindingError, BridgeError, BridgeResult};
