//! UI Command Protocol
//!
//! This protocol defines the ordered command stream between script-side
//! element bindings and the native consumer that owns the real elements.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::BridgeResult;

/// Stable identity correlating a script-side binding with its native counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a scripting context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

/// Operations sent from bindings to the native side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiCommandKind {
    /// Materialize the native counterpart of an element
    CreateElement {
        tag: String,
    },

    /// Apply a property value in its wire representation
    SetProperty {
        name: String,
        value: String,
    },

    /// Call a native method with a string payload
    Invoke {
        method: String,
        payload: String,
    },
}

impl UiCommandKind {
    /// Short operation tag, used in logs.
    pub fn tag(&self) -> &'static str {
        match self {
            UiCommandKind::CreateElement { .. } => "create",
            UiCommandKind::SetProperty { .. } => "set-property",
            UiCommandKind::Invoke { .. } => "invoke",
        }
    }
}

/// A command as delivered to the consumer.
///
/// `seq` is assigned by the command buffer at append time and grows by one
/// for every command; the consumer reports its progress in terms of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiCommand {
    pub seq: u64,
    pub target: TargetId,
    pub kind: UiCommandKind,
}

impl UiCommand {
    pub fn is_create(&self) -> bool {
        matches!(self.kind, UiCommandKind::CreateElement { .. })
    }
}

/// Script engine front end that hosts element bindings.
pub trait ScriptAdapter {
    /// Runs a script in the adapter's context.
    fn execute(&self, code: &str) -> BridgeResult<()>;

    /// Lets the engine collect unreachable elements and finalize their bindings.
    fn collect_garbage(&self);

    /// Finalizes every binding the engine still holds.
    fn shutdown(&mut self);
}
