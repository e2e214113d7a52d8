//! Bridge wiring and scripting-context handles.
//!
//! A [`Bridge`] owns the script-side ends of the command buffer and the
//! release queue. Every scripting context created from it shares those
//! queues, so a single consumer observes one global command order.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use super::command_buffer::{command_buffer, CommandReceiver, CommandSender};
use super::element::ElementBinding;
use super::factory::{ElementClass, ElementFactory};
use super::native::NativeElementAllocator;
use super::property::ElementKind;
use super::protocol::{ContextId, TargetId};
use super::release_queue::{release_queue, ReleaseQueue, ReleaseReceiver};
use crate::config::BridgeConfig;

pub(crate) struct BridgeShared {
    pub(crate) commands: CommandSender,
    pub(crate) releases: ReleaseQueue,
    pub(crate) allocator: Arc<dyn NativeElementAllocator>,
    pub(crate) factory: ElementFactory,
    pub(crate) number_precision: usize,
    next_target: AtomicU64,
}

/// Consumer-side ends of the bridge queues.
pub struct ConsumerQueues {
    pub commands: CommandReceiver,
    pub releases: ReleaseReceiver,
}

/// Script-side entry point of the binding layer.
pub struct Bridge {
    shared: Arc<BridgeShared>,
    next_context: AtomicU32,
}

impl Bridge {
    pub fn new(
        config: &BridgeConfig,
        allocator: Arc<dyn NativeElementAllocator>,
    ) -> (Self, ConsumerQueues) {
        let (commands, command_rx) = command_buffer();
        let (releases, release_rx) = release_queue(commands.clone());

        let factory = ElementFactory::new();
        factory.register_builtin_elements();

        let bridge = Self {
            shared: Arc::new(BridgeShared {
                commands,
                releases,
                allocator,
                factory,
                number_precision: config.commands.number_precision,
                next_target: AtomicU64::new(1),
            }),
            next_context: AtomicU32::new(1),
        };
        let queues = ConsumerQueues {
            commands: command_rx,
            releases: release_rx,
        };
        (bridge, queues)
    }

    /// Opens a new scripting context. Dropping it tears down its cached
    /// element classes.
    pub fn create_context(&self) -> ScriptContext {
        let id = ContextId(self.next_context.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(target: "bridge::factory", context = %id, "context created");
        ScriptContext {
            id,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn factory(&self) -> &ElementFactory {
        &self.shared.factory
    }

    pub fn commands(&self) -> &CommandSender {
        &self.shared.commands
    }
}

/// Handle of one scripting context.
pub struct ScriptContext {
    id: ContextId,
    pub(crate) shared: Arc<BridgeShared>,
}

impl ScriptContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn factory(&self) -> &ElementFactory {
        &self.shared.factory
    }

    /// The per-context constructor/prototype object of `kind`.
    pub fn element_class(&self, kind: ElementKind) -> Arc<ElementClass> {
        self.shared.factory.get_or_create(self, kind)
    }

    pub fn create_element(&self, kind: ElementKind) -> ElementBinding {
        self.shared.factory.create_element(self, kind)
    }

    pub fn create_element_by_tag(&self, tag: &str) -> Option<ElementBinding> {
        self.shared.factory.create_element_by_tag(self, tag)
    }

    pub(crate) fn next_target(&self) -> TargetId {
        TargetId(self.shared.next_target.fetch_add(1, Ordering::Relaxed))
    }
}

impl Drop for ScriptContext {
    fn drop(&mut self) {
        let removed = self.shared.factory.teardown_context(self.id);
        tracing::debug!(target: "bridge::factory", context = %self.id, removed, "context torn down");
    }
}
