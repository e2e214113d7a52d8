//! Script-visible element bindings.
//!
//! An [`ElementBinding`] is the proxy the scripting engine talks to. It owns
//! the native handle of its element and a typed cache of the element's own
//! properties. Reads are served locally; every write and method call becomes
//! a command on the shared command buffer.
//!
//! Lifecycle:
//! 1. construction allocates the native handle and appends `create`
//!    before anything else can mention the new identity;
//! 2. property writes and `postMessage` append `set-property`/`invoke`;
//! 3. dropping the binding (engine finalization) hands the native handle to
//!    the release queue; it is freed once the consumer has applied every
//!    command issued up to that point.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use super::command_buffer::CommandSender;
use super::context::ScriptContext;
use super::factory::ElementClass;
use super::native::{NativeElement, NativeElementAllocator};
use super::property::{ElementKind, PropertyCache, Resolution};
use super::protocol::{ContextId, TargetId, UiCommandKind};
use super::release_queue::ReleaseQueue;
use super::value::ScriptValue;
use crate::core::error::{BindingError, BindingResult};

const POST_MESSAGE: &str = "postMessage";

/// General element behaviour for names no element kind claims.
///
/// Holds the read-only `tagName` and any expando properties scripts attach.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementBase {
    tag_name: String,
    expandos: BTreeMap<String, ScriptValue>,
}

impl ElementBase {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            tag_name: kind.tag().to_ascii_uppercase(),
            expandos: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> ScriptValue {
        if name == "tagName" {
            return ScriptValue::String(self.tag_name.clone());
        }
        self.expandos
            .get(name)
            .cloned()
            .unwrap_or(ScriptValue::Undefined)
    }

    pub fn set(&mut self, name: &str, value: ScriptValue) -> bool {
        if name != "tagName" {
            self.expandos.insert(name.to_string(), value);
        }
        true
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once("tagName").chain(self.expandos.keys().map(String::as_str))
    }
}

/// Script-side proxy of one native element.
pub struct ElementBinding {
    target: TargetId,
    kind: ElementKind,
    context: ContextId,
    cache: PropertyCache,
    base: ElementBase,
    native: Option<Box<NativeElement>>,
    prototype: Weak<ElementClass>,
    commands: CommandSender,
    releases: ReleaseQueue,
    allocator: Arc<dyn NativeElementAllocator>,
    number_precision: usize,
}

impl ElementBinding {
    pub(crate) fn new(ctx: &ScriptContext, class: &Arc<ElementClass>) -> Self {
        let shared = &ctx.shared;
        let kind = class.kind();
        let target = ctx.next_target();
        let native = shared.allocator.allocate(kind, target);

        let binding = Self {
            target,
            kind,
            context: ctx.id(),
            cache: PropertyCache::for_kind(kind),
            base: ElementBase::new(kind),
            native: Some(Box::new(native)),
            prototype: Arc::downgrade(class),
            commands: shared.commands.clone(),
            releases: shared.releases.clone(),
            allocator: Arc::clone(&shared.allocator),
            number_precision: shared.number_precision,
        };

        binding.commands.append(
            target,
            UiCommandKind::CreateElement {
                tag: kind.tag().to_string(),
            },
        );
        tracing::debug!(target: "bridge::element", id = %target, context = %binding.context, tag = kind.tag(), "element created");
        binding
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Property read. Never emits a command.
    pub fn get(&self, name: &str) -> ScriptValue {
        match self.kind.resolve(name) {
            Resolution::Own(descriptor) => descriptor.get(&self.cache),
            Resolution::PrototypeDelegated => self
                .prototype
                .upgrade()
                .map(|class| class.get(name))
                .unwrap_or(ScriptValue::Undefined),
            Resolution::NotFound => self.base.get(name),
        }
    }

    /// Property write. Always succeeds; own numeric properties accept any
    /// value and store its numeric coercion, NaN included.
    pub fn set(&mut self, name: &str, value: ScriptValue) -> bool {
        match self.kind.resolve(name) {
            Resolution::Own(descriptor) => {
                if let Some(native_value) = descriptor.set(&mut self.cache, &value) {
                    self.commands.append(
                        self.target,
                        UiCommandKind::SetProperty {
                            name: descriptor.name.to_string(),
                            value: native_value.to_wire(self.number_precision),
                        },
                    );
                }
                true
            }
            Resolution::PrototypeDelegated => self
                .prototype
                .upgrade()
                .map_or(true, |class| class.set(name, value)),
            Resolution::NotFound => self.base.set(name, value),
        }
    }

    /// General element names, then own names, then prototype names.
    pub fn property_names(&self) -> Vec<String> {
        self.base
            .property_names()
            .map(str::to_string)
            .chain(self.kind.property_names().map(str::to_string))
            .collect()
    }

    /// Calls a prototype method with this element as receiver.
    pub fn invoke(&self, method: &str, args: &[ScriptValue]) -> BindingResult<ScriptValue> {
        match (self.kind, method) {
            (ElementKind::Iframe, POST_MESSAGE) => {
                self.post_message(args)?;
                Ok(ScriptValue::Undefined)
            }
            _ => Err(BindingError::NotCallable {
                class: self.kind.class_name(),
                name: method.to_string(),
            }),
        }
    }

    /// `postMessage(message)`: forwards a copy of `message` to the native side.
    ///
    /// # Panics
    ///
    /// If the native side never bound `postMessage` for this element.
    pub fn post_message(&self, args: &[ScriptValue]) -> BindingResult<()> {
        let class = self.kind.class_name();
        let Some(first) = args.first() else {
            tracing::debug!(target: "bridge::element", id = %self.target, "postMessage without arguments");
            return Err(BindingError::ArgumentCount {
                class,
                method: POST_MESSAGE,
                required: 1,
                given: args.len(),
            });
        };
        let Some(message) = first.as_str() else {
            tracing::debug!(target: "bridge::element", id = %self.target, got = first.type_name(), "postMessage with non-string message");
            return Err(BindingError::ArgumentType {
                class,
                method: POST_MESSAGE,
                index: 1,
                expected: "string",
            });
        };

        let bound = self
            .native
            .as_ref()
            .is_some_and(|native| native.has_method(POST_MESSAGE));
        assert!(
            bound,
            "Failed to execute postMessage(): native method is not bound for element {}",
            self.target
        );

        self.commands.append(
            self.target,
            UiCommandKind::Invoke {
                method: POST_MESSAGE.to_string(),
                payload: message.to_owned(),
            },
        );
        Ok(())
    }
}

impl Drop for ElementBinding {
    fn drop(&mut self) {
        if let Some(native) = self.native.take() {
            tracing::debug!(target: "bridge::element", id = %self.target, "element finalized");
            let allocator = Arc::clone(&self.allocator);
            self.releases
                .enqueue(native, Box::new(move |element| allocator.release(element)));
        }
    }
}
