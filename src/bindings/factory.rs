//! Element construction and the per-context class registry.
//!
//! Each scripting context gets at most one [`ElementClass`] per element
//! kind: the script-visible constructor together with the shared prototype
//! that carries the kind's methods. Element instances are always new.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::context::ScriptContext;
use super::element::ElementBinding;
use super::property::ElementKind;
use super::protocol::ContextId;
use super::value::{NativeFunction, ScriptValue};

/// Constructor/prototype object of an element kind within one context.
#[derive(Debug)]
pub struct ElementClass {
    context: ContextId,
    kind: ElementKind,
}

impl ElementClass {
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Prototype lookup. Methods resolve to native functions, anything else
    /// is `undefined`.
    pub fn get(&self, name: &str) -> ScriptValue {
        self.kind
            .prototype_names()
            .iter()
            .find(|method| **method == name)
            .map(|method| ScriptValue::Function(NativeFunction { name: *method }))
            .unwrap_or(ScriptValue::Undefined)
    }

    /// Prototype methods are not writable; the assignment is accepted and
    /// dropped.
    pub fn set(&self, name: &str, _value: ScriptValue) -> bool {
        tracing::trace!(target: "bridge::element", class = self.name(), name, "ignored write to prototype method");
        true
    }

    /// Builds a new instance of this class.
    pub fn construct(self: &Arc<Self>, ctx: &ScriptContext) -> ElementBinding {
        ElementBinding::new(ctx, self)
    }
}

/// Creates element bindings and caches element classes per context.
#[derive(Debug, Default)]
pub struct ElementFactory {
    classes: Mutex<HashMap<(ContextId, ElementKind), Arc<ElementClass>>>,
    definitions: RwLock<HashMap<String, ElementKind>>,
}

impl ElementFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `tag` construct elements of `kind`.
    pub fn define_element(&self, tag: impl Into<String>, kind: ElementKind) {
        let tag = tag.into();
        tracing::debug!(target: "bridge::factory", tag = %tag, kind = kind.tag(), "element defined");
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag, kind);
    }

    /// Defines every built-in element kind under its own tag.
    pub fn register_builtin_elements(&self) {
        for kind in ElementKind::ALL {
            self.define_element(kind.tag(), kind);
        }
    }

    pub fn lookup(&self, tag: &str) -> Option<ElementKind> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .copied()
    }

    /// Returns the context's class for `kind`, creating it on first use.
    pub fn get_or_create(&self, ctx: &ScriptContext, kind: ElementKind) -> Arc<ElementClass> {
        let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        let class = classes.entry((ctx.id(), kind)).or_insert_with(|| {
            tracing::debug!(target: "bridge::factory", context = %ctx.id(), class = kind.class_name(), "class created");
            Arc::new(ElementClass {
                context: ctx.id(),
                kind,
            })
        });
        Arc::clone(class)
    }

    pub fn create_element(&self, ctx: &ScriptContext, kind: ElementKind) -> ElementBinding {
        self.get_or_create(ctx, kind).construct(ctx)
    }

    /// `None` for tags nobody defined.
    pub fn create_element_by_tag(&self, ctx: &ScriptContext, tag: &str) -> Option<ElementBinding> {
        let kind = self.lookup(tag)?;
        Some(self.create_element(ctx, kind))
    }

    /// Drops every cached class of `context`. Returns how many were removed.
    pub fn teardown_context(&self, context: ContextId) -> usize {
        let mut classes = self.classes.lock().unwrap_or_else(PoisonError::into_inner);
        let before = classes.len();
        classes.retain(|(ctx, _), _| *ctx != context);
        before - classes.len()
    }

    pub fn cached_classes(&self, context: ContextId) -> usize {
        self.classes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(ctx, _)| *ctx == context)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::context::Bridge;
    use crate::bindings::native::DefaultAllocator;
    use crate::config::BridgeConfig;

    #[test]
    fn test_class_is_singleton_per_context() {
        let (bridge, _queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
        let ctx = bridge.create_context();
        let other = bridge.create_context();

        let first = bridge.factory().get_or_create(&ctx, ElementKind::Iframe);
        let second = bridge.factory().get_or_create(&ctx, ElementKind::Iframe);
        let foreign = bridge.factory().get_or_create(&other, ElementKind::Iframe);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &foreign));
    }

    #[test]
    fn test_teardown_allocates_fresh_class() {
        let (bridge, _queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
        let ctx = bridge.create_context();

        let before = bridge.factory().get_or_create(&ctx, ElementKind::Iframe);
        assert_eq!(bridge.factory().teardown_context(ctx.id()), 1);
        let after = bridge.factory().get_or_create(&ctx, ElementKind::Iframe);

        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_instances_are_always_new() {
        let (bridge, _queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
        let ctx = bridge.create_context();

        let a = bridge.factory().create_element(&ctx, ElementKind::Iframe);
        let b = bridge.factory().create_element(&ctx, ElementKind::Iframe);
        assert_ne!(a.target(), b.target());
        assert_eq!(bridge.factory().cached_classes(ctx.id()), 1);
    }

    #[test]
    fn test_create_by_tag() {
        let (bridge, _queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
        let ctx = bridge.create_context();

        assert_eq!(bridge.factory().lookup("iframe"), Some(ElementKind::Iframe));
        assert!(ctx.create_element_by_tag("iframe").is_some());
        assert!(ctx.create_element_by_tag("video").is_none());

        bridge.factory().define_element("frame", ElementKind::Iframe);
        let frame = ctx.create_element_by_tag("frame").unwrap();
        assert_eq!(frame.kind(), ElementKind::Iframe);
    }

    #[test]
    fn test_prototype_lookup() {
        let (bridge, _queues) = Bridge::new(&BridgeConfig::default(), DefaultAllocator::new());
        let ctx = bridge.create_context();
        let class = ctx.element_class(ElementKind::Iframe);

        assert_eq!(
            class.get("postMessage"),
            ScriptValue::Function(NativeFunction { name: "postMessage" })
        );
        assert_eq!(class.get("width"), ScriptValue::Undefined);
        assert_eq!(class.name(), "IFrameElement");
        assert!(class.set("postMessage", ScriptValue::Null));
        assert_eq!(class.context(), ctx.id());
    }
}
