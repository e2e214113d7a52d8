//! Native counterparts of script-visible elements.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::property::ElementKind;
use super::protocol::TargetId;

/// Script-side handle of a native element.
///
/// Owned by exactly one `ElementBinding` until it is handed to the release
/// queue. `methods` lists the native methods the native side has bound.
#[derive(Debug)]
pub struct NativeElement {
    target: TargetId,
    kind: ElementKind,
    methods: Vec<&'static str>,
}

impl NativeElement {
    pub fn new(target: TargetId, kind: ElementKind, methods: Vec<&'static str>) -> Self {
        Self {
            target,
            kind,
            methods,
        }
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| *m == name)
    }
}

/// Native element constructor/destructor pair.
///
/// `release` runs on the consumer thread.
pub trait NativeElementAllocator: Send + Sync {
    fn allocate(&self, kind: ElementKind, target: TargetId) -> NativeElement;

    fn release(&self, element: Box<NativeElement>);
}

/// Allocator that binds every prototype method of the element kind and
/// counts live handles.
#[derive(Debug, Default)]
pub struct DefaultAllocator {
    live: AtomicUsize,
}

impl DefaultAllocator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of handles allocated and not yet released.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

impl NativeElementAllocator for DefaultAllocator {
    fn allocate(&self, kind: ElementKind, target: TargetId) -> NativeElement {
        self.live.fetch_add(1, Ordering::AcqRel);
        NativeElement::new(target, kind, kind.prototype_names().to_vec())
    }

    fn release(&self, element: Box<NativeElement>) {
        tracing::debug!(target: "bridge::release", id = %element.target(), kind = element.kind().tag(), "native element freed");
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allocator_binds_prototype_methods() {
        let allocator = DefaultAllocator::new();
        let element = allocator.allocate(ElementKind::Iframe, TargetId(4));
        assert!(element.has_method("postMessage"));
        assert!(!element.has_method("width"));
        assert_eq!(allocator.live(), 1);

        allocator.release(Box::new(element));
        assert_eq!(allocator.live(), 0);
    }
}
