//! Per-kind property descriptor tables.
//!
//! Each element kind owns a static, read-only table mapping property names
//! to either a typed accessor over the binding's property cache or to the
//! shared prototype of the kind. Tables are `'static` and never mutated, so
//! any number of bindings on any thread may read them.

use std::fmt;

use super::value::{number_to_wire, ScriptValue};

/// Immutable tag selecting a descriptor table and native payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Iframe,
}

impl ElementKind {
    pub const ALL: [ElementKind; 1] = [ElementKind::Iframe];

    /// Tag carried by the `create` command.
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Iframe => "iframe",
        }
    }

    /// Name of the script-visible constructor.
    pub fn class_name(self) -> &'static str {
        match self {
            ElementKind::Iframe => "IFrameElement",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn descriptors(self) -> &'static [PropertyDescriptor] {
        match self {
            ElementKind::Iframe => IFRAME_PROPERTIES,
        }
    }

    /// Names served by the shared prototype (methods).
    pub fn prototype_names(self) -> &'static [&'static str] {
        match self {
            ElementKind::Iframe => &["postMessage"],
        }
    }

    /// Number of numeric slots an instance's property cache needs.
    pub fn cache_slots(self) -> usize {
        match self {
            ElementKind::Iframe => 2,
        }
    }

    /// Case-sensitive lookup of `name`.
    pub fn resolve(self, name: &str) -> Resolution {
        if let Some(descriptor) = self.descriptors().iter().find(|d| d.name == name) {
            return Resolution::Own(descriptor);
        }
        if self.prototype_names().iter().any(|n| *n == name) {
            return Resolution::PrototypeDelegated;
        }
        Resolution::NotFound
    }

    /// Own names followed by prototype names, in table order.
    pub fn property_names(self) -> impl Iterator<Item = &'static str> {
        self.descriptors()
            .iter()
            .map(|d| d.name)
            .chain(self.prototype_names().iter().copied())
    }
}

/// Result of resolving a property name against a kind's table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    NotFound,
    Own(&'static PropertyDescriptor),
    PrototypeDelegated,
}

/// Reads a typed value out of the cache.
pub type Getter = fn(&PropertyCache) -> ScriptValue;

/// Converts a script value, stores it in the cache and returns the native
/// value to forward.
pub type Setter = fn(&mut PropertyCache, &ScriptValue) -> NativeValue;

/// An own property handled by the binding itself.
pub struct PropertyDescriptor {
    pub name: &'static str,
    getter: Getter,
    setter: Option<Setter>,
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl PropertyDescriptor {
    pub fn get(&self, cache: &PropertyCache) -> ScriptValue {
        (self.getter)(cache)
    }

    /// `None` when the property is read-only.
    pub fn set(&self, cache: &mut PropertyCache, value: &ScriptValue) -> Option<NativeValue> {
        self.setter.map(|setter| setter(cache, value))
    }

    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

/// Native-typed value of an own property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    Number(f64),
}

impl NativeValue {
    pub fn to_wire(self, precision: usize) -> String {
        match self {
            NativeValue::Number(n) => number_to_wire(n, precision),
        }
    }
}

/// Typed storage for own properties. Slots start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCache {
    numbers: Vec<f64>,
}

impl PropertyCache {
    pub fn for_kind(kind: ElementKind) -> Self {
        Self {
            numbers: vec![0.0; kind.cache_slots()],
        }
    }

    pub fn number(&self, slot: usize) -> f64 {
        self.numbers.get(slot).copied().unwrap_or(f64::NAN)
    }

    fn store_number(&mut self, slot: usize, value: &ScriptValue) -> NativeValue {
        let number = value.to_number();
        if let Some(cell) = self.numbers.get_mut(slot) {
            *cell = number;
        }
        NativeValue::Number(number)
    }
}

const IFRAME_WIDTH: usize = 0;
const IFRAME_HEIGHT: usize = 1;

fn iframe_width(cache: &PropertyCache) -> ScriptValue {
    ScriptValue::Number(cache.number(IFRAME_WIDTH))
}

fn set_iframe_width(cache: &mut PropertyCache, value: &ScriptValue) -> NativeValue {
    cache.store_number(IFRAME_WIDTH, value)
}

fn iframe_height(cache: &PropertyCache) -> ScriptValue {
    ScriptValue::Number(cache.number(IFRAME_HEIGHT))
}

fn set_iframe_height(cache: &mut PropertyCache, value: &ScriptValue) -> NativeValue {
    cache.store_number(IFRAME_HEIGHT, value)
}

// Cross-document window objects are not materialized.
fn iframe_content_window(_cache: &PropertyCache) -> ScriptValue {
    ScriptValue::Undefined
}

static IFRAME_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor {
        name: "width",
        getter: iframe_width,
        setter: Some(set_iframe_width),
    },
    PropertyDescriptor {
        name: "height",
        getter: iframe_height,
        setter: Some(set_iframe_height),
    },
    PropertyDescriptor {
        name: "contentWindow",
        getter: iframe_content_window,
        setter: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_iframe_names() {
        let kind = ElementKind::Iframe;
        assert!(matches!(kind.resolve("width"), Resolution::Own(d) if d.name == "width"));
        assert!(matches!(kind.resolve("contentWindow"), Resolution::Own(d) if d.is_read_only()));
        assert_eq!(kind.resolve("postMessage"), Resolution::PrototypeDelegated);
        assert_eq!(kind.resolve("Width"), Resolution::NotFound);
        assert_eq!(kind.resolve("src"), Resolution::NotFound);
    }

    #[test]
    fn test_property_names_are_stable() {
        let names: Vec<_> = ElementKind::Iframe.property_names().collect();
        assert_eq!(names, vec!["width", "height", "contentWindow", "postMessage"]);
    }

    #[test]
    fn test_setter_coerces_and_caches() {
        let mut cache = PropertyCache::for_kind(ElementKind::Iframe);
        let Resolution::Own(width) = ElementKind::Iframe.resolve("width") else {
            panic!("width should be an own property");
        };

        let forwarded = width.set(&mut cache, &ScriptValue::from("250"));
        assert_eq!(forwarded, Some(NativeValue::Number(250.0)));
        assert_eq!(width.get(&cache), ScriptValue::Number(250.0));
        assert_eq!(cache.number(IFRAME_HEIGHT), 0.0);
    }

    #[test]
    fn test_read_only_placeholder() {
        let mut cache = PropertyCache::for_kind(ElementKind::Iframe);
        let Resolution::Own(window) = ElementKind::Iframe.resolve("contentWindow") else {
            panic!("contentWindow should be an own property");
        };
        assert_eq!(window.set(&mut cache, &ScriptValue::Null), None);
        assert_eq!(window.get(&cache), ScriptValue::Undefined);
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(ElementKind::from_tag("iframe"), Some(ElementKind::Iframe));
        assert_eq!(ElementKind::from_tag("IFRAME"), None);
        assert_eq!(NativeValue::Number(1.0).to_wire(1), "1.0");
    }
}
