//! JavaScript Binding Adapter using rquickjs
//!
//! Exposes element bindings to QuickJS. Every element instance is a `Proxy`
//! whose own-property traffic is routed through an [`ElementBinding`];
//! everything else falls through to the proxy target, an ordinary object
//! inheriting from the per-kind class prototype, which is where the general
//! element behaviour and the kind's methods live.
//!
//! The proxy target also holds an [`ElementLease`], a QuickJS class object.
//! When the engine collects an element, the lease is finalized and the
//! binding is dropped, which queues the native handle for release.
//!
//! Script-visible surface:
//! - `document.createElement(tag)`
//! - one constructor per element kind (`new IFrameElement()`)
//! - kind methods on the constructor's prototype (`postMessage`)

use rquickjs::class::Trace;
use rquickjs::{CatchResultExt, Class, Context, Ctx, FromJs, Function, Object, Runtime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::context::ScriptContext;
use super::element::ElementBinding;
use super::property::ElementKind;
use super::protocol::{ScriptAdapter, TargetId};
use super::value::ScriptValue;
use crate::core::error::{BridgeError, BridgeResult};

const PRELUDE: &str = r#"
(function (global) {
    const ids = new WeakMap();
    const classes = {};
    const LEASE = Symbol('lease');

    function encode(value, numeric) {
        if (value === null) return ['null', 0, ''];
        switch (typeof value) {
            case 'number': return ['number', value, ''];
            case 'string': return ['string', 0, value];
            case 'boolean': return ['boolean', value ? 1 : 0, ''];
            case 'undefined': return ['undefined', 0, ''];
            default: return [typeof value, numeric ? Number(value) : NaN, ''];
        }
    }

    function wrap(id, tag) {
        const own = __bridge_own_names(tag);
        const methods = __bridge_methods(tag);
        const readOnly = __bridge_read_only(tag);
        const isOwn = (name) => typeof name === 'string' && own.indexOf(name) !== -1;
        const target = Object.create(classes[tag].prototype);
        Object.defineProperty(target, LEASE, { value: __bridge_lease(id) });
        const proxy = new Proxy(target, {
            get(t, name, receiver) {
                return isOwn(name) ? __bridge_get(id, name) : Reflect.get(t, name, receiver);
            },
            set(t, name, value, receiver) {
                if (isOwn(name)) {
                    const e = encode(value, true);
                    __bridge_set(id, name, e[0], e[1], e[2]);
                    return true;
                }
                if (methods.indexOf(name) !== -1) {
                    return true;
                }
                return Reflect.set(t, name, value, receiver);
            },
            has(t, name) {
                return isOwn(name) || Reflect.has(t, name);
            },
            ownKeys(t) {
                const keys = Reflect.ownKeys(t);
                return keys.concat(own.filter((name) => keys.indexOf(name) === -1));
            },
            getOwnPropertyDescriptor(t, name) {
                if (isOwn(name)) {
                    return {
                        value: __bridge_get(id, name),
                        writable: readOnly.indexOf(name) === -1,
                        enumerable: true,
                        configurable: true,
                    };
                }
                return Reflect.getOwnPropertyDescriptor(t, name);
            },
        });
        ids.set(proxy, id);
        return proxy;
    }

    function create(tag) {
        const id = __bridge_create(tag);
        if (id === undefined) {
            throw new TypeError("Failed to execute 'createElement': unsupported element '" + tag + "'");
        }
        return wrap(id, __bridge_kind_of(id));
    }

    for (const tag of __bridge_kinds()) {
        const className = __bridge_class_name(tag);
        const ctor = function () {
            if (new.target === undefined) {
                throw new TypeError("Failed to construct '" + className + "': Please use the 'new' operator");
            }
            return create(tag);
        };
        const tagName = tag.toUpperCase();
        Object.defineProperty(ctor.prototype, 'tagName', { get() { return tagName; } });
        for (const method of __bridge_methods(tag)) {
            ctor.prototype[method] = function (...args) {
                const id = ids.get(this);
                if (id === undefined) {
                    throw new TypeError("Illegal invocation");
                }
                const kinds = [], numbers = [], texts = [];
                for (const arg of args) {
                    const e = encode(arg, false);
                    kinds.push(e[0]);
                    numbers.push(e[1]);
                    texts.push(e[2]);
                }
                const error = __bridge_invoke(id, method, kinds, numbers, texts);
                if (error !== undefined) {
                    throw new TypeError(error);
                }
            };
        }
        classes[tag] = ctor;
        global[className] = ctor;
    }

    const document = global.document || {};
    document.createElement = function (tag) {
        return create(String(tag).toLowerCase());
    };
    global.document = document;
})(globalThis);
"#;

/// Rebuilds a script value from the prelude's `[type, number, text]` encoding.
fn decode_value(kind: &str, number: f64, text: String) -> ScriptValue {
    match kind {
        "undefined" => ScriptValue::Undefined,
        "null" => ScriptValue::Null,
        "boolean" => ScriptValue::Bool(number != 0.0),
        "string" => ScriptValue::String(text),
        // numbers, and objects the engine already reduced to a number
        _ => ScriptValue::Number(number),
    }
}

struct JsState {
    // Declared before `context` so bindings are finalized before the
    // context's classes are torn down.
    elements: HashMap<TargetId, ElementBinding>,
    context: ScriptContext,
}

fn lock(state: &Mutex<JsState>) -> MutexGuard<'_, JsState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine-owned token tying an element binding to the lifetime of its
/// script object. Finalizing the token finalizes the binding.
#[derive(Trace)]
#[rquickjs::class]
pub struct ElementLease {
    #[qjs(skip_trace)]
    target: TargetId,
    #[qjs(skip_trace)]
    state: Weak<Mutex<JsState>>,
}

impl Drop for ElementLease {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        // Taken out under the lock, dropped outside it.
        let released = lock(&state).elements.remove(&self.target);
        if released.is_some() {
            tracing::trace!(target: "bridge::js", id = %self.target, "element collected");
        }
    }
}

pub struct JsElementAdapter {
    // Field order matters: the JS context holds the native callbacks and
    // must go before the runtime.
    context: Context,
    runtime: Runtime,
    state: Arc<Mutex<JsState>>,
}

impl JsElementAdapter {
    /// Creates a QuickJS runtime bound to `ctx` and installs the element API.
    pub fn new(ctx: ScriptContext) -> BridgeResult<Self> {
        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;
        let adapter = Self {
            context,
            runtime,
            state: Arc::new(Mutex::new(JsState {
                elements: HashMap::new(),
                context: ctx,
            })),
        };
        adapter.bind_element_api()?;
        Ok(adapter)
    }

    fn bind_element_api(&self) -> BridgeResult<()> {
        let state = Arc::clone(&self.state);
        self.context.with(|ctx| install_element_api(&ctx, state))?;
        tracing::debug!(target: "bridge::js", "element API installed");
        Ok(())
    }

    /// Evaluates `code` and converts the completion value.
    pub fn eval<T>(&self, code: &str) -> BridgeResult<T>
    where
        T: for<'js> FromJs<'js>,
    {
        self.context.with(|ctx| {
            ctx.eval::<T, _>(code)
                .catch(&ctx)
                .map_err(|e| BridgeError::Script(e.to_string()))
        })
    }

    /// Finalizes the binding of `target` as if the engine had collected it.
    pub fn release(&self, target: TargetId) -> bool {
        let released = lock(&self.state).elements.remove(&target);
        released.is_some()
    }

    /// Number of element bindings the engine still references.
    pub fn live_elements(&self) -> usize {
        lock(&self.state).elements.len()
    }

    /// Identities of the live element bindings, ascending.
    pub fn targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<TargetId> = lock(&self.state).elements.keys().copied().collect();
        targets.sort();
        targets
    }

    fn run_pending_jobs(&self) {
        loop {
            match self.runtime.execute_pending_job() {
                Ok(true) => continue,
                Ok(false) => break,
                Err(_) => {
                    tracing::warn!(target: "bridge::js", "pending job threw");
                }
            }
        }
    }
}

fn install_element_api<'js>(ctx: &Ctx<'js>, state: Arc<Mutex<JsState>>) -> BridgeResult<()> {
    let global = ctx.globals();

    // __bridge_kinds() -> [tag]
    global.set(
        "__bridge_kinds",
        Function::new(ctx.clone(), || -> Vec<String> {
            ElementKind::ALL.iter().map(|k| k.tag().to_string()).collect()
        })?,
    )?;

    // __bridge_class_name(tag) -> name
    global.set(
        "__bridge_class_name",
        Function::new(ctx.clone(), |tag: String| -> Option<String> {
            ElementKind::from_tag(&tag).map(|k| k.class_name().to_string())
        })?,
    )?;

    // __bridge_methods(tag) -> [name]
    global.set(
        "__bridge_methods",
        Function::new(ctx.clone(), |tag: String| -> Vec<String> {
            ElementKind::from_tag(&tag)
                .map(|k| k.prototype_names().iter().map(|n| n.to_string()).collect())
                .unwrap_or_default()
        })?,
    )?;

    // __bridge_own_names(tag) -> [name]
    global.set(
        "__bridge_own_names",
        Function::new(ctx.clone(), |tag: String| -> Vec<String> {
            ElementKind::from_tag(&tag)
                .map(|k| k.descriptors().iter().map(|d| d.name.to_string()).collect())
                .unwrap_or_default()
        })?,
    )?;

    // __bridge_create(tag) -> id | undefined
    let s = Arc::clone(&state);
    global.set(
        "__bridge_create",
        Function::new(ctx.clone(), move |tag: String| -> Option<u64> {
            let mut state = lock(&s);
            let element = state.context.create_element_by_tag(&tag)?;
            let target = element.target();
            state.elements.insert(target, element);
            Some(target.0)
        })?,
    )?;

    // __bridge_kind_of(id) -> tag
    let s = Arc::clone(&state);
    global.set(
        "__bridge_kind_of",
        Function::new(ctx.clone(), move |id: u64| -> Option<String> {
            lock(&s)
                .elements
                .get(&TargetId(id))
                .map(|element| element.kind().tag().to_string())
        })?,
    )?;

    // __bridge_get(id, name) -> number | undefined
    // Own properties of the registered kinds are numeric or undefined.
    let s = Arc::clone(&state);
    global.set(
        "__bridge_get",
        Function::new(ctx.clone(), move |id: u64, name: String| -> Option<f64> {
            lock(&s)
                .elements
                .get(&TargetId(id))
                .and_then(|element| element.get(&name).as_number())
        })?,
    )?;

    // __bridge_set(id, name, type, number, text)
    let s = Arc::clone(&state);
    global.set(
        "__bridge_set",
        Function::new(
            ctx.clone(),
            move |id: u64, name: String, kind: String, number: f64, text: String| -> bool {
                match lock(&s).elements.get_mut(&TargetId(id)) {
                    Some(element) => element.set(&name, decode_value(&kind, number, text)),
                    None => true,
                }
            },
        )?,
    )?;

    // __bridge_invoke(id, method, types, numbers, texts) -> error | undefined
    let s = Arc::clone(&state);
    global.set(
        "__bridge_invoke",
        Function::new(
            ctx.clone(),
            move |id: u64,
                  method: String,
                  kinds: Vec<String>,
                  numbers: Vec<f64>,
                  texts: Vec<String>|
                  -> Option<String> {
                let args: Vec<ScriptValue> = kinds
                    .iter()
                    .zip(numbers)
                    .zip(texts)
                    .map(|((kind, number), text)| decode_value(kind, number, text))
                    .collect();
                let state = lock(&s);
                let Some(element) = state.elements.get(&TargetId(id)) else {
                    return Some("Illegal invocation".to_string());
                };
                element.invoke(&method, &args).err().map(|e| e.to_string())
            },
        )?,
    )?;

    // __bridge_read_only(tag) -> [name]
    global.set(
        "__bridge_read_only",
        Function::new(ctx.clone(), |tag: String| -> Vec<String> {
            ElementKind::from_tag(&tag)
                .map(|k| {
                    k.descriptors()
                        .iter()
                        .filter(|d| d.is_read_only())
                        .map(|d| d.name.to_string())
                        .collect()
                })
                .unwrap_or_default()
        })?,
    )?;

    // __bridge_lease(id) -> ElementLease
    let weak = Arc::downgrade(&state);
    global.set(
        "__bridge_lease",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, id: u64| -> rquickjs::Result<Class<'js, ElementLease>> {
                Class::instance(
                    ctx,
                    ElementLease {
                        target: TargetId(id),
                        state: weak.clone(),
                    },
                )
            },
        )?,
    )?;

    // console.log / console.warn / console.error
    let console = Object::new(ctx.clone())?;
    console.set(
        "log",
        Function::new(ctx.clone(), |msg: String| {
            tracing::info!(target: "script.console", "{}", msg);
        })?,
    )?;
    console.set(
        "warn",
        Function::new(ctx.clone(), |msg: String| {
            tracing::warn!(target: "script.console", "{}", msg);
        })?,
    )?;
    console.set(
        "error",
        Function::new(ctx.clone(), |msg: String| {
            tracing::error!(target: "script.console", "{}", msg);
        })?,
    )?;
    global.set("console", console)?;

    ctx.eval::<(), _>(PRELUDE)
        .catch(ctx)
        .map_err(|e| BridgeError::Script(e.to_string()))?;
    Ok(())
}

impl ScriptAdapter for JsElementAdapter {
    fn execute(&self, code: &str) -> BridgeResult<()> {
        self.eval::<()>(code)
    }

    fn collect_garbage(&self) {
        self.runtime.run_gc();
        self.run_pending_jobs();
    }

    fn shutdown(&mut self) {
        let finalized: Vec<ElementBinding> = lock(&self.state).elements.drain().map(|(_, e)| e).collect();
        tracing::debug!(target: "bridge::js", count = finalized.len(), "finalizing remaining elements");
        drop(finalized);
    }
}

impl Drop for JsElementAdapter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
