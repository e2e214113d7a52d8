//! Element Binding Layer
//!
//! Script-visible element objects that own native handles and talk to the
//! native side only through ordered queues.
//!
//! Architecture:
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Script Engine (JS)                       │
//! │        document.createElement / new IFrameElement()          │
//! │                            │                                 │
//! │                            v                                 │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │   ElementFactory ─ per-context ElementClass singleton  │  │
//! │  │   ElementBinding ─ property cache + native handle      │  │
//! │  └──────────┬───────────────────────────────┬─────────────┘  │
//! │             │ create / set / invoke         │ on finalize    │
//! │             v                               v                │
//! │  ┌────────────────────┐          ┌────────────────────────┐  │
//! │  │   Command Buffer   │  fence   │  Deferred Release Queue│  │
//! │  └─────────┬──────────┘ <─────── └───────────┬────────────┘  │
//! │            │                                 │               │
//! │            v                                 v               │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          NativeConsumer (UI thread) ─ NativeHost       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod command_buffer;
pub mod consumer;
pub mod context;
pub mod element;
pub mod factory;
pub mod js;
pub mod native;
pub mod property;
pub mod protocol;
pub mod release_queue;
pub mod value;

pub use command_buffer::{command_buffer, CommandReceiver, CommandSender};
pub use consumer::{DrainStats, LoggingHost, MirrorHost, MirrorState, MirroredElement, NativeConsumer, NativeHost};
pub use context::{Bridge, ConsumerQueues, ScriptContext};
pub use element::{ElementBase, ElementBinding};
pub use factory::{ElementClass, ElementFactory};
pub use js::JsElementAdapter;
pub use native::{DefaultAllocator, NativeElement, NativeElementAllocator};
pub use property::{ElementKind, NativeValue, PropertyCache, PropertyDescriptor, Resolution};
pub use protocol::*;
pub use release_queue::{release_queue, Destructor, ReleaseEntry, ReleaseQueue, ReleaseReceiver};
pub use value::{NativeFunction, ScriptValue};
