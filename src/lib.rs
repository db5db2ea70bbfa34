//! # Scene Anchor
//!
//! Per-object anchor that lets externally hosted, dynamically-evaluated
//! application state ride along with a scene-graph object through that
//! object's serialization lifecycle. All interpretation of the state lives in
//! an external script module, resolved lazily and at most once per process.
//!
//! ## Core Types
//!
//! - [`Anchor`] — per-scene-object payload holder and lifecycle dispatcher
//! - [`BindingRegistry`] — process-wide, once-only cache of resolved
//!   operation references
//! - [`ExternalBindings`] — capability seam between anchor and runtime
//! - [`ScriptRuntime`] / [`OpTable`] — production module registration and
//!   name-based operation resolution
//! - [`AnchorRecord`] — the scalar record the host persists
//!
//! ## Lifecycle
//!
//! The host fires three events on each anchor, in its own serialization
//! order: [`on_before_serialize`](Anchor::on_before_serialize) and
//! [`on_after_deserialize`](Anchor::on_after_deserialize) any number of
//! times, then [`on_destroy`](Anchor::on_destroy) exactly once. Every event
//! first ensures the bindings are initialized, then forwards to the resolved
//! operation, passing the anchor itself. Failures propagate to the host
//! unchanged; nothing is retried, logged-and-ignored, or defaulted.

mod anchor;
mod bindings;
mod error;
mod record;
mod registry;
mod runtime;

pub use anchor::{Anchor, AnchorId, LifecycleState, NIL_PAYLOAD};
pub use bindings::{
    ExternalBindings, ModuleRuntime, ScriptModule, ScriptOp, Value, ANCHOR_MODULE, DESERIALIZE_OP,
    DESTROY_OP, SERIALIZE_OP,
};
pub use error::{AnchorError, BindingResolutionError, ExternalOperationError};
pub use record::{AnchorRecord, RecordFormatError};
pub use registry::BindingRegistry;
pub use runtime::{OpTable, ScriptRuntime};
