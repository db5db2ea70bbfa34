//! Capability traits between anchors and the external script runtime.
//!
//! The external runtime is specified only at this boundary: a single module,
//! loadable by a fixed identifier, exposing three operations resolvable by
//! fixed names. Everything behind [`ModuleRuntime`] — what the module actually
//! is, what the payload encodes — is opaque to this crate.
//!
//! [`ExternalBindings`] is the seam the [`Anchor`](crate::Anchor) dispatches
//! against. The production implementation is
//! [`BindingRegistry`](crate::BindingRegistry); tests substitute doubles.

use std::sync::Arc;

use crate::anchor::Anchor;
use crate::error::{AnchorError, BindingResolutionError, ExternalOperationError};

/// Fixed identifier of the script module that interprets anchor payloads.
pub const ANCHOR_MODULE: &str = "scene_vars";

/// Fixed name of the serialize operation within [`ANCHOR_MODULE`].
pub const SERIALIZE_OP: &str = "serialize";

/// Fixed name of the deserialize operation within [`ANCHOR_MODULE`].
pub const DESERIALIZE_OP: &str = "deserialize";

/// Fixed name of the destroy operation within [`ANCHOR_MODULE`].
pub const DESTROY_OP: &str = "destroy";

/// A value returned by a dynamically-typed script operation.
///
/// Only the serialize operation's return is interpreted (it must be
/// [`Text`](Value::Text)); deserialize and destroy returns are discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// No value.
    Nil,
    /// A textual value.
    Text(String),
}

impl Value {
    /// Short name of this value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Text(_) => "text",
        }
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A single resolved script operation.
///
/// The anchor passes itself to the operation so the operation can read or
/// overwrite [`Anchor::payload`] and key side-state by [`Anchor::id`].
///
/// Implemented for any matching closure, so hosts and tests can supply
/// operations as plain `Fn`s.
pub trait ScriptOp: Send + Sync {
    /// Runs the operation against `anchor`.
    fn invoke(&self, anchor: &mut Anchor) -> Result<Value, ExternalOperationError>;
}

impl<F> ScriptOp for F
where
    F: Fn(&mut Anchor) -> Result<Value, ExternalOperationError> + Send + Sync,
{
    fn invoke(&self, anchor: &mut Anchor) -> Result<Value, ExternalOperationError> {
        self(anchor)
    }
}

/// A loaded script module: name-based operation resolution.
pub trait ScriptModule: Send + Sync {
    /// Resolves an operation by name, or `None` if the module does not
    /// define it.
    fn op(&self, name: &str) -> Option<Arc<dyn ScriptOp>>;
}

impl core::fmt::Debug for dyn ScriptModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("dyn ScriptModule")
    }
}

/// The "load module" operation of the external runtime.
///
/// Loading may legitimately fail early in the host's startup (the module is
/// not loadable yet); callers are expected to retry on a later lifecycle
/// event. See [`ScriptRuntime`](crate::ScriptRuntime) for the production
/// implementation.
pub trait ModuleRuntime: Send + Sync {
    /// Loads the module named `module`.
    fn load_module(&self, module: &str) -> Result<Arc<dyn ScriptModule>, BindingResolutionError>;
}

/// The three external operations an anchor dispatches to, plus the one-time
/// initialization step that resolves them.
///
/// `serialize`, `deserialize` and `destroy` are defined only after
/// [`ensure_initialized`](Self::ensure_initialized) has succeeded; the
/// production implementation re-runs the (idempotent, cheap once resolved)
/// initialization internally so a mis-ordered call fails with a
/// [`BindingResolutionError`] rather than a panic.
pub trait ExternalBindings: Send + Sync {
    /// Loads the script module and resolves the three operations, at most
    /// once per process. Subsequent calls are no-ops. On failure the
    /// implementation must stay retryable.
    fn ensure_initialized(&self) -> Result<(), BindingResolutionError>;

    /// Invokes the serialize operation; returns the new payload text.
    fn serialize(&self, anchor: &mut Anchor) -> Result<String, AnchorError>;

    /// Invokes the deserialize operation; its return value is discarded.
    fn deserialize(&self, anchor: &mut Anchor) -> Result<(), AnchorError>;

    /// Invokes the destroy operation; its return value is discarded.
    fn destroy(&self, anchor: &mut Anchor) -> Result<(), AnchorError>;
}
