//! Production script runtime: name-keyed module registration and lookup.
//!
//! The embedding host registers the module that interprets anchor payloads
//! under the fixed [`ANCHOR_MODULE`](crate::ANCHOR_MODULE) id, typically
//! during its own scripting bootstrap. Registration may happen *after* the
//! first anchor exists — the whole point of the registry's deferred
//! resolution is that an early lifecycle event fails with a retryable
//! [`BindingResolutionError`](crate::BindingResolutionError) and a later one
//! succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::anchor::Anchor;
use crate::bindings::{ModuleRuntime, ScriptModule, ScriptOp, Value};
use crate::error::{BindingResolutionError, ExternalOperationError};

/// Name-keyed table of registered script modules.
#[derive(Default)]
pub struct ScriptRuntime {
    modules: Mutex<HashMap<String, Arc<dyn ScriptModule>>>,
}

impl ScriptRuntime {
    /// Creates an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a module under `id`.
    pub fn register_module(&self, id: impl Into<String>, module: Arc<dyn ScriptModule>) {
        self.modules.lock().insert(id.into(), module);
    }
}

impl ModuleRuntime for ScriptRuntime {
    fn load_module(&self, module: &str) -> Result<Arc<dyn ScriptModule>, BindingResolutionError> {
        self.modules.lock().get(module).cloned().ok_or_else(|| {
            BindingResolutionError::ModuleLoad {
                module: module.to_string(),
                reason: "module is not registered with the script runtime".to_string(),
            }
        })
    }
}

/// A [`ScriptModule`] built from name → operation entries.
///
/// ```
/// use scene_anchor::{OpTable, Value};
///
/// let module = OpTable::new()
///     .with_op("serialize", |anchor: &mut scene_anchor::Anchor| {
///         Ok(anchor.payload.clone().into())
///     })
///     .with_op("deserialize", |_: &mut scene_anchor::Anchor| Ok(Value::Nil))
///     .with_op("destroy", |_: &mut scene_anchor::Anchor| Ok(Value::Nil));
/// assert!(module.has_op("serialize"));
/// ```
#[derive(Default)]
pub struct OpTable {
    ops: HashMap<String, Arc<dyn ScriptOp>>,
}

impl OpTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation given as a closure, returning the table.
    pub fn with_op<F>(mut self, name: impl Into<String>, op: F) -> Self
    where
        F: Fn(&mut Anchor) -> Result<Value, ExternalOperationError> + Send + Sync + 'static,
    {
        self.ops.insert(name.into(), Arc::new(op));
        self
    }

    /// Adds a pre-built operation reference.
    pub fn insert(&mut self, name: impl Into<String>, op: Arc<dyn ScriptOp>) {
        self.ops.insert(name.into(), op);
    }

    /// Whether the table defines an operation named `name`.
    pub fn has_op(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }
}

impl ScriptModule for OpTable {
    fn op(&self, name: &str) -> Option<Arc<dyn ScriptOp>> {
        self.ops.get(name).cloned()
    }
}
