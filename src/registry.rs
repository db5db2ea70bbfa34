//! Process-wide registry of resolved script operation references.
//!
//! The [`BindingRegistry`] is the production [`ExternalBindings`]
//! implementation. It defers module loading to the first lifecycle event
//! (the script module may not be loadable yet when the anchor type is first
//! referenced by the host) and guarantees that the load-and-resolve sequence
//! executes at most once per registry, no matter how many anchors exist or
//! how many threads fire their first event simultaneously.

use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::anchor::Anchor;
use crate::bindings::{
    ExternalBindings, ModuleRuntime, ScriptModule, ScriptOp, Value, ANCHOR_MODULE, DESERIALIZE_OP,
    DESTROY_OP, SERIALIZE_OP,
};
use crate::error::{AnchorError, BindingResolutionError, ExternalOperationError};

/// The three operation references, present only after full resolution.
struct ResolvedOps {
    serialize: Arc<dyn ScriptOp>,
    deserialize: Arc<dyn ScriptOp>,
    destroy: Arc<dyn ScriptOp>,
}

/// Partial resolution progress, kept across failed attempts.
///
/// Each slot is assigned at most once; a retry after a partial failure picks
/// up where the previous attempt stopped instead of re-loading the module or
/// re-resolving operations that already succeeded.
#[derive(Default)]
struct PendingResolution {
    module: Option<Arc<dyn ScriptModule>>,
    serialize: Option<Arc<dyn ScriptOp>>,
    deserialize: Option<Arc<dyn ScriptOp>>,
    destroy: Option<Arc<dyn ScriptOp>>,
}

fn resolve_slot(
    slot: &mut Option<Arc<dyn ScriptOp>>,
    module: &dyn ScriptModule,
    name: &str,
) -> Result<Arc<dyn ScriptOp>, BindingResolutionError> {
    if let Some(op) = slot {
        return Ok(Arc::clone(op));
    }
    let op = module
        .op(name)
        .ok_or_else(|| BindingResolutionError::OpNotFound {
            module: ANCHOR_MODULE.to_string(),
            name: name.to_string(),
        })?;
    *slot = Some(Arc::clone(&op));
    Ok(op)
}

/// Lazily populated cache of the script module's operation references.
///
/// One registry per process is the intended shape; see
/// [`install`](BindingRegistry::install). Tests construct their own instances
/// (or bypass the registry entirely with an [`ExternalBindings`] double) and
/// never touch process-wide state.
pub struct BindingRegistry {
    runtime: Arc<dyn ModuleRuntime>,
    pending: Mutex<PendingResolution>,
    // Set exactly once, only on fully successful resolution. Reads after
    // that point take no lock.
    ready: OnceLock<ResolvedOps>,
}

static SHARED: OnceLock<Arc<BindingRegistry>> = OnceLock::new();

impl BindingRegistry {
    /// Creates a registry that resolves bindings through `runtime`.
    ///
    /// No loading happens here; resolution is deferred to the first
    /// [`ensure_initialized`](ExternalBindings::ensure_initialized) call.
    pub fn new(runtime: Arc<dyn ModuleRuntime>) -> Self {
        Self {
            runtime,
            pending: Mutex::new(PendingResolution::default()),
            ready: OnceLock::new(),
        }
    }

    /// Installs `registry` as the process-wide registry.
    ///
    /// Returns `false` if one was already installed (the existing one wins).
    pub fn install(registry: Arc<BindingRegistry>) -> bool {
        SHARED.set(registry).is_ok()
    }

    /// The process-wide registry, if one has been installed.
    pub fn shared() -> Option<Arc<BindingRegistry>> {
        SHARED.get().cloned()
    }

    /// Whether the module is loaded and all three operations are resolved.
    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    fn ops(&self) -> Result<&ResolvedOps, BindingResolutionError> {
        if let Some(ops) = self.ready.get() {
            return Ok(ops);
        }
        let mut pending = self.pending.lock();
        // Another thread may have completed resolution while we waited.
        if let Some(ops) = self.ready.get() {
            return Ok(ops);
        }
        let module = match &pending.module {
            Some(module) => Arc::clone(module),
            None => {
                let module = self.runtime.load_module(ANCHOR_MODULE)?;
                pending.module = Some(Arc::clone(&module));
                module
            }
        };
        let serialize = resolve_slot(&mut pending.serialize, module.as_ref(), SERIALIZE_OP)?;
        let deserialize = resolve_slot(&mut pending.deserialize, module.as_ref(), DESERIALIZE_OP)?;
        let destroy = resolve_slot(&mut pending.destroy, module.as_ref(), DESTROY_OP)?;
        log::debug!("resolved script bindings for module '{ANCHOR_MODULE}'");
        Ok(self.ready.get_or_init(|| ResolvedOps {
            serialize,
            deserialize,
            destroy,
        }))
    }
}

impl ExternalBindings for BindingRegistry {
    fn ensure_initialized(&self) -> Result<(), BindingResolutionError> {
        self.ops().map(|_| ())
    }

    fn serialize(&self, anchor: &mut Anchor) -> Result<String, AnchorError> {
        // Clone the reference out so no registry lock is held while the
        // external operation runs.
        let op = Arc::clone(&self.ops()?.serialize);
        match op.invoke(anchor)? {
            Value::Text(text) => Ok(text),
            other => Err(ExternalOperationError::new(format!(
                "serialize operation returned {} where text was expected",
                other.kind()
            ))
            .into()),
        }
    }

    fn deserialize(&self, anchor: &mut Anchor) -> Result<(), AnchorError> {
        let op = Arc::clone(&self.ops()?.deserialize);
        op.invoke(anchor)?;
        Ok(())
    }

    fn destroy(&self, anchor: &mut Anchor) -> Result<(), AnchorError> {
        let op = Arc::clone(&self.ops()?.destroy);
        op.invoke(anchor)?;
        Ok(())
    }
}
