//! Per-object anchor and its lifecycle dispatch.
//!
//! An [`Anchor`] rides along with one scene object and carries the opaque
//! textual [`payload`](Anchor::payload) that the host persists with the
//! object. The host fires [`on_before_serialize`](Anchor::on_before_serialize)
//! and [`on_after_deserialize`](Anchor::on_after_deserialize) any number of
//! times over the anchor's life and [`on_destroy`](Anchor::on_destroy) exactly
//! once at end of life; the anchor translates those events into calls against
//! its [`ExternalBindings`], passing itself as the argument.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bindings::ExternalBindings;
use crate::error::AnchorError;

/// Sentinel payload meaning "no external state yet".
pub const NIL_PAYLOAD: &str = "nil";

/// Process-unique anchor identifier.
///
/// External operations use this to associate side-state with a particular
/// anchor; the id is never persisted and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(u64);

impl AnchorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Lifecycle state of an anchor.
///
/// There is no detached state: an anchor exists from creation until the host
/// destroys its scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Normal state; lifecycle events are accepted.
    Attached,
    /// `on_destroy` is running; observable by a destroy operation that
    /// inspects the anchor it was handed.
    Destroying,
    /// Terminal. All further lifecycle events are rejected with
    /// [`AnchorError::Destroyed`].
    Gone,
}

/// Per-scene-object holder of the opaque payload and lifecycle dispatcher.
///
/// The payload is a public field because the host owns its storage slot: it
/// is what gets written to and read from persisted scene data, as a plain
/// string, not an opaque handle. Its content is never interpreted here.
pub struct Anchor {
    /// Externally-opaque textual representation of the attached state.
    /// Defaults to [`NIL_PAYLOAD`].
    pub payload: String,
    id: AnchorId,
    state: LifecycleState,
    bindings: Arc<dyn ExternalBindings>,
}

impl Anchor {
    /// Creates an anchor for a newly instantiated or loaded scene object.
    ///
    /// The payload is initialized to [`NIL_PAYLOAD`] before any lifecycle
    /// event can fire.
    pub fn new(bindings: Arc<dyn ExternalBindings>) -> Self {
        Self {
            payload: NIL_PAYLOAD.to_string(),
            id: AnchorId::next(),
            state: LifecycleState::Attached,
            bindings,
        }
    }

    /// This anchor's process-unique id.
    pub fn id(&self) -> AnchorId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn ensure_attached(&self) -> Result<(), AnchorError> {
        match self.state {
            LifecycleState::Attached => Ok(()),
            LifecycleState::Destroying | LifecycleState::Gone => Err(AnchorError::Destroyed),
        }
    }

    /// Host event: the object is about to be persisted or snapshotted.
    ///
    /// Invokes the serialize operation and overwrites the payload with the
    /// string it produced — no merging, no partial update. On any error the
    /// payload keeps its previous value and the error propagates to the host.
    pub fn on_before_serialize(&mut self) -> Result<(), AnchorError> {
        self.ensure_attached()?;
        let bindings = Arc::clone(&self.bindings);
        bindings.ensure_initialized()?;
        let text = bindings.serialize(self)?;
        self.payload = text;
        Ok(())
    }

    /// Host event: the payload was just populated from persisted storage.
    ///
    /// Invokes the deserialize operation, which sees the freshly-loaded
    /// payload and is expected to reconstruct whatever external side-state it
    /// encodes. The operation's return value is discarded; the payload is
    /// left unchanged unless the operation itself mutates it.
    pub fn on_after_deserialize(&mut self) -> Result<(), AnchorError> {
        self.ensure_attached()?;
        let bindings = Arc::clone(&self.bindings);
        bindings.ensure_initialized()?;
        bindings.deserialize(self)
    }

    /// Host event: the scene object is being removed. Fires once.
    ///
    /// Invokes the destroy operation; this is the last operation ever invoked
    /// on this anchor, and the anchor is [`Gone`](LifecycleState::Gone)
    /// afterwards whether or not the operation succeeded. A second call is a
    /// host usage error and is rejected with [`AnchorError::Destroyed`]
    /// without invoking the operation again.
    pub fn on_destroy(&mut self) -> Result<(), AnchorError> {
        self.ensure_attached()?;
        self.state = LifecycleState::Destroying;
        let bindings = Arc::clone(&self.bindings);
        let result = match bindings.ensure_initialized() {
            Ok(()) => bindings.destroy(self),
            Err(e) => Err(e.into()),
        };
        self.state = LifecycleState::Gone;
        result
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}
