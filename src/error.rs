//! Error types for binding resolution and lifecycle dispatch.

use thiserror::Error;

/// Binding resolution failure.
///
/// Raised by [`ensure_initialized`](crate::ExternalBindings::ensure_initialized)
/// when the script module cannot be loaded or a required operation name is
/// missing from it. The registry performs no internal retries, but it is left
/// in a state where a later call can retry — resolution is never poisoned by
/// a failed attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingResolutionError {
    /// The script module could not be loaded by the runtime.
    #[error("failed to load script module '{module}': {reason}")]
    ModuleLoad { module: String, reason: String },
    /// A required operation name was not found in the loaded module.
    #[error("operation '{name}' not found in script module '{module}'")]
    OpNotFound { module: String, name: String },
}

/// Failure raised by an external script operation during execution.
///
/// Propagated verbatim to the caller; the anchor adds no context and performs
/// no recovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ExternalOperationError(pub String);

impl ExternalOperationError {
    /// Creates an error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced by an anchor's lifecycle methods.
///
/// Both binding and external-operation failures cross the boundary back to
/// the host uncaught: there is no fallback payload and no suppression. How a
/// failure becomes user-visible is entirely up to the host's own lifecycle
/// error reporting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// Binding resolution failed; the registry stays retryable.
    #[error(transparent)]
    Binding(#[from] BindingResolutionError),
    /// The external operation itself failed.
    #[error(transparent)]
    External(#[from] ExternalOperationError),
    /// A lifecycle event arrived on an anchor that already received
    /// `on_destroy`. Hosts must fire `on_destroy` exactly once.
    #[error("lifecycle event on a destroyed anchor")]
    Destroyed,
}
