// ── Core error taxonomy ──
//
// Resource-level failures. Parameter and state violations are raised
// before any network traffic; protocol-contract violations (kind tags,
// unregistered kinds, incompatible keys) after the response arrives.
// HTTP failures the core does not specifically interpret pass through
// as `Api` unchanged -- the core never swallows unrecognized errors.

use thiserror::Error;

/// Unified error type for the resource-binding core.
#[derive(Debug, Error)]
pub enum Error {
    // ── Parameter validation (pre-network) ──────────────────────────
    /// A required key was absent from the supplied parameters.
    #[error("Missing required parameters: {}", missing.join(", "))]
    MissingParameter { missing: Vec<String> },

    /// Two or more keys from a mutually-exclusive set were supplied.
    #[error("Mutually exclusive parameters supplied together: {}", attrs.join(", "))]
    ExclusiveAttributes { attrs: Vec<String> },

    /// Both keys of a boolean reduction pair carry the same truth value.
    #[error("Boolean pair '{0}'/'{1}' supplied with the same value", pair.0, pair.1)]
    BooleansSameValue { pair: (String, String) },

    /// A parameter value is outside the endpoint's declared allow-list.
    #[error("Invalid value for '{param}': {message}")]
    InvalidParameterValue { param: String, message: String },

    // ── Lifecycle ───────────────────────────────────────────────────
    /// A second attempt to establish a URI on an already-bound instance.
    /// Always a programming error, never a retryable condition.
    #[error("URI already assigned for this instance: {uri}")]
    UriReassignment { uri: String },

    /// A verb was invoked in a lifecycle state that does not permit it.
    #[error("Cannot {operation} a resource in state '{state}'")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// The endpoint's declared verb set does not include this operation.
    #[error("Operation '{operation}' is not supported by {type_id}")]
    UnsupportedOperation {
        operation: &'static str,
        type_id: &'static str,
    },

    /// No child with this name is registered on the node's descriptor.
    #[error("No child named '{name}' under {type_id}")]
    UnknownChild {
        name: String,
        type_id: &'static str,
    },

    // ── Protocol contract (post-network) ────────────────────────────
    /// The response kind tag does not match the declared expectation.
    #[error("Kind mismatch: expected '{expected}', device sent '{actual}'")]
    KindMismatch { expected: String, actual: String },

    /// A collection item's kind tag has no registered handler.
    #[error("No registered type for kind '{kind}'")]
    UnregisteredKind { kind: String },

    /// Server JSON carries a key that cannot become an attribute.
    #[error("Incompatible attribute key '{key}': {reason}")]
    IncompatibleKey { key: String, reason: String },

    /// The response lacks a field the binding protocol requires.
    #[error("Malformed device response: {message}")]
    MalformedResponse { message: String },

    // ── Optimistic concurrency ──────────────────────────────────────
    /// The device's generation counter moved past the client's cached
    /// value. Stale client state -- re-load and retry manually.
    #[error("Generation mismatch: client has {local}, device has {remote}")]
    GenerationMismatch { local: i64, remote: i64 },

    // ── Transport passthrough ───────────────────────────────────────
    /// An HTTP failure the core does not interpret, re-raised verbatim.
    #[error(transparent)]
    Api(#[from] icontrol_api::Error),
}

impl Error {
    /// Returns the HTTP status carried by a passthrough error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status(),
            _ => None,
        }
    }
}
