//! Error types.

use thiserror::Error;

pub use crate::dispatch::{AmbiguityError, NoMatchError};
use crate::types::{Signature, Type};

/// Errors raised by registration, resolution and invocation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    NoMatch(#[from] NoMatchError),

    #[error(transparent)]
    Ambiguous(#[from] AmbiguityError),

    #[error("`{operation}{signature}` returned {actual}, expected {expected}")]
    ReturnTypeViolation {
        operation: String,
        signature: Signature,
        expected: Type,
        actual: Type,
    },

    #[error("malformed signature {signature}: only the last type may be varargs")]
    MalformedSignature { signature: String },

    #[error("malformed type: {message}")]
    MalformedType { message: String },

    #[error("`Self` used in `{operation}`, which is not owned by a class")]
    UnboundSelf { operation: String },

    #[error("conversion from {from} to {to} produced a value of type {actual}")]
    Conversion { from: Type, to: Type, actual: Type },

    #[error("fallback for `{operation}` would form a cycle")]
    FallbackCycle { operation: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl DispatchError {
    /// Whether this error means resolution failed, as opposed to a contract
    /// violation or a registration error.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, DispatchError::NoMatch(_) | DispatchError::Ambiguous(_))
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
