//! Dispatch result types and errors.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::types::Registration;
use crate::conversion::Conversion;
use crate::types::Signature;

/// Outcome of ranking a registry snapshot against one call.
#[derive(Debug, Clone)]
pub enum Selection {
    /// A unique most specific registration was found.
    Resolved(Arc<Registration>),
    /// A unique registration was found after converting arguments.
    Converted {
        registration: Arc<Registration>,
        conversions: Vec<Option<Conversion>>,
    },
    /// No applicable registrations.
    NoMatch,
    /// Several registrations survive; all are listed.
    Ambiguous(Vec<Arc<Registration>>),
}

/// Error when no registration accepts the arguments.
#[derive(Debug, Clone, Error)]
#[error(
    "no implementation of `{operation}` accepts {arg_types}; registered: {}",
    SignatureList(.candidates)
)]
pub struct NoMatchError {
    /// The operation that was called.
    pub operation: String,
    /// The argument types provided.
    pub arg_types: Signature,
    /// All signatures that were considered.
    pub candidates: Vec<Signature>,
}

/// Error when several registrations are equally specific.
#[derive(Debug, Clone, Error)]
#[error(
    "ambiguous call `{operation}{arg_types}`: candidates {}",
    SignatureList(.candidates)
)]
pub struct AmbiguityError {
    /// The operation that was called.
    pub operation: String,
    /// The argument types provided.
    pub arg_types: Signature,
    /// The tied signatures (all maximal, equal precedence).
    pub candidates: Vec<Signature>,
}

impl AmbiguityError {
    /// Whether the tie arose only during conversion fallback, i.e. several
    /// minimal conversion sets reached an implementation.
    pub fn is_conversion_tie(&self) -> bool {
        !self
            .candidates
            .iter()
            .any(|candidate| self.arg_types.le(candidate))
    }
}

struct SignatureList<'a>(&'a [Signature]);

impl fmt::Display for SignatureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none");
        }
        for (i, signature) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{signature}")?;
        }
        Ok(())
    }
}
