//! Signatures: ordered tuples of lattice types.

use std::fmt;
use std::iter;
use std::sync::Arc;

use tracing::trace;

use super::{Class, Type};
use crate::error::{DispatchError, DispatchResult};
use crate::value::Value;

/// The accepted argument types of one implementation, or the runtime
/// argument types of one call.
///
/// Only the last element may be [`Type::VarArgs`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    types: Arc<[Type]>,
}

impl Signature {
    /// Build a signature from normalized types, rejecting varargs in any but
    /// the last position.
    pub fn new(types: impl IntoIterator<Item = Type>) -> DispatchResult<Self> {
        let types: Arc<[Type]> = types
            .into_iter()
            .map(|ty| ty.normalize())
            .collect::<DispatchResult<_>>()?;
        if let Some((_, init)) = types.split_last() {
            if init.iter().any(Type::is_var_args) {
                return Err(DispatchError::MalformedSignature {
                    signature: Signature { types }.to_string(),
                });
            }
        }
        Ok(Self { types })
    }

    /// The call signature of a tuple of runtime classes.
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a Class>) -> Self {
        Self {
            types: classes.into_iter().map(Type::from).collect(),
        }
    }

    /// The call signature of a tuple of argument values.
    pub fn of_values(values: &[Value]) -> Self {
        Self::from_classes(values.iter().map(Value::runtime_type))
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// All elements except a trailing varargs.
    pub fn base(&self) -> &[Type] {
        if self.has_varargs() {
            &self.types[..self.types.len() - 1]
        } else {
            &self.types
        }
    }

    /// Number of base elements.
    pub fn len(&self) -> usize {
        self.base().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn has_varargs(&self) -> bool {
        self.types.last().is_some_and(Type::is_var_args)
    }

    /// Element type of the varargs tail.
    pub fn varargs_type(&self) -> Option<&Type> {
        match self.types.last() {
            Some(Type::VarArgs(inner)) => Some(inner),
            _ => None,
        }
    }

    /// Whether the two signatures can describe calls of the same length.
    pub fn is_compatible(&self, other: &Signature) -> bool {
        let (n, m) = (self.len(), other.len());
        n == m || (n > m && other.has_varargs()) || (n < m && self.has_varargs())
    }

    /// The base extended with copies of the varargs type up to `other`'s
    /// length. Without varargs this is just the base.
    pub fn expand_varargs_to<'a>(&'a self, other: &Signature) -> impl Iterator<Item = &'a Type> {
        let extra = other.len().saturating_sub(self.len());
        let tail = self
            .varargs_type()
            .map(|ty| iter::repeat(ty).take(extra))
            .into_iter()
            .flatten();
        self.base().iter().chain(tail)
    }

    /// The signature order: `self ≤ other`.
    ///
    /// A varargs signature is never below a fixed one, and never below a
    /// varargs signature whose element type is strictly more specific.
    /// Otherwise both sides are expanded to a common length and compared
    /// element-wise.
    pub fn le(&self, other: &Signature) -> bool {
        match (self.varargs_type(), other.varargs_type()) {
            (Some(_), None) => return false,
            (Some(mine), Some(theirs)) if theirs.lt(mine) => return false,
            _ => {}
        }

        if !self.is_compatible(other) {
            return false;
        }

        let result = self
            .expand_varargs_to(other)
            .zip(other.expand_varargs_to(self))
            .all(|(a, b)| a.le(b));
        trace!(lhs = %self, rhs = %other, result, "compared signatures");
        result
    }

    /// `self ≤ other` and not `other ≤ self`.
    pub fn lt(&self, other: &Signature) -> bool {
        self.le(other) && !other.le(self)
    }

    pub fn contains_self(&self) -> bool {
        self.types.iter().any(Type::contains_self)
    }

    /// Replace every `Self` placeholder with `class`.
    pub fn bind_self(&self, class: &Class) -> Signature {
        Signature {
            types: self.types.iter().map(|ty| ty.bind_self(class)).collect(),
        }
    }

    /// The same signature with the element at `index` replaced.
    pub(crate) fn with_type_at(&self, index: usize, ty: Type) -> Signature {
        let mut types = self.types.to_vec();
        types[index] = ty;
        Signature {
            types: types.into(),
        }
    }
}

impl IntoIterator for Signature {
    type Item = Type;
    type IntoIter = std::vec::IntoIter<Type>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.to_vec().into_iter()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ty}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
