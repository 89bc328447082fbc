//! The type lattice.
//!
//! Types form a partial order `≤` ("is acceptable where the other is
//! expected"):
//!
//! - `Concrete(a) ≤ Concrete(b)` iff `a` is a subclass of `b`
//! - `a ≤ Union(b₁..bₙ)` iff `a ≤ bᵢ` for some `i`
//! - `Union(a₁..aₙ) ≤ b` iff `aᵢ ≤ b` for every `i`
//! - `VarArgs(t) ≤ VarArgs(u)` iff `t ≤ u`; varargs never compare with
//!   anything else
//! - `Self` only compares with itself; it is bound to a concrete class
//!   before any comparison that matters for dispatch
//!
//! Unions are kept normalized (flattened, without members subsumed by other
//! members, in a canonical order) so that structural equality coincides with
//! mutual `≤`.

mod class;
mod tuple;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

pub use class::{Builtins, Class, ClassId};
pub use tuple::Signature;

use crate::error::{DispatchError, DispatchResult};

/// An element of the type lattice.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// A single nominal type.
    Concrete(Class),
    /// A normalized set of concrete or `Self` members.
    Union(Arc<[Type]>),
    /// Zero or more trailing arguments of the inner type.
    VarArgs(Arc<Type>),
    /// Placeholder for the class owning the operation.
    SelfType,
}

impl Type {
    /// The top of the lattice.
    pub fn object() -> Type {
        Type::Concrete(Class::object())
    }

    pub fn concrete(class: &Class) -> Type {
        Type::Concrete(class.clone())
    }

    /// Build a union type.
    ///
    /// Nested unions are flattened, members subsumed by another member are
    /// dropped, and a union left with a single member collapses to it.
    pub fn union(members: impl IntoIterator<Item = Type>) -> DispatchResult<Type> {
        let mut flat = Vec::new();
        for member in members {
            match member.normalize()? {
                Type::Union(inner) => flat.extend(inner.iter().cloned()),
                Type::VarArgs(_) => {
                    return Err(DispatchError::MalformedType {
                        message: format!("union member {member} cannot be varargs"),
                    })
                }
                other => flat.push(other),
            }
        }
        Ok(normalize_union(flat))
    }

    /// Build a varargs tail type.
    pub fn var_args(inner: Type) -> DispatchResult<Type> {
        let inner = inner.normalize()?;
        if inner.is_var_args() {
            return Err(DispatchError::MalformedType {
                message: format!("varargs cannot wrap {inner}"),
            });
        }
        Ok(Type::VarArgs(Arc::new(inner)))
    }

    /// Rebuild this type through the checked constructors.
    ///
    /// Variants assembled by hand may hold unsorted or subsumed union
    /// members, varargs inside a union, or nested varargs. The first two are
    /// normalized away; the others are rejected.
    pub fn normalize(&self) -> DispatchResult<Type> {
        match self {
            Type::Concrete(_) | Type::SelfType => Ok(self.clone()),
            Type::Union(members) => Type::union(members.iter().cloned()),
            Type::VarArgs(inner) => Type::var_args((**inner).clone()),
        }
    }

    pub fn is_var_args(&self) -> bool {
        matches!(self, Type::VarArgs(_))
    }

    /// Whether a `Self` placeholder occurs anywhere inside this type.
    pub fn contains_self(&self) -> bool {
        match self {
            Type::SelfType => true,
            Type::Concrete(_) => false,
            Type::Union(members) => members.iter().any(Type::contains_self),
            Type::VarArgs(inner) => inner.contains_self(),
        }
    }

    /// Replace every `Self` placeholder with `class`.
    pub fn bind_self(&self, class: &Class) -> Type {
        match self {
            Type::SelfType => Type::Concrete(class.clone()),
            Type::Concrete(_) => self.clone(),
            Type::Union(members) => {
                normalize_union(members.iter().map(|m| m.bind_self(class)).collect())
            }
            Type::VarArgs(inner) => Type::VarArgs(Arc::new(inner.bind_self(class))),
        }
    }

    /// The partial order of the lattice: `self ≤ other`.
    pub fn le(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::VarArgs(a), Type::VarArgs(b)) => a.le(b),
            (Type::VarArgs(_), _) | (_, Type::VarArgs(_)) => false,
            (Type::Union(members), _) => members.iter().all(|m| m.le(other)),
            (_, Type::Union(members)) => members.iter().any(|m| self.le(m)),
            (Type::Concrete(a), Type::Concrete(b)) => a.is_subclass_of(b),
            (Type::SelfType, Type::SelfType) => true,
            (Type::SelfType, _) | (_, Type::SelfType) => false,
        }
    }

    /// `self ≤ other` and not `other ≤ self`.
    pub fn lt(&self, other: &Type) -> bool {
        self.le(other) && !other.le(self)
    }

    fn sort_key(&self) -> (u8, u32) {
        match self {
            Type::SelfType => (0, 0),
            Type::Concrete(class) => (1, class.id().index()),
            // Only concrete and `Self` members survive normalization.
            Type::Union(_) | Type::VarArgs(_) => (2, 0),
        }
    }
}

/// Normalize flattened, varargs-free union members.
fn normalize_union(mut members: Vec<Type>) -> Type {
    members.sort_by_key(Type::sort_key);
    members.dedup();

    let kept: Vec<Type> = members
        .iter()
        .filter(|m| !members.iter().any(|other| other != *m && m.le(other)))
        .cloned()
        .collect();

    match <[Type; 1]>::try_from(kept) {
        Ok([only]) => only,
        Err(kept) => Type::Union(kept.into()),
    }
}

impl From<Class> for Type {
    fn from(class: Class) -> Self {
        Type::Concrete(class)
    }
}

impl From<&Class> for Type {
    fn from(class: &Class) -> Self {
        Type::Concrete(class.clone())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Concrete(class) => write!(f, "{class}"),
            Type::Union(members) => {
                write!(f, "Union[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, "]")
            }
            Type::VarArgs(inner) => write!(f, "VarArgs[{inner}]"),
            Type::SelfType => write!(f, "Self"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
