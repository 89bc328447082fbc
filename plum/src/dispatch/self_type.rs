//! Binding of `Self` placeholders.
//!
//! An operation owned by a class binds every `Self` in its signatures and
//! return types to that class when an implementation is registered. The
//! binding is permanent: a subclass gets its own operation, which binds
//! `Self` to the subclass.

use crate::error::{DispatchError, DispatchResult};
use crate::types::{Class, Signature, Type};

/// Binds `Self` for one operation.
#[derive(Debug, Clone, Copy)]
pub struct SelfTypeBinder<'a> {
    operation: &'a str,
    owner: Option<&'a Class>,
}

impl<'a> SelfTypeBinder<'a> {
    pub fn new(operation: &'a str, owner: Option<&'a Class>) -> Self {
        Self { operation, owner }
    }

    /// Bind `Self` inside `ty`. Fails if `ty` mentions `Self` but the
    /// operation has no owning class.
    pub fn bind_type(&self, ty: &Type) -> DispatchResult<Type> {
        let ty = ty.normalize()?;
        if !ty.contains_self() {
            return Ok(ty);
        }
        match self.owner {
            Some(class) => Ok(ty.bind_self(class)),
            None => Err(self.unbound()),
        }
    }

    /// Build a signature from `types` with every `Self` bound.
    pub fn bind_signature(&self, types: impl IntoIterator<Item = Type>) -> DispatchResult<Signature> {
        let signature = Signature::new(types)?;
        if !signature.contains_self() {
            return Ok(signature);
        }
        match self.owner {
            Some(class) => Ok(signature.bind_self(class)),
            None => Err(self.unbound()),
        }
    }

    fn unbound(&self) -> DispatchError {
        DispatchError::UnboundSelf {
            operation: self.operation.to_string(),
        }
    }
}
