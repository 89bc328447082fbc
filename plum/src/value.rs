//! Dynamically typed values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::{Class, Type};

/// An argument or result passed through dispatch.
///
/// A value carries the class it was created as and an opaque payload. The
/// class is what dispatch sees; the payload is only inspected by
/// implementations and conversions.
#[derive(Clone)]
pub struct Value {
    class: Class,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(class: &Class, payload: T) -> Self {
        Self {
            class: class.clone(),
            payload: Arc::new(payload),
        }
    }

    /// The class this value was created as.
    pub fn runtime_type(&self) -> &Class {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Whether both values share one payload allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.class)
    }
}

/// The lattice type dispatch uses for `value`.
pub fn runtime_type_of(value: &Value) -> Type {
    Type::Concrete(value.class.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Builtins;

    #[test]
    fn test_payload_access() {
        let b = Builtins::new();
        let v = Value::new(&b.int, 7i64);
        assert!(v.is::<i64>());
        assert!(!v.is::<f64>());
        assert_eq!(v.downcast_ref::<i64>(), Some(&7));
        assert_eq!(runtime_type_of(&v), Type::from(&b.int));
    }

    #[test]
    fn test_clones_share_payload() {
        let b = Builtins::new();
        let v = Value::new(&b.str, String::from("x"));
        assert!(v.ptr_eq(&v.clone()));
        assert!(!v.ptr_eq(&Value::new(&b.str, String::from("x"))));
    }
}
