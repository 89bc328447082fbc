//! Core type definitions for dispatch resolution.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::conversion::{Conversion, ConversionRegistry};
use crate::error::{DispatchError, DispatchResult};
use crate::types::{Signature, Type};
use crate::value::{runtime_type_of, Value};

/// The function type behind an [`Implementation`].
pub type ImplFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// A callable implementation of an operation.
#[derive(Clone)]
pub struct Implementation(ImplFn);

impl Implementation {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    /// Whether both handles refer to the same function.
    pub fn ptr_eq(&self, other: &Implementation) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Implementation({:p})", Arc::as_ptr(&self.0))
    }
}

/// One registered implementation of an operation.
///
/// Immutable once created; registering the same signature again replaces
/// the whole registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub(crate) signature: Signature,
    pub(crate) precedence: u32,
    pub(crate) implementation: Implementation,
    pub(crate) return_type: Type,
}

impl Registration {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Tie-break among the maximally specific registrations.
    pub fn precedence(&self) -> u32 {
        self.precedence
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Declared return type; `object` when none was declared.
    pub fn return_type(&self) -> &Type {
        &self.return_type
    }
}

/// A cached resolution for one call-type tuple.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub(crate) registration: Arc<Registration>,
    /// Per-argument conversions; empty for a direct match.
    pub(crate) conversions: Arc<[Option<Conversion>]>,
    /// Conversion table generation a converted resolution was computed
    /// against.
    pub(crate) conversion_generation: Option<u64>,
}

impl Resolution {
    pub(crate) fn direct(registration: Arc<Registration>) -> Self {
        Self {
            registration,
            conversions: Vec::new().into(),
            conversion_generation: None,
        }
    }

    pub(crate) fn converted(
        registration: Arc<Registration>,
        conversions: Vec<Option<Conversion>>,
        generation: u64,
    ) -> Self {
        Self {
            registration,
            conversions: conversions.into(),
            conversion_generation: Some(generation),
        }
    }

    /// A converted resolution goes stale when conversion rules are added.
    pub(crate) fn is_current(&self, conversion_generation: u64) -> bool {
        self.conversion_generation
            .map_or(true, |generation| generation == conversion_generation)
    }
}

/// A resolved implementation, ready to be called.
///
/// Calling a method applies any argument conversions the resolution needed,
/// runs the implementation and checks the result against the declared
/// return type.
#[derive(Clone)]
pub struct Method {
    pub(crate) operation: Arc<str>,
    pub(crate) resolution: Resolution,
    pub(crate) conversions: Arc<ConversionRegistry>,
    pub(crate) check_return_type: bool,
}

impl Method {
    pub fn registration(&self) -> &Registration {
        &self.resolution.registration
    }

    pub fn signature(&self) -> &Signature {
        &self.resolution.registration.signature
    }

    pub fn implementation(&self) -> &Implementation {
        &self.resolution.registration.implementation
    }

    /// Whether the resolution only matched after converting arguments.
    pub fn uses_conversions(&self) -> bool {
        self.resolution.conversions.iter().any(Option::is_some)
    }

    /// Invoke the implementation with `args`.
    pub fn call(&self, args: &[Value]) -> DispatchResult<Value> {
        let args = self.convert_args(args)?;
        let result = self.implementation().call(&args);
        self.check_return(result)
    }

    fn convert_args<'a>(&self, args: &'a [Value]) -> DispatchResult<Cow<'a, [Value]>> {
        if !self.uses_conversions() {
            return Ok(Cow::Borrowed(args));
        }
        args.iter()
            .enumerate()
            .map(|(i, arg)| match self.resolution.conversions.get(i) {
                Some(Some(conversion)) => conversion.apply(arg),
                _ => Ok(arg.clone()),
            })
            .collect::<DispatchResult<Vec<_>>>()
            .map(Cow::Owned)
    }

    fn check_return(&self, result: Value) -> DispatchResult<Value> {
        let expected = &self.resolution.registration.return_type;
        if !self.check_return_type || runtime_type_of(&result).le(expected) {
            return Ok(result);
        }
        match self.conversions.convert(&result, expected) {
            Some(converted) => converted,
            None => Err(DispatchError::ReturnTypeViolation {
                operation: self.operation.to_string(),
                signature: self.signature().clone(),
                expected: expected.clone(),
                actual: runtime_type_of(&result),
            }),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("operation", &self.operation)
            .field("signature", self.signature())
            .field("precedence", &self.registration().precedence)
            .field("conversions", &self.resolution.conversions)
            .finish()
    }
}
