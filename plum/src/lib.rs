//! Runtime multiple dispatch.
//!
//! Plum selects, among several implementations registered under one
//! operation name, the most specific implementation whose parameter types
//! accept the runtime types of a call's arguments.
//!
//! # Crate Structure
//!
//! - [`types`] - Nominal classes, the type lattice and signatures
//! - [`value`] - Dynamically typed argument values
//! - [`conversion`] - Promotion rules used when no signature matches directly
//! - [`dispatch`] - Operations, registration, resolution and caching
//! - [`dispatcher`] - The process-scoped index of all operations
//! - [`config`] - Dispatch configuration
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use plum::{Builtins, Dispatcher, Implementation, Type, Value};
//!
//! let b = Builtins::new();
//! let dispatcher = Dispatcher::new();
//! let describe = dispatcher.create_operation("describe", None);
//!
//! describe
//!     .register([Type::from(&b.int)], 0, Implementation::new({
//!         let s = b.str.clone();
//!         move |_| Value::new(&s, "an int")
//!     }), None)
//!     .unwrap();
//!
//! let out = describe.invoke(&[Value::new(&b.bool, true)]).unwrap();
//! assert_eq!(out.downcast_ref::<&str>(), Some(&"an int"));
//! ```

pub mod config;
pub mod conversion;
pub mod dispatch;
pub mod dispatcher;
pub mod error;
pub mod types;
pub mod value;

pub use config::DispatchConfig;
pub use conversion::{Conversion, ConversionRegistry};
pub use dispatch::{
    AmbiguityError, Implementation, Method, NoMatchError, OperationHandle, OperationPhase,
    OperationStats, Registration, SelfTypeBinder,
};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use types::{Builtins, Class, ClassId, Signature, Type};
pub use value::{runtime_type_of, Value};
