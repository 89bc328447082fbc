//! Multiple dispatch resolution.
//!
//! This module implements the resolution algorithm that selects which
//! registered implementation of an operation to call, based on the runtime
//! types of all arguments.
//!
//! # Algorithm Overview
//!
//! 1. **Check the cache**: Resolutions are cached per call-type tuple
//! 2. **Filter applicable**: Keep registrations whose signature accepts the call
//! 3. **Convert**: If nothing applies, retry with the fewest argument conversions
//! 4. **Order by specificity**: Keep the maximally specific registrations
//! 5. **Break ties**: Prefer the highest precedence among the maximal ones
//! 6. **Select best**: Choose the unique survivor, or error on ambiguity
//!
//! # Module Structure
//!
//! - [`types`] - Registrations, implementations and resolved methods
//! - [`result`] - Resolution outcomes and errors
//! - [`resolver`] - The ranking algorithm over a registry snapshot
//! - [`self_type`] - Binding of `Self` placeholders to the owning class
//! - [`operation`] - Per-operation registry, cache and statistics

mod operation;
mod resolver;
mod result;
mod self_type;
mod types;


pub use operation::{Operation, OperationHandle, OperationPhase, OperationStats};
pub use resolver::DispatchResolver;
pub use result::{AmbiguityError, NoMatchError, Selection};
pub use self_type::SelfTypeBinder;
pub use types::{ImplFn, Implementation, Method, Registration};
