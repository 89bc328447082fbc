//! The dispatcher context.
//!
//! A [`Dispatcher`] owns the conversion rules and the index of every
//! operation created through it, so that caches can be cleared across all
//! of them. Operations are keyed by name and owning class: asking for the
//! same key twice returns the same operation.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::conversion::ConversionRegistry;
use crate::dispatch::{Implementation, Method, Operation, OperationHandle};
use crate::error::DispatchResult;
use crate::types::{Class, ClassId, Signature, Type};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OperationKey {
    name: String,
    owner: Option<ClassId>,
}

/// A namespace of operations sharing one configuration and one conversion
/// table.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatchConfig,
    conversions: Arc<ConversionRegistry>,
    operations: RwLock<IndexMap<OperationKey, OperationHandle>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            config,
            conversions: Arc::new(ConversionRegistry::new()),
            operations: RwLock::new(IndexMap::new()),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn conversions(&self) -> &Arc<ConversionRegistry> {
        &self.conversions
    }

    /// Get or create the operation `name` owned by `owner`.
    pub fn create_operation(&self, name: &str, owner: Option<&Class>) -> OperationHandle {
        let key = OperationKey {
            name: name.to_string(),
            owner: owner.map(Class::id),
        };
        if let Some(existing) = self.operations.read().get(&key) {
            return existing.clone();
        }

        let mut operations = self.operations.write();
        operations
            .entry(key)
            .or_insert_with(|| {
                debug!(operation = name, owner = ?owner.map(Class::name), "created operation");
                OperationHandle::new(Operation::new(
                    name,
                    owner,
                    self.config.clone(),
                    Arc::clone(&self.conversions),
                ))
            })
            .clone()
    }

    /// Look up an existing operation.
    pub fn operation(&self, name: &str, owner: Option<&Class>) -> Option<OperationHandle> {
        let key = OperationKey {
            name: name.to_string(),
            owner: owner.map(Class::id),
        };
        self.operations.read().get(&key).cloned()
    }

    /// Every operation, in creation order.
    pub fn operations(&self) -> Vec<OperationHandle> {
        self.operations.read().values().cloned().collect()
    }

    pub fn register(
        &self,
        operation: &OperationHandle,
        signature: impl IntoIterator<Item = Type>,
        precedence: u32,
        implementation: Implementation,
        return_type: Option<Type>,
    ) -> DispatchResult<()> {
        operation.register(signature, precedence, implementation, return_type)
    }

    pub fn resolve_and_invoke(
        &self,
        operation: &OperationHandle,
        arg_types: &Signature,
        args: &[Value],
    ) -> DispatchResult<Value> {
        operation.resolve_and_invoke(arg_types, args)
    }

    pub fn lookup_implementation(
        &self,
        operation: &OperationHandle,
        arg_types: &Signature,
    ) -> DispatchResult<Method> {
        operation.lookup_implementation(arg_types)
    }

    pub fn clear_cache(&self, operation: &OperationHandle) {
        operation.clear_cache();
    }

    /// Clear the cache of every operation, taking each operation's lock in
    /// turn.
    pub fn clear_all_caches(&self) {
        let operations = self.operations();
        debug!(count = operations.len(), "clearing all caches");
        for operation in &operations {
            operation.clear_cache();
        }
    }

    pub fn add_conversion<F>(&self, from: &Class, to: &Class, func: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.conversions.add_conversion(from, to, func);
    }

    /// Drop every operation from the index and clear their caches.
    ///
    /// Handles held elsewhere stay usable but are no longer reachable from
    /// this dispatcher.
    pub fn teardown(&self) {
        let operations: Vec<_> = self.operations.write().drain(..).map(|(_, op)| op).collect();
        for operation in &operations {
            operation.clear_cache();
        }
        debug!(count = operations.len(), "dispatcher torn down");
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
