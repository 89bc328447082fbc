//! Operations: named registries with a resolution cache.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{const_mutex, Mutex};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use super::resolver::DispatchResolver;
use super::result::{AmbiguityError, NoMatchError, Selection};
use super::self_type::SelfTypeBinder;
use super::types::{Implementation, Method, Registration, Resolution};
use crate::config::DispatchConfig;
use crate::conversion::ConversionRegistry;
use crate::error::{DispatchError, DispatchResult};
use crate::types::{Class, Signature, Type};
use crate::value::Value;

/// Held across the cycle check and the edit in `set_fallback`; every check
/// sees all earlier edits.
static FALLBACK_EDIT: Mutex<()> = const_mutex(());

/// Where an operation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    /// Nothing registered yet.
    Empty,
    /// Registrations present, cache empty.
    Populated,
    /// At least one resolution cached.
    Cached,
}

/// Counters for one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    /// Calls to `resolve`, including those answered by a fallback.
    pub resolutions: u64,
    /// Resolutions answered from the cache.
    pub cache_hits: u64,
    /// Runs of the ranking algorithm.
    pub rankings: u64,
}

#[derive(Default)]
struct Counters {
    resolutions: AtomicU64,
    cache_hits: AtomicU64,
    rankings: AtomicU64,
}

struct OperationState {
    registrations: IndexMap<Signature, Arc<Registration>>,
    cache: FxHashMap<Signature, Resolution>,
    /// Bumped on every registration; a resolution computed from an older
    /// snapshot is not cached.
    generation: u64,
    fallback: Option<OperationHandle>,
}

/// A named operation and its registered implementations.
///
/// One lock guards registration and every cache access. Ranking runs outside
/// the lock over a snapshot of the registrations.
pub struct Operation {
    name: Arc<str>,
    owner: Option<Class>,
    config: DispatchConfig,
    conversions: Arc<ConversionRegistry>,
    state: Mutex<OperationState>,
    counters: Counters,
}

impl Operation {
    pub(crate) fn new(
        name: &str,
        owner: Option<&Class>,
        config: DispatchConfig,
        conversions: Arc<ConversionRegistry>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            owner: owner.cloned(),
            config,
            conversions,
            state: Mutex::new(OperationState {
                registrations: IndexMap::new(),
                cache: FxHashMap::default(),
                generation: 0,
                fallback: None,
            }),
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class `Self` is bound to, if any.
    pub fn owner(&self) -> Option<&Class> {
        self.owner.as_ref()
    }

    /// Register `implementation` under `signature`.
    ///
    /// Replaces an existing registration with the same (bound) signature and
    /// clears the whole resolution cache. `return_type` defaults to `object`.
    pub fn register(
        &self,
        signature: impl IntoIterator<Item = Type>,
        precedence: u32,
        implementation: Implementation,
        return_type: Option<Type>,
    ) -> DispatchResult<()> {
        self.register_multi([signature], precedence, implementation, return_type)
    }

    /// Register one implementation under several signatures.
    ///
    /// Every signature is validated before any is inserted.
    pub fn register_multi<S>(
        &self,
        signatures: impl IntoIterator<Item = S>,
        precedence: u32,
        implementation: Implementation,
        return_type: Option<Type>,
    ) -> DispatchResult<()>
    where
        S: IntoIterator<Item = Type>,
    {
        let binder = SelfTypeBinder::new(&self.name, self.owner.as_ref());
        let return_type = binder.bind_type(&return_type.unwrap_or_else(Type::object))?;
        let signatures = signatures
            .into_iter()
            .map(|types| binder.bind_signature(types))
            .collect::<DispatchResult<Vec<_>>>()?;

        let mut state = self.state.lock();
        for signature in signatures {
            debug!(operation = %self.name, %signature, precedence, "registering implementation");
            let registration = Arc::new(Registration {
                signature: signature.clone(),
                precedence,
                implementation: implementation.clone(),
                return_type: return_type.clone(),
            });
            if state.registrations.insert(signature, registration).is_some() {
                trace!(operation = %self.name, "replaced existing registration");
            }
        }
        state.cache.clear();
        state.generation += 1;
        Ok(())
    }

    /// Retry resolution on `fallback` when this operation has no match.
    pub fn set_fallback(&self, fallback: Option<OperationHandle>) -> DispatchResult<()> {
        let _edit = FALLBACK_EDIT.lock();
        if let Some(candidate) = &fallback {
            let mut next = Some(candidate.clone());
            while let Some(op) = next {
                if std::ptr::eq(op.as_operation(), self) {
                    return Err(DispatchError::FallbackCycle {
                        operation: self.name.to_string(),
                    });
                }
                next = op.fallback();
            }
        }
        self.state.lock().fallback = fallback;
        Ok(())
    }

    pub fn fallback(&self) -> Option<OperationHandle> {
        self.state.lock().fallback.clone()
    }

    /// Resolve the implementation for a call with the given argument types.
    pub fn resolve(&self, call: &Signature) -> DispatchResult<Method> {
        self.counters.resolutions.fetch_add(1, Ordering::Relaxed);
        let conversion_generation = self.conversions.generation();

        let (snapshot, generation, fallback) = {
            let state = self.state.lock();
            if self.config.cache_enabled {
                if let Some(hit) = state.cache.get(call) {
                    if hit.is_current(conversion_generation) {
                        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                        trace!(operation = %self.name, %call, "cache hit");
                        return Ok(self.method(hit.clone()));
                    }
                }
            }
            let snapshot: Vec<_> = state.registrations.values().cloned().collect();
            (snapshot, state.generation, state.fallback.clone())
        };

        trace!(operation = %self.name, %call, candidates = snapshot.len(), "cache miss");
        self.counters.rankings.fetch_add(1, Ordering::Relaxed);
        let resolver = DispatchResolver::new(&snapshot);

        let mut selection = resolver.resolve(call);
        if matches!(selection, Selection::NoMatch) && !self.conversions.is_empty() {
            selection = resolver.resolve_with_conversions(
                call,
                &self.conversions,
                self.config.max_conversions,
            );
        }

        let resolution = match selection {
            Selection::Resolved(registration) => Resolution::direct(registration),
            Selection::Converted {
                registration,
                conversions,
            } => Resolution::converted(registration, conversions, conversion_generation),
            Selection::Ambiguous(candidates) => {
                warn!(operation = %self.name, %call, tied = candidates.len(), "ambiguous resolution");
                return Err(AmbiguityError {
                    operation: self.name.to_string(),
                    arg_types: call.clone(),
                    candidates: candidates.iter().map(|r| r.signature.clone()).collect(),
                }
                .into());
            }
            Selection::NoMatch => {
                if let Some(fallback) = fallback.filter(|_| self.config.class_fallback) {
                    debug!(operation = %self.name, fallback = %fallback.name(), %call, "no match, trying fallback");
                    return fallback.resolve(call);
                }
                return Err(NoMatchError {
                    operation: self.name.to_string(),
                    arg_types: call.clone(),
                    candidates: snapshot.iter().map(|r| r.signature.clone()).collect(),
                }
                .into());
            }
        };

        if self.config.cache_enabled {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.cache.insert(call.clone(), resolution.clone());
            }
        }

        Ok(self.method(resolution))
    }

    /// Resolve without invoking.
    pub fn lookup_implementation(&self, call: &Signature) -> DispatchResult<Method> {
        self.resolve(call)
    }

    /// Resolve on the runtime types of `args` and invoke.
    pub fn invoke(&self, args: &[Value]) -> DispatchResult<Value> {
        self.resolve_and_invoke(&Signature::of_values(args), args)
    }

    /// Resolve on `call` and invoke the winner with `args`.
    pub fn resolve_and_invoke(&self, call: &Signature, args: &[Value]) -> DispatchResult<Value> {
        self.resolve(call)?.call(args)
    }

    pub fn clear_cache(&self) {
        self.state.lock().cache.clear();
    }

    pub fn phase(&self) -> OperationPhase {
        let state = self.state.lock();
        if state.registrations.is_empty() {
            OperationPhase::Empty
        } else if state.cache.is_empty() {
            OperationPhase::Populated
        } else {
            OperationPhase::Cached
        }
    }

    /// The current registrations, in first-registration order.
    pub fn registrations(&self) -> Vec<Arc<Registration>> {
        self.state.lock().registrations.values().cloned().collect()
    }

    pub fn stats(&self) -> OperationStats {
        OperationStats {
            resolutions: self.counters.resolutions.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            rankings: self.counters.rankings.load(Ordering::Relaxed),
        }
    }

    fn method(&self, resolution: Resolution) -> Method {
        Method {
            operation: Arc::clone(&self.name),
            resolution,
            conversions: Arc::clone(&self.conversions),
            check_return_type: self.config.check_return_types,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("phase", &self.phase())
            .finish()
    }
}

/// A shared, stable handle to an [`Operation`].
#[derive(Clone)]
pub struct OperationHandle(Arc<Operation>);

impl OperationHandle {
    pub(crate) fn new(operation: Operation) -> Self {
        Self(Arc::new(operation))
    }

    pub fn as_operation(&self) -> &Operation {
        &self.0
    }

    /// Whether both handles refer to the same operation.
    pub fn ptr_eq(&self, other: &OperationHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for OperationHandle {
    type Target = Operation;

    fn deref(&self) -> &Operation {
        &self.0
    }
}

impl fmt::Debug for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
