//! Promotion rules.
//!
//! The conversion registry holds explicit rules "values of class A can be
//! converted to class B". Dispatch consults it only when no registered
//! signature accepts a call directly, and when a result does not satisfy its
//! declared return type. Adding a rule therefore never changes which direct
//! match wins.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};
use crate::types::{Class, ClassId, Type};
use crate::value::Value;

/// A conversion function.
pub type ConversionFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// One registered promotion rule.
#[derive(Clone)]
pub struct Conversion {
    from: Class,
    to: Class,
    func: ConversionFn,
}

impl Conversion {
    pub fn from_class(&self) -> &Class {
        &self.from
    }

    pub fn to_class(&self) -> &Class {
        &self.to
    }

    /// Convert `value`, checking that the result really is of the target
    /// class.
    pub fn apply(&self, value: &Value) -> DispatchResult<Value> {
        let converted = (self.func)(value);
        if converted.runtime_type().is_subclass_of(&self.to) {
            Ok(converted)
        } else {
            Err(DispatchError::Conversion {
                from: Type::from(&self.from),
                to: Type::from(&self.to),
                actual: Type::from(converted.runtime_type()),
            })
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conversion({} -> {})", self.from, self.to)
    }
}

/// The table of promotion rules, shared by every operation of one
/// dispatcher.
#[derive(Default)]
pub struct ConversionRegistry {
    /// Source class -> target class -> rule, in registration order.
    rules: RwLock<FxHashMap<ClassId, IndexMap<ClassId, Conversion>>>,
    /// Bumped on every added rule.
    generation: AtomicU64,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule converting values of `from` (and its subclasses) to
    /// `to`. A later rule for the same pair replaces the earlier one.
    pub fn add_conversion<F>(&self, from: &Class, to: &Class, func: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let conversion = Conversion {
            from: from.clone(),
            to: to.clone(),
            func: Arc::new(func),
        };
        self.rules
            .write()
            .entry(from.id())
            .or_default()
            .insert(to.id(), conversion);
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!(%from, %to, "added conversion");
    }

    /// Changes whenever a rule is added.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Every target `class` can be converted to, one rule per target.
    ///
    /// Rules declared on the class itself win over rules declared on its
    /// ancestors. Targets the class already satisfies are skipped.
    pub fn conversions_from(&self, class: &Class) -> Vec<Conversion> {
        let rules = self.rules.read();
        let mut seen = FxHashSet::default();
        let mut found = Vec::new();
        for ancestor in class.mro() {
            let Some(targets) = rules.get(ancestor) else {
                continue;
            };
            for (target, conversion) in targets {
                if class.is_subclass_of(&conversion.to) || !seen.insert(*target) {
                    continue;
                }
                found.push(conversion.clone());
            }
        }
        found
    }

    /// The first rule converting `class` to something accepted by `expected`.
    pub fn find(&self, class: &Class, expected: &Type) -> Option<Conversion> {
        self.conversions_from(class)
            .into_iter()
            .find(|conversion| Type::from(&conversion.to).le(expected))
    }

    /// Convert `value` so that it satisfies `expected`, if a rule allows it.
    pub fn convert(&self, value: &Value, expected: &Type) -> Option<DispatchResult<Value>> {
        self.find(value.runtime_type(), expected)
            .map(|conversion| conversion.apply(value))
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules = self.rules.read();
        f.debug_list()
            .entries(rules.values().flat_map(|targets| targets.values()))
            .finish()
    }
}
