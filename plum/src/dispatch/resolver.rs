//! The ranking algorithm.
//!
//! [`DispatchResolver`] works on an immutable snapshot of an operation's
//! registrations, so it can run without holding the operation's lock.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, trace};

use super::result::Selection;
use super::types::Registration;
use crate::conversion::{Conversion, ConversionRegistry};
use crate::types::{Signature, Type};

/// Dispatch resolution over one registry snapshot.
pub struct DispatchResolver<'a> {
    registrations: &'a [Arc<Registration>],
}

impl<'a> DispatchResolver<'a> {
    pub fn new(registrations: &'a [Arc<Registration>]) -> Self {
        Self { registrations }
    }

    /// Select the most specific registration accepting `call` directly.
    pub fn resolve(&self, call: &Signature) -> Selection {
        // Step 1: Filter to applicable registrations
        let applicable: Vec<_> = self
            .registrations
            .iter()
            .filter(|r| self.is_applicable(r, call))
            .cloned()
            .collect();

        // Step 2: Handle no matches
        if applicable.is_empty() {
            return Selection::NoMatch;
        }

        // Step 3: Find maximally specific registrations, then break ties
        let mut maximal = self.find_maximal(&applicable);
        maximal = self.highest_precedence(maximal);

        // Step 4: Check for unique winner
        if maximal.len() == 1 {
            if let Some(winner) = maximal.pop() {
                return Selection::Resolved(winner);
            }
        }

        // Step 5: Ambiguity
        Selection::Ambiguous(maximal)
    }

    /// Resolve `call` by converting the fewest possible arguments.
    ///
    /// Substitution sets of size 1, 2, ... up to `max_conversions` are tried
    /// in turn. The first size at which any substituted call resolves
    /// decides: a single substitution wins, several are ambiguous. Two
    /// substitutions reaching the same registration still tie, since they
    /// pass different converted arguments.
    pub fn resolve_with_conversions(
        &self,
        call: &Signature,
        conversions: &ConversionRegistry,
        max_conversions: usize,
    ) -> Selection {
        let options: Vec<Vec<Conversion>> = call
            .types()
            .iter()
            .map(|ty| match ty {
                Type::Concrete(class) => conversions.conversions_from(class),
                _ => Vec::new(),
            })
            .collect();

        let convertible: Vec<usize> = (0..options.len())
            .filter(|&i| !options[i].is_empty())
            .collect();

        for size in 1..=max_conversions.min(convertible.len()) {
            let mut outcomes: Vec<(Arc<Registration>, Vec<Option<Conversion>>)> = Vec::new();
            let mut tied: Vec<Arc<Registration>> = Vec::new();

            for positions in combinations(&convertible, size) {
                for choice in cartesian(&positions, &options) {
                    let mut substituted = call.clone();
                    let mut plan = vec![None; call.types().len()];
                    for (&position, conversion) in positions.iter().zip(&choice) {
                        substituted =
                            substituted.with_type_at(position, Type::from(conversion.to_class()));
                        plan[position] = Some(conversion.clone());
                    }

                    match self.resolve(&substituted) {
                        Selection::Resolved(registration) => {
                            trace!(%substituted, signature = %registration.signature, "conversion candidate");
                            outcomes.push((registration, plan));
                        }
                        Selection::Ambiguous(candidates) => tied.extend(candidates),
                        Selection::NoMatch | Selection::Converted { .. } => {}
                    }
                }
            }

            if outcomes.len() == 1 && tied.is_empty() {
                if let Some((registration, conversions)) = outcomes.pop() {
                    debug!(%call, size, signature = %registration.signature, "resolved through conversion");
                    return Selection::Converted {
                        registration,
                        conversions,
                    };
                }
            }

            if !outcomes.is_empty() || !tied.is_empty() {
                tied.extend(outcomes.into_iter().map(|(registration, _)| registration));
                let mut unique: Vec<Arc<Registration>> = Vec::new();
                for registration in tied {
                    if !unique.iter().any(|r| Arc::ptr_eq(r, &registration)) {
                        unique.push(registration);
                    }
                }
                return Selection::Ambiguous(unique);
            }
        }

        Selection::NoMatch
    }

    /// Check if a registration accepts the given call types.
    pub fn is_applicable(&self, registration: &Registration, call: &Signature) -> bool {
        call.le(&registration.signature)
    }

    /// Find the maximally specific registrations.
    ///
    /// A registration is maximal if no other one is strictly more specific.
    pub fn find_maximal(&self, applicable: &[Arc<Registration>]) -> Vec<Arc<Registration>> {
        applicable
            .iter()
            .filter(|&r| {
                !applicable
                    .iter()
                    .any(|other| !Arc::ptr_eq(r, other) && self.is_more_specific(other, r))
            })
            .cloned()
            .collect()
    }

    /// Keep only the registrations with the highest precedence.
    fn highest_precedence(&self, maximal: Vec<Arc<Registration>>) -> Vec<Arc<Registration>> {
        let Some(top) = maximal.iter().map(|r| r.precedence).max() else {
            return maximal;
        };
        maximal.into_iter().filter(|r| r.precedence == top).collect()
    }

    /// Check if `r1` is strictly more specific than `r2`.
    pub fn is_more_specific(&self, r1: &Registration, r2: &Registration) -> bool {
        r1.signature.lt(&r2.signature)
    }

    /// Compare the specificity of two registrations.
    ///
    /// Returns:
    /// - Ordering::Less if r1 is more specific
    /// - Ordering::Greater if r2 is more specific
    /// - Ordering::Equal if neither is (potential ambiguity)
    pub fn compare_specificity(&self, r1: &Registration, r2: &Registration) -> Ordering {
        match (self.is_more_specific(r1, r2), self.is_more_specific(r2, r1)) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

/// All `size`-element subsets of `items`, in lexicographic order.
fn combinations(items: &[usize], size: usize) -> Vec<Vec<usize>> {
    fn go(items: &[usize], size: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for (i, &item) in items.iter().enumerate() {
            current.push(item);
            go(&items[i + 1..], size, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    go(items, size, &mut Vec::with_capacity(size), &mut out);
    out
}

/// Every way of picking one conversion for each of `positions`.
fn cartesian(positions: &[usize], options: &[Vec<Conversion>]) -> Vec<Vec<Conversion>> {
    positions.iter().fold(vec![Vec::new()], |acc, &position| {
        acc.iter()
            .flat_map(|prefix| {
                options[position].iter().map(move |conversion| {
                    let mut next = prefix.clone();
                    next.push(conversion.clone());
                    next
                })
            })
            .collect()
    })
}
