//! Type Hierarchy Resolver
//!
//! Computes the `extends` closure for every node type and determines, for an
//! arbitrary set of node types, their lowest common ancestor or a
//! deterministic fallback. This is what types polymorphic edge endpoints.
//!
//! Every answer depends only on declared names and declared `extends` order,
//! never on the iteration order of an unordered collection: generated source
//! is diffed between releases, so reproducibility is a hard requirement.
//! Closures live in `BTreeMap`/`BTreeSet` and ties are broken by a total
//! order over names.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

use crate::encoder::names::upper_camel_case;
use crate::model::{Schema, ABSTRACT_NODE};

/// Resolves common ancestor types over the `extends` DAG of a validated
/// schema. Pure function of the immutable model; safe to query in parallel.
pub struct HierarchyResolver<'a> {
    schema: &'a Schema,
    /// Transitive, deduplicated ancestor closure per type (excluding self)
    closures: BTreeMap<String, BTreeSet<String>>,
}

impl<'a> HierarchyResolver<'a> {
    /// Precompute ancestor closures for every node and base type.
    pub fn new(schema: &'a Schema) -> Self {
        let mut closures: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for ty in schema.all_abstract_types() {
            let mut closure = BTreeSet::new();
            // Plain worklist walk; the extends relation is validated acyclic.
            let mut queue: VecDeque<&str> =
                ty.extends().iter().map(String::as_str).collect();
            while let Some(ancestor) = queue.pop_front() {
                if !closure.insert(ancestor.to_string()) {
                    continue;
                }
                if let Some(parent) = schema.abstract_node_type(ancestor) {
                    queue.extend(parent.extends().iter().map(String::as_str));
                }
            }
            closures.insert(ty.name().to_string(), closure);
        }

        debug!(types = closures.len(), "ancestor closures computed");
        Self { schema, closures }
    }

    /// Transitive, deduplicated ancestors of a type, excluding the type
    /// itself. Empty for unknown names and for the `ABSTRACT_NODE` sentinel.
    pub fn extendz_recursively(&self, name: &str) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.closures.get(name).unwrap_or(&EMPTY)
    }

    /// `{self} ∪ extendz_recursively(self)`
    pub fn ancestors_of(&self, name: &str) -> BTreeSet<String> {
        let mut ancestors = self.extendz_recursively(name).clone();
        ancestors.insert(name.to_string());
        ancestors
    }

    /// Complete ancestor chain of a type: self first, then a breadth-first
    /// walk over `extends` lists in declared order, deduplicated. This chain
    /// order is the documented contract of the shared-root fallback.
    pub fn ancestor_chain(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(name.to_string());

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(ty) = self.schema.abstract_node_type(&current) {
                queue.extend(ty.extends().iter().cloned());
            }
            chain.push(current);
        }

        chain
    }

    /// Compute a single common root type for a non-empty set of node types,
    /// usable as the static type of a polymorphic accessor.
    ///
    /// Two phases, first match wins:
    /// 1. Lowest common ancestor over the `extends` DAG, where each type's
    ///    ancestors are `{self} ∪ extendz_recursively`. Among common
    ///    ancestors, keep those that are not a proper ancestor of another
    ///    candidate; ties break by ascending name order.
    /// 2. Shared-root fallback: walk the complete ancestor chain of the
    ///    reference type (the input whose generated class name sorts first)
    ///    and return the first entry present in every other input's chain.
    ///
    /// `None` means no common ancestor exists; the caller falls back to the
    /// universal root. An empty input set is a precondition violation.
    pub fn common_root<S: AsRef<str>>(&self, names: &[S]) -> Option<String> {
        debug_assert!(!names.is_empty(), "common_root queried with empty set");
        let first = names.first()?;
        if names.len() == 1 {
            return Some(first.as_ref().to_string());
        }

        // Phase 1: lowest common ancestor with alphabetical tie-break.
        let mut common = self.ancestors_of(first.as_ref());
        for name in &names[1..] {
            let ancestors = self.ancestors_of(name.as_ref());
            common.retain(|c| ancestors.contains(c));
        }
        let lowest: Vec<&String> = common
            .iter()
            .filter(|candidate| {
                !common.iter().any(|other| {
                    *other != **candidate
                        && self.extendz_recursively(other).contains(*candidate)
                })
            })
            .collect();
        // BTreeSet iteration is ascending by name, so the first survivor
        // is the alphabetical winner.
        if let Some(winner) = lowest.first() {
            return Some((*winner).clone());
        }

        // Phase 2: shared-root fallback from a deterministic reference type.
        let reference = names
            .iter()
            .map(|n| n.as_ref())
            .min_by_key(|n| upper_camel_case(n))?;
        let other_chains: Vec<BTreeSet<String>> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| *n != reference)
            .map(|n| self.ancestor_chain(n).into_iter().collect())
            .collect();
        self.ancestor_chain(reference)
            .into_iter()
            .find(|ancestor| other_chains.iter().all(|chain| chain.contains(ancestor)))
    }

    /// Like [`common_root`](Self::common_root), but substituting the
    /// universal root node type when no common ancestor exists.
    pub fn common_root_or_abstract<S: AsRef<str>>(&self, names: &[S]) -> String {
        // Endpoint sets may name the sentinel directly; it dominates.
        if names.iter().any(|n| n.as_ref() == ABSTRACT_NODE) {
            return ABSTRACT_NODE.to_string();
        }
        self.common_root(names)
            .unwrap_or_else(|| ABSTRACT_NODE.to_string())
    }
}
