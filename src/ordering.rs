//! The two total orders over features, and an append-only index for each.
//!
//! | Policy | Primary | Tie-break |
//! |--------|---------|-----------|
//! | [`GeneralFirst`] | `dims.len()` ascending | `dims` lexicographic, then id ascending |
//! | [`SpecificFirst`] | `dims.len()` descending | id descending |
//!
//! Feature ids carry no ordering of their own; an index orders by the key its
//! policy derives from `(id, dims)`. Both keys embed the id, so they are unique
//! and inserting a new feature never disturbs the relative order of existing ones.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::marker::PhantomData;

use crate::identity::FeatureId;

/// A strict total order over `(feature id, dims)` pairs.
pub trait OrderPolicy {
    /// Sort key; its `Ord` is the policy's order.
    type Key: Ord + Clone + core::fmt::Debug;

    /// Derive the sort key for a feature.
    fn key(id: FeatureId, dims: &[usize]) -> Self::Key;
}

/// Fewest dimensions first, then by dimension values, then by id.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeneralFirst;

impl OrderPolicy for GeneralFirst {
    type Key = (usize, Vec<usize>, FeatureId);

    fn key(id: FeatureId, dims: &[usize]) -> Self::Key {
        (dims.len(), dims.to_vec(), id)
    }
}

/// Most dimensions first, newest id first within a dimensionality.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpecificFirst;

impl OrderPolicy for SpecificFirst {
    type Key = (Reverse<usize>, Reverse<FeatureId>);

    fn key(id: FeatureId, dims: &[usize]) -> Self::Key {
        (Reverse(dims.len()), Reverse(id))
    }
}

/// Append-only ordered index of features under policy `P`.
#[derive(Clone, Debug)]
pub struct FeatureIndex<P: OrderPolicy> {
    entries: BTreeMap<P::Key, (FeatureId, usize)>,
    _policy: PhantomData<P>,
}

impl<P: OrderPolicy> FeatureIndex<P> {
    /// Empty index.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            _policy: PhantomData,
        }
    }

    /// Register a feature. Each id must be inserted at most once.
    pub fn insert(&mut self, id: FeatureId, dims: &[usize]) {
        let prev = self.entries.insert(P::key(id, dims), (id, dims.len()));
        debug_assert!(prev.is_none(), "feature {} indexed twice", id);
    }

    /// Number of indexed features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(id, dimensionality)` pairs in policy order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, usize)> + '_ {
        self.entries.values().copied()
    }

    /// Ids in policy order.
    pub fn ids(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.entries.values().map(|&(id, _)| id)
    }
}

impl<P: OrderPolicy> Default for FeatureIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureIndex<GeneralFirst> {
    /// Leading run of single-dimension features (base features), in order.
    ///
    /// Stops scanning at the first feature with more than one dimension.
    pub fn single_dim(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.iter()
            .take_while(|&(_, len)| len <= 1)
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> Vec<(FeatureId, Vec<usize>)> {
        vec![
            (0, vec![1]),
            (1, vec![0]),
            (2, vec![0, 1]),
            (3, vec![1]),
            (4, vec![0, 1, 2]),
            (5, vec![0, 2]),
        ]
    }

    #[test]
    fn test_general_first_order() {
        let mut idx: FeatureIndex<GeneralFirst> = FeatureIndex::new();
        for (id, dims) in sample() {
            idx.insert(id, &dims);
        }
        let order: Vec<FeatureId> = idx.ids().collect();
        // size 1: dims [0] before [1]; equal dims by id; then [0,1] < [0,2]; then size 3
        assert_eq!(order, vec![1, 0, 3, 2, 5, 4]);
    }

    #[test]
    fn test_specific_first_order() {
        let mut idx: FeatureIndex<SpecificFirst> = FeatureIndex::new();
        for (id, dims) in sample() {
            idx.insert(id, &dims);
        }
        let order: Vec<FeatureId> = idx.ids().collect();
        assert_eq!(order, vec![4, 5, 2, 3, 1, 0]);
    }

    #[test]
    fn test_single_dim_prefix_stops_at_refined() {
        let mut idx: FeatureIndex<GeneralFirst> = FeatureIndex::new();
        for (id, dims) in sample() {
            idx.insert(id, &dims);
        }
        let bases: Vec<FeatureId> = idx.single_dim().collect();
        assert_eq!(bases, vec![1, 0, 3]);
    }

    #[test]
    fn test_append_preserves_existing_relative_order() {
        let mut idx: FeatureIndex<SpecificFirst> = FeatureIndex::new();
        let items = sample();
        idx.insert(items[0].0, &items[0].1);
        idx.insert(items[2].0, &items[2].1);
        let before: Vec<FeatureId> = idx.ids().collect();
        idx.insert(items[4].0, &items[4].1);
        let after: Vec<FeatureId> = idx.ids().filter(|id| before.contains(id)).collect();
        assert_eq!(before, after);
        assert_eq!(idx.len(), 3);
    }
}
