//! Features and the append-only feature store.
//!
//! # Invariants
//!
//! - Feature ids are dense, 0-based and assigned in creation order; features are
//!   immutable once created and never removed.
//! - A base feature has `dims == [d]` and `identity == {id}`.
//! - A refined feature's `dims` is the sorted union of its parents' dims, its
//!   `identity` is the union of their identities, and its `center` is parent 1's
//!   center overwritten by parent 2's center on parent 2's dims.
//! - Parents of a refined feature are combination-compatible (equal centers on
//!   every shared dimension), so the dimension union loses no information.
//! - No two features share an identity.
//! - Both ordering indices always hold exactly one entry per feature.

use alloc::vec::Vec;

use hashbrown::HashMap;
use tracing::debug;

use crate::candidate::CandidateTracker;
use crate::identity::{FeatureId, Identity, PairKey};
use crate::ordering::{FeatureIndex, GeneralFirst, SpecificFirst};

/// A kernel feature: a prototype point constrained on a subset of dimensions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feature {
    /// Dimensions this feature depends on, strictly ascending.
    pub dims: Vec<usize>,
    /// Prototype point in the full state space; only `dims` coordinates matter.
    pub center: Vec<f64>,
    /// Base-feature ids whose conjunction this feature represents.
    pub identity: Identity,
}

impl Feature {
    /// `true` for a single-dimension base feature.
    pub fn is_base(&self) -> bool {
        self.identity.is_base()
    }
}

/// Append-only collection of features with both ordering indices and the
/// identity lookups used to avoid creating a combination twice.
#[derive(Clone, Debug, Default)]
pub struct FeatureStore {
    features: Vec<Feature>,
    /// Parent pair of each feature, indexed by id (self-pair for bases).
    parents: Vec<PairKey>,
    general: FeatureIndex<GeneralFirst>,
    specific: FeatureIndex<SpecificFirst>,
    /// Pair of parent identities → id of the feature they produced.
    /// Base features are registered under their self-pair.
    pair_to_id: HashMap<PairKey, FeatureId>,
    /// Full identity → feature id.
    identity_to_id: HashMap<Identity, FeatureId>,
}

impl FeatureStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// `true` before the first feature is added.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature by id.
    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    /// All features in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Features in general-first order.
    pub fn general_first(&self) -> &FeatureIndex<GeneralFirst> {
        &self.general
    }

    /// Features in specific-first order.
    pub fn specific_first(&self) -> &FeatureIndex<SpecificFirst> {
        &self.specific
    }

    /// Id of the feature with exactly this identity.
    pub fn id_for_identity(&self, identity: &Identity) -> Option<FeatureId> {
        self.identity_to_id.get(identity).copied()
    }

    /// Parent identities a feature was built from (its self-pair for a base).
    pub fn parents_of(&self, id: FeatureId) -> Option<&PairKey> {
        self.parents.get(id)
    }

    /// Id of the feature created from this pair of parent identities.
    pub fn id_for_pair(&self, key: &PairKey) -> Option<FeatureId> {
        self.pair_to_id.get(key).copied()
    }

    /// Panic if the ordering indices and the feature list disagree.
    ///
    /// A mismatch can only come from a bug in incremental maintenance.
    pub fn assert_consistent(&self) {
        assert_eq!(
            self.features.len(),
            self.general.len(),
            "general-first index out of sync with feature store"
        );
        assert_eq!(
            self.features.len(),
            self.parents.len(),
            "parent list out of sync with feature store"
        );
        assert_eq!(
            self.features.len(),
            self.specific.len(),
            "specific-first index out of sync with feature store"
        );
    }

    /// Create a base feature on `dim` centred at `center` and propose it as a
    /// candidate partner for every existing feature not already using `dim`.
    pub fn add_base(
        &mut self,
        center: &[f64],
        dim: usize,
        candidates: &mut CandidateTracker,
    ) -> FeatureId {
        let id = self.features.len();
        let identity = Identity::base(id);
        self.push(
            Feature {
                dims: alloc::vec![dim],
                center: center.to_vec(),
                identity: identity.clone(),
            },
            PairKey::of(&identity, &identity),
        );

        for other in &self.features[..id] {
            if !other.dims.contains(&dim) {
                candidates.insert(PairKey::of(&other.identity, &identity));
            }
        }
        debug!(
            id,
            dim,
            candidates = candidates.len(),
            "new base feature"
        );
        id
    }

    /// Promote the candidate `key` combining `parent1` and `parent2` into a
    /// refined feature, then propose the new feature as a partner for every
    /// existing feature it may still be combined with.
    pub fn add_refined(
        &mut self,
        parent1: FeatureId,
        parent2: FeatureId,
        key: &PairKey,
        candidates: &mut CandidateTracker,
    ) -> FeatureId {
        let id = self.features.len();
        let (p1, p2) = (&self.features[parent1], &self.features[parent2]);

        let dims = merge_dims(&p1.dims, &p2.dims);
        let identity = p1.identity.union(&p2.identity);
        let mut center = p1.center.clone();
        for &d in &p2.dims {
            center[d] = p2.center[d];
        }
        let pair = PairKey::of(&p1.identity, &p2.identity);

        self.push(
            Feature {
                dims,
                center,
                identity,
            },
            pair,
        );
        candidates.remove(key);

        let new_identity = &self.features[id].identity;
        for f in 0..id {
            let other = &self.features[f];
            let pair = PairKey::of(&other.identity, new_identity);
            if candidates.contains(&pair) || self.pair_to_id.contains_key(&pair) {
                continue;
            }
            if self.identity_to_id.contains_key(&pair.union()) {
                continue;
            }
            if self.combination_compatible(f, id) {
                candidates.insert(pair);
            }
        }
        debug!(
            id,
            dims = ?self.features[id].dims,
            identity = %self.features[id].identity,
            candidates = candidates.len(),
            "new refined feature"
        );
        id
    }

    /// `true` if the two features' centers agree exactly on every dimension
    /// both depend on. Incompatible features must never be combined.
    pub fn combination_compatible(&self, id1: FeatureId, id2: FeatureId) -> bool {
        let (a, b) = (&self.features[id1], &self.features[id2]);
        let (mut i, mut j) = (0, 0);
        while i < a.dims.len() && j < b.dims.len() {
            let (da, db) = (a.dims[i], b.dims[j]);
            if da == db {
                if a.center[da] != b.center[db] {
                    return false;
                }
                i += 1;
                j += 1;
            } else if da < db {
                i += 1;
            } else {
                j += 1;
            }
        }
        true
    }

    /// Re-insert a feature verbatim (snapshot restore). Ids must arrive in order.
    #[cfg(feature = "serde")]
    pub(crate) fn restore(&mut self, feature: Feature, parents: PairKey) {
        self.push(feature, parents);
    }

    fn push(&mut self, feature: Feature, parents: PairKey) {
        let id = self.features.len();
        self.general.insert(id, &feature.dims);
        self.specific.insert(id, &feature.dims);
        self.pair_to_id.insert(parents.clone(), id);
        self.parents.push(parents);
        self.identity_to_id.insert(feature.identity.clone(), id);
        self.features.push(feature);
    }
}

/// Sorted union of two ascending dimension lists.
fn merge_dims(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else if b[j] < a[i] {
            out.push(b[j]);
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
