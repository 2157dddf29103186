//! Feature identities and canonical candidate keys.
//!
//! An [`Identity`] is the set of base-feature ids whose conjunction a feature
//! represents. It is stored as a strictly ascending id list so that equality,
//! hashing and subset tests are all plain merge-style walks.
//!
//! A [`PairKey`] is an *unordered* pair of identities. The two sides are put in
//! a canonical order when the key is built, so `PairKey::new(a, b)` and
//! `PairKey::new(b, a)` are the same key: call sites cannot create a duplicate
//! candidate by presenting a pair in the other order.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::error::DiscoveryError;

/// Dense, 0-based feature id. Assigned once, never reused.
pub type FeatureId = usize;

/// Set of base-feature ids, strictly ascending.
///
/// Deserialisation goes through [`Identity::try_from`], so a decoded identity is
/// always canonical.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Identity(Vec<FeatureId>);

impl Identity {
    /// Identity of a base feature: `{id}`.
    pub fn base(id: FeatureId) -> Self {
        Self(alloc::vec![id])
    }

    /// Build an identity from arbitrary ids, sorting and dropping duplicates.
    pub fn from_ids(mut ids: Vec<FeatureId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// Union of two identities (merge of two sorted lists).
    pub fn union(&self, other: &Identity) -> Identity {
        let (a, b) = (&self.0, &other.0);
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
        Identity(out)
    }

    /// Base ids in ascending order.
    pub fn ids(&self) -> &[FeatureId] {
        &self.0
    }

    /// Number of base ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for the (never constructed in practice) empty identity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if this identity names exactly one base feature.
    pub fn is_base(&self) -> bool {
        self.0.len() == 1
    }

    /// Merge-style test that every id of `self` is a key of `active`.
    ///
    /// O(|self| + |active|); `active` is walked once in key order.
    pub fn is_covered_by<V>(&self, active: &BTreeMap<FeatureId, V>) -> bool {
        let mut keys = active.keys();
        'ids: for &id in &self.0 {
            for &k in keys.by_ref() {
                if k == id {
                    continue 'ids;
                }
                if k > id {
                    return false;
                }
            }
            return false;
        }
        true
    }

    /// `true` if `self ⊆ other`.
    pub fn is_subset_of(&self, other: &Identity) -> bool {
        let mut rest = other.0.iter();
        'ids: for &id in &self.0 {
            for &o in rest.by_ref() {
                if o == id {
                    continue 'ids;
                }
                if o > id {
                    return false;
                }
            }
            return false;
        }
        true
    }

    /// `true` if `self ⊊ other`.
    pub fn is_strict_subset_of(&self, other: &Identity) -> bool {
        self.len() < other.len() && self.is_subset_of(other)
    }
}

impl TryFrom<Vec<FeatureId>> for Identity {
    type Error = DiscoveryError;

    /// Accept `ids` only if already canonical: non-empty and strictly ascending.
    fn try_from(ids: Vec<FeatureId>) -> Result<Self, Self::Error> {
        if ids.is_empty() || ids.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DiscoveryError::InvalidIdentity(ids));
        }
        Ok(Self(ids))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Identity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Vec::<FeatureId>::deserialize(deserializer)?;
        Identity::try_from(ids).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", id)?;
        }
        f.write_str("}")
    }
}

/// Canonical unordered pair of identities, used to key candidates and the
/// pair → feature map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PairKey {
    lo: Identity,
    hi: Identity,
}

impl PairKey {
    /// Build the key, ordering the two sides canonically.
    pub fn new(a: Identity, b: Identity) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// Key for a pair of borrowed identities.
    pub fn of(a: &Identity, b: &Identity) -> Self {
        Self::new(a.clone(), b.clone())
    }

    /// The two sides in canonical order.
    pub fn sides(&self) -> (&Identity, &Identity) {
        (&self.lo, &self.hi)
    }

    /// Identity of the feature this pair would create.
    pub fn union(&self) -> Identity {
        self.lo.union(&self.hi)
    }
}

/// Decodes either side order and canonicalises through [`PairKey::new`].
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PairKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Sides {
            lo: Identity,
            hi: Identity,
        }
        let Sides { lo, hi } = Sides::deserialize(deserializer)?;
        Ok(PairKey::new(lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(ids: &[FeatureId]) -> Identity {
        Identity::from_ids(ids.to_vec())
    }

    #[test]
    fn test_from_ids_sorts_and_dedups() {
        assert_eq!(id(&[5, 1, 3, 1]).ids(), &[1, 3, 5]);
    }

    #[test]
    fn test_union_is_sorted_merge() {
        let u = id(&[0, 4, 7]).union(&id(&[1, 4, 9]));
        assert_eq!(u.ids(), &[0, 1, 4, 7, 9]);
    }

    #[test]
    fn test_covered_by_active_map() {
        let mut active: BTreeMap<FeatureId, f64> = BTreeMap::new();
        for k in [0, 2, 3, 8] {
            active.insert(k, 1.0);
        }
        assert!(id(&[2, 8]).is_covered_by(&active));
        assert!(id(&[0]).is_covered_by(&active));
        assert!(!id(&[2, 5]).is_covered_by(&active));
        assert!(!id(&[9]).is_covered_by(&active));
        assert!(!id(&[1]).is_covered_by(&active));
    }

    #[test]
    fn test_strict_subset() {
        assert!(id(&[1, 3]).is_strict_subset_of(&id(&[1, 2, 3])));
        assert!(!id(&[1, 3]).is_strict_subset_of(&id(&[1, 3])));
        assert!(id(&[1, 3]).is_subset_of(&id(&[1, 3])));
        assert!(!id(&[1, 4]).is_subset_of(&id(&[1, 2, 3])));
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = id(&[0]);
        let b = id(&[1, 2]);
        assert_eq!(PairKey::of(&a, &b), PairKey::of(&b, &a));
        assert_eq!(PairKey::of(&a, &b).union().ids(), &[0, 1, 2]);
    }

    #[test]
    fn test_pair_key_hash_matches_for_both_orders() {
        let mut map: hashbrown::HashMap<PairKey, u32> = hashbrown::HashMap::new();
        map.insert(PairKey::of(&id(&[3]), &id(&[1])), 7);
        assert_eq!(map.get(&PairKey::of(&id(&[1]), &id(&[3]))), Some(&7));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_try_from_rejects_non_canonical_ids() {
        assert_eq!(Identity::try_from(alloc::vec![1, 4, 9]), Ok(id(&[9, 4, 1])));
        for bad in [alloc::vec![2, 1], alloc::vec![3, 3], alloc::vec![]] {
            assert_eq!(
                Identity::try_from(bad.clone()),
                Err(DiscoveryError::InvalidIdentity(bad))
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(alloc::format!("{}", id(&[2, 0])), "{0, 2}");
    }
}
