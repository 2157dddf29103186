//! Candidate combinations and their online relevance statistic.
//!
//! A [`Candidate`] is a hypothesised conjunction of two existing features. It
//! lives in the [`CandidateTracker`] from creation until promotion, when it is
//! removed and replaced by a refined feature. Candidates are never demoted.
//!
//! # Relevance
//!
//! For each step in which both parents are evaluated together with activations
//! `φ_i`, `φ_j` and TD error `e`:
//!
//! ```text
//! total_activation += (φ_i · φ_j)²
//! total_error      +=  φ_i · φ_j · e
//! relevance         = |total_error| / sqrt(total_activation)
//! ```
//!
//! Two running sums are a sufficient statistic; no per-step history is kept.
//! With consistent-sign errors and constant activation the relevance after `n`
//! updates is `sqrt(n) · |e|`.

use hashbrown::{HashMap, HashSet};

use crate::identity::{Identity, PairKey};

/// Online relevance statistics for one proposed combination.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate {
    /// Running sum of `(φ_i · φ_j)²`.
    pub total_activation: f64,
    /// Running sum of `φ_i · φ_j · tdError`.
    pub total_error: f64,
    /// `|total_error| / sqrt(total_activation)`, 0 before any activation.
    pub relevance: f64,
}

impl Candidate {
    /// Fresh candidate with zero statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one joint observation into the running sums and return the new relevance.
    pub fn update(&mut self, td_error: f64, phi1: f64, phi2: f64) -> f64 {
        let joint = phi1 * phi2;
        self.total_activation += joint * joint;
        self.total_error += joint * td_error;
        self.relevance = if self.total_activation > 0.0 {
            libm::fabs(self.total_error) / libm::sqrt(self.total_activation)
        } else {
            0.0
        };
        self.relevance
    }
}

/// Map from unordered identity pairs to pending candidates.
///
/// Also remembers the identity each pending candidate would create, so two
/// different pairs that would produce the same conjunction are never both pending.
#[derive(Clone, Debug, Default)]
pub struct CandidateTracker {
    candidates: HashMap<PairKey, Candidate>,
    pending_unions: HashSet<Identity>,
}

impl CandidateTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a zero-valued candidate for `key`.
    ///
    /// Returns `false` (and changes nothing) if the pair is already pending or
    /// another pending pair already yields the same union identity.
    pub fn insert(&mut self, key: PairKey) -> bool {
        self.insert_with(key, Candidate::new())
    }

    /// Insert a candidate carrying existing statistics (used when restoring).
    pub fn insert_with(&mut self, key: PairKey, candidate: Candidate) -> bool {
        if self.candidates.contains_key(&key) {
            return false;
        }
        if !self.pending_unions.insert(key.union()) {
            return false;
        }
        self.candidates.insert(key, candidate);
        true
    }

    /// Look up a candidate.
    pub fn get(&self, key: &PairKey) -> Option<&Candidate> {
        self.candidates.get(key)
    }

    /// `true` if the pair is pending.
    pub fn contains(&self, key: &PairKey) -> bool {
        self.candidates.contains_key(key)
    }

    /// `true` if some pending pair would create `identity`.
    pub fn is_pending_union(&self, identity: &Identity) -> bool {
        self.pending_unions.contains(identity)
    }

    /// Update the statistics of an existing candidate.
    ///
    /// Returns the new relevance, or `None` if no candidate exists for `key`.
    pub fn update(&mut self, key: &PairKey, td_error: f64, phi1: f64, phi2: f64) -> Option<f64> {
        self.candidates
            .get_mut(key)
            .map(|c| c.update(td_error, phi1, phi2))
    }

    /// Remove a candidate (on promotion).
    pub fn remove(&mut self, key: &PairKey) -> Option<Candidate> {
        let removed = self.candidates.remove(key)?;
        self.pending_unions.remove(&key.union());
        Some(removed)
    }

    /// Number of pending candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate over all pending `(key, candidate)` pairs (arbitrary order).
    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Candidate)> {
        self.candidates.iter()
    }
}
