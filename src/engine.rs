//! The discovery engine: activation lookup, density-controlled base creation,
//! and candidate promotion.
//!
//! A [`DiscoveryEngine`] exclusively owns its [`FeatureStore`] and
//! [`CandidateTracker`]. Calls must be serialised: `discover` takes `&mut self`,
//! `phi` only reads. The feature set only ever grows, so a feature count read
//! earlier stays a valid bound on ids forever.
//!
//! # One `discover` step
//!
//! ```text
//! state ─► active bases per dimension
//!            │
//!            ├─► density control ─► add_base (per under-covered dimension)
//!            │
//!            ├─► φ (refreshed if the feature set grew)
//!            │
//!            └─► for each pair of active bases in distinct dimensions:
//!                   candidate.update(φ_i, φ_j, tdError)
//!                   relevance > discovery_threshold ─► add_refined
//! ```

use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::activation::{self, feature_value};
use crate::candidate::{Candidate, CandidateTracker};
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use crate::feature::{Feature, FeatureStore};
use crate::identity::{FeatureId, Identity, PairKey};

/// Incremental kernel feature discovery over a continuous state space.
#[derive(Clone, Debug)]
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    store: FeatureStore,
    candidates: CandidateTracker,
}

impl DiscoveryEngine {
    /// Create an engine with no features.
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: FeatureStore::new(),
            candidates: CandidateTracker::new(),
        })
    }

    /// Reassemble an engine from already-validated parts.
    #[cfg(feature = "serde")]
    pub(crate) fn from_parts(
        config: DiscoveryConfig,
        store: FeatureStore,
        candidates: CandidateTracker,
    ) -> Self {
        Self {
            config,
            store,
            candidates,
        }
    }

    // ── Activation ─────────────────────────────────────────────────────────

    /// Activation vector of `state`: one value per feature, in id order.
    pub fn phi(&self, state: &[f64]) -> Result<Vec<f64>> {
        self.check_state(state)?;
        Ok(activation::evaluate(&self.store, &self.config, state))
    }

    /// Kernel value of every feature at `state`, without sparsification or
    /// normalisation.
    pub fn raw_phi(&self, state: &[f64]) -> Result<Vec<f64>> {
        self.check_state(state)?;
        Ok(activation::raw(&self.store, &self.config, state))
    }

    // ── Discovery ──────────────────────────────────────────────────────────

    /// Observe one transition and grow the feature set.
    ///
    /// - `state`: the state the TD error was observed in.
    /// - `action`: the action taken; carried for diagnostics only.
    /// - `td_error`: temporal-difference error of this step.
    /// - `previous_phi`: the learner's activation vector for `state`. It is
    ///   recomputed if bases were added in this call or its length does not
    ///   match the current feature count.
    ///
    /// Returns the number of features created (bases plus refinements).
    pub fn discover(
        &mut self,
        state: &[f64],
        action: usize,
        td_error: f64,
        previous_phi: &[f64],
    ) -> Result<usize> {
        self.check_state(state)?;
        self.store.assert_consistent();

        let active = activation::active_bases_per_dim(&self.store, &self.config, state);

        let mut bases = 0;
        for dim in 0..self.config.dimensions() {
            let neighbors = active.get(&dim).map(Vec::as_slice).unwrap_or(&[]);
            if neighbors.len() >= self.config.max_active_neighbors {
                continue;
            }
            if self.has_close_neighbor(neighbors, state) {
                continue;
            }
            self.store.add_base(state, dim, &mut self.candidates);
            bases += 1;
        }

        let refreshed;
        let phi: &[f64] = if bases > 0 || previous_phi.len() != self.store.len() {
            refreshed = activation::evaluate(&self.store, &self.config, state);
            &refreshed
        } else {
            previous_phi
        };

        let mut refined = 0;
        let dims: Vec<&Vec<FeatureId>> = active.values().collect();
        for (i, ids_i) in dims.iter().enumerate() {
            for &id1 in ids_i.iter() {
                for ids_j in &dims[i + 1..] {
                    for &id2 in ids_j.iter() {
                        let key = PairKey::of(self.identity(id1), self.identity(id2));
                        let Some(relevance) =
                            self.candidates.update(&key, td_error, phi[id1], phi[id2])
                        else {
                            continue;
                        };
                        trace!(id1, id2, relevance, "candidate updated");
                        if relevance > self.config.discovery_threshold {
                            self.store.add_refined(id1, id2, &key, &mut self.candidates);
                            refined += 1;
                        }
                    }
                }
            }
        }

        if bases + refined > 0 {
            debug!(
                action,
                td_error,
                bases,
                refined,
                features = self.store.len(),
                candidates = self.candidates.len(),
                "feature set grew"
            );
        }
        Ok(bases + refined)
    }

    // ── Introspection ──────────────────────────────────────────────────────

    /// Engine configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Current number of features; also the length of every `phi` vector.
    pub fn feature_count(&self) -> usize {
        self.store.len()
    }

    /// Number of pending candidates.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Feature by id.
    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.store.get(id)
    }

    /// All features in id order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.store.iter()
    }

    /// The underlying feature store (read-only).
    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    /// Pending candidates (read-only).
    pub fn candidates(&self) -> &CandidateTracker {
        &self.candidates
    }

    /// Pending candidate combining features `a` and `b`, in either order.
    pub fn candidate(&self, a: FeatureId, b: FeatureId) -> Option<&Candidate> {
        let (fa, fb) = (self.store.get(a)?, self.store.get(b)?);
        self.candidates.get(&PairKey::of(&fa.identity, &fb.identity))
    }

    /// Id of the feature representing exactly `identity`.
    pub fn feature_id_for(&self, identity: &Identity) -> Option<FeatureId> {
        self.store.id_for_identity(identity)
    }

    // ── Internal helpers ───────────────────────────────────────────────────

    fn check_state(&self, state: &[f64]) -> Result<()> {
        let expected = self.config.dimensions();
        if state.len() < expected {
            return Err(DiscoveryError::StateTooShort {
                expected,
                got: state.len(),
            });
        }
        Ok(())
    }

    fn has_close_neighbor(&self, neighbors: &[FeatureId], state: &[f64]) -> bool {
        neighbors.iter().any(|&id| {
            self.store
                .get(id)
                .map(|f| feature_value(&self.config, f, state))
                .is_some_and(|v| v > self.config.max_neighbor_similarity)
        })
    }

    fn identity(&self, id: FeatureId) -> &Identity {
        match self.store.get(id) {
            Some(f) => &f.identity,
            None => unreachable!("active base {} missing from store", id),
        }
    }
}
