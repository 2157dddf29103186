//! Portable snapshot of a discovery engine's learned state.
//!
//! A snapshot holds the configuration, every feature with the parent pair it
//! was built from, and every pending candidate with its running sums. That is
//! enough to rebuild both ordering indices and all lookup maps, so a restored
//! engine continues exactly where the captured one stopped.
//!
//! Requires the `serde` feature. The wire format is whatever serde backend the
//! caller picks (JSON in the tests).
//!
//! ```rust,ignore
//! use kifdd_core::snapshot::EngineSnapshot;
//!
//! let snapshot = EngineSnapshot::capture(&engine);
//! let json = serde_json::to_string(&snapshot).unwrap();
//! let restored = serde_json::from_str::<EngineSnapshot>(&json)?.restore()?;
//! ```

use alloc::format;
use alloc::vec::Vec;

use crate::candidate::{Candidate, CandidateTracker};
use crate::config::DiscoveryConfig;
use crate::engine::DiscoveryEngine;
use crate::error::{DiscoveryError, Result};
use crate::feature::{Feature, FeatureStore};
use crate::identity::{Identity, PairKey};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Serializable record of a [`DiscoveryEngine`].
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct EngineSnapshot {
    /// Format version, [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Engine configuration.
    pub config: DiscoveryConfig,
    /// Features in id order.
    pub features: Vec<FeatureRecord>,
    /// Pending candidates, in no particular order.
    pub candidates: Vec<CandidateRecord>,
}

/// One feature and the pair of identities it was created from.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    /// The feature itself.
    pub feature: Feature,
    /// Parent identities (the self-pair for a base feature).
    pub parents: PairKey,
}

/// One pending candidate.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct CandidateRecord {
    /// The unordered pair of identities it would combine.
    pub key: PairKey,
    /// Running relevance statistics.
    pub stats: Candidate,
}

impl EngineSnapshot {
    /// Capture the full state of `engine`.
    pub fn capture(engine: &DiscoveryEngine) -> Self {
        let store = engine.store();
        let features = store
            .iter()
            .enumerate()
            .filter_map(|(id, f)| {
                store.parents_of(id).map(|p| FeatureRecord {
                    feature: f.clone(),
                    parents: p.clone(),
                })
            })
            .collect();
        let candidates = engine
            .candidates()
            .iter()
            .map(|(k, c)| CandidateRecord {
                key: k.clone(),
                stats: c.clone(),
            })
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            config: engine.config().clone(),
            features,
            candidates,
        }
    }

    /// Number of features in the snapshot.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Rebuild an engine from this snapshot.
    ///
    /// Fails if the configuration does not validate or the records could not
    /// have been produced by a running engine: a base identity that is not its
    /// own id, a refined identity naming anything but earlier bases, parents
    /// that do not combine into the identity, unsorted or out-of-range dims, a
    /// repeated identity, or a candidate that names an unknown feature or would
    /// recreate an existing one.
    pub fn restore(&self) -> Result<DiscoveryEngine> {
        if self.version != SNAPSHOT_VERSION {
            return Err(DiscoveryError::SnapshotMismatch(format!(
                "unsupported version {}",
                self.version
            )));
        }
        self.config.validate()?;
        let dims_n = self.config.dimensions();

        let mut store = FeatureStore::new();
        for (id, record) in self.features.iter().enumerate() {
            let f = &record.feature;
            if f.dims.is_empty() || f.dims.windows(2).any(|w| w[0] >= w[1]) {
                return Err(mismatch(id, "dims must be non-empty and strictly ascending"));
            }
            if f.dims.iter().any(|&d| d >= dims_n) || f.center.len() < dims_n {
                return Err(mismatch(id, "dims or center exceed the configured dimensionality"));
            }
            if f.identity.is_base() && f.identity != Identity::base(id) {
                return Err(mismatch(id, "base identity does not match its id"));
            }
            if !f.identity.is_base() {
                let names_bases = f
                    .identity
                    .ids()
                    .iter()
                    .all(|&b| b < id && store.get(b).is_some_and(Feature::is_base));
                if !names_bases {
                    return Err(mismatch(id, "refined identity must name earlier base features"));
                }
            }
            if record.parents.union() != f.identity {
                return Err(mismatch(id, "parents do not combine into the identity"));
            }
            if store.id_for_identity(&f.identity).is_some() {
                return Err(mismatch(id, "identity already used by an earlier feature"));
            }
            if store.id_for_pair(&record.parents).is_some() {
                return Err(mismatch(id, "parent pair already produced an earlier feature"));
            }
            store.restore(f.clone(), record.parents.clone());
        }
        store.assert_consistent();

        let mut candidates = CandidateTracker::new();
        for record in &self.candidates {
            let (a, b) = record.key.sides();
            if store.id_for_identity(a).is_none() || store.id_for_identity(b).is_none() {
                return Err(DiscoveryError::SnapshotMismatch(format!(
                    "candidate {} × {} refers to an unknown feature",
                    a, b
                )));
            }
            if store.id_for_identity(&record.key.union()).is_some() {
                return Err(DiscoveryError::SnapshotMismatch(format!(
                    "candidate {} × {} would recreate an existing feature",
                    a, b
                )));
            }
            if !candidates.insert_with(record.key.clone(), record.stats.clone()) {
                return Err(DiscoveryError::SnapshotMismatch(format!(
                    "duplicate candidate {} × {}",
                    a, b
                )));
            }
        }

        Ok(DiscoveryEngine::from_parts(
            self.config.clone(),
            store,
            candidates,
        ))
    }
}

fn mismatch(id: usize, what: &str) -> DiscoveryError {
    DiscoveryError::SnapshotMismatch(format!("feature {}: {}", id, what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use alloc::vec;

    fn grown_engine() -> DiscoveryEngine {
        let config = DiscoveryConfig {
            activation_threshold: 0.05,
            discovery_threshold: 0.5,
            widths: vec![1.0, 1.0],
            max_neighbor_similarity: 0.9,
            max_active_neighbors: 1,
            ..DiscoveryConfig::default()
        };
        let mut engine = DiscoveryEngine::new(config).unwrap();
        let s = [0.0, 0.0];
        engine.discover(&s, 0, 0.3, &[]).unwrap();
        for _ in 0..3 {
            let phi = engine.phi(&s).unwrap();
            engine.discover(&s, 0, 0.3, &phi).unwrap();
        }
        engine.discover(&[3.0, 3.0], 1, -0.2, &[]).unwrap();
        engine
    }

    #[test]
    fn test_capture_restore_preserves_features_and_candidates() {
        let engine = grown_engine();
        let snap = EngineSnapshot::capture(&engine);
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.feature_count(), engine.feature_count());

        let restored = snap.restore().expect("consistent snapshot");
        assert_eq!(restored.feature_count(), engine.feature_count());
        assert_eq!(restored.candidate_count(), engine.candidate_count());
        for id in 0..engine.feature_count() {
            assert_eq!(restored.feature(id), engine.feature(id));
            assert_eq!(restored.store().parents_of(id), engine.store().parents_of(id));
        }
        assert_eq!(
            restored.phi(&[0.4, -0.2]).unwrap(),
            engine.phi(&[0.4, -0.2]).unwrap()
        );
    }

    #[test]
    fn test_restored_engine_keeps_discovering_identically() {
        let mut original = grown_engine();
        let mut restored = EngineSnapshot::capture(&original).restore().unwrap();
        let steps = [([3.0, 3.0], 0.4), ([3.0, 3.0], 0.4), ([0.0, 3.0], 0.9), ([3.0, 3.0], 0.4)];
        for (s, e) in steps {
            let a = original.discover(&s, 0, e, &[]).unwrap();
            let b = restored.discover(&s, 0, e, &[]).unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(original.feature_count(), restored.feature_count());
        assert_eq!(
            original.store().specific_first().ids().collect::<Vec<_>>(),
            restored.store().specific_first().ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_restore_rejects_wrong_version() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        snap.version = 99;
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_rejects_duplicate_identity() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        let dup = snap.features[2].clone();
        snap.features.push(dup);
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_rejects_out_of_range_dimension() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        snap.features[0].feature.dims = vec![7];
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_rejects_dangling_candidate() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        snap.candidates.push(CandidateRecord {
            key: PairKey::new(Identity::base(0), Identity::base(40)),
            stats: Candidate::new(),
        });
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_rejects_refined_identity_over_refined_feature() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        // feature 2 is {0, 1}; make feature 2 claim {0, 2}
        snap.features[2].feature.identity = Identity::from_ids(vec![0, 2]);
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_rejects_parents_that_disagree_with_identity() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        snap.features[2].parents = PairKey::new(Identity::base(0), Identity::base(3));
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_rejects_candidate_for_existing_feature() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        snap.candidates.push(CandidateRecord {
            key: PairKey::new(Identity::base(1), Identity::base(0)),
            stats: Candidate::new(),
        });
        assert!(matches!(snap.restore(), Err(DiscoveryError::SnapshotMismatch(_))));
    }

    #[test]
    fn test_restore_validates_config() {
        let mut snap = EngineSnapshot::capture(&grown_engine());
        snap.config.widths = vec![];
        assert_eq!(snap.restore().unwrap_err(), DiscoveryError::MissingWidths);
    }
}
