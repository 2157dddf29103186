//! Snapshot round-trip integration tests.
//!
//! Verifies that a grown engine can be captured as an `EngineSnapshot`,
//! serialised to JSON, deserialised back, and restored into an engine that
//! produces the same activations and keeps discovering the same features.

#[cfg(feature = "serde")]
mod tests {
    use kifdd_core::snapshot::{CandidateRecord, EngineSnapshot, SNAPSHOT_VERSION};
    use kifdd_core::{
        Candidate, DiscoveryConfig, DiscoveryEngine, DiscoveryError, Identity, Kernel, PairKey,
        Sparsification,
    };

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn make_engine() -> DiscoveryEngine {
        let config = DiscoveryConfig {
            activation_threshold: 0.05,
            discovery_threshold: 0.4,
            kernel: Kernel::Triangle,
            widths: vec![1.0, 1.0, 2.0],
            sparsification: Sparsification::Smoothed,
            max_neighbor_similarity: 0.8,
            max_active_neighbors: 2,
            normalization: true,
        };
        let mut engine = DiscoveryEngine::new(config).unwrap();
        let states = [
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.5, 0.3, 1.0],
            [0.5, 0.3, 1.0],
            [2.0, -1.0, 0.5],
            [0.1, 0.0, 0.2],
        ];
        for (k, s) in states.iter().enumerate() {
            let phi = engine.phi(s).unwrap();
            engine.discover(s, k % 3, 0.6, &phi).unwrap();
        }
        engine
    }

    fn round_trip(engine: &DiscoveryEngine) -> DiscoveryEngine {
        let snapshot = EngineSnapshot::capture(engine);
        let json = serde_json::to_string(&snapshot).expect("serialise");
        let back: EngineSnapshot = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, snapshot);
        back.restore().expect("restore")
    }

    // ── Tests ────────────────────────────────────────────────────────────────

    #[test]
    fn test_json_round_trip_preserves_state() {
        let engine = make_engine();
        assert!(engine.features().any(|f| !f.is_base()), "fixture should refine");
        let restored = round_trip(&engine);

        assert_eq!(restored.config(), engine.config());
        assert_eq!(restored.feature_count(), engine.feature_count());
        assert_eq!(restored.candidate_count(), engine.candidate_count());
        for (a, b) in engine.features().zip(restored.features()) {
            assert_eq!(a, b);
        }
        for (key, c) in engine.candidates().iter() {
            assert_eq!(restored.candidates().get(key), Some(c));
        }
    }

    #[test]
    fn test_restored_phi_is_identical() {
        let engine = make_engine();
        let restored = round_trip(&engine);
        for s in [[0.2, 0.1, 0.4], [0.5, 0.3, 1.0], [1.8, -0.9, 0.0], [9.0, 9.0, 9.0]] {
            assert_eq!(engine.phi(&s).unwrap(), restored.phi(&s).unwrap(), "state {:?}", s);
        }
    }

    #[test]
    fn test_restored_engine_continues_identically() {
        let mut engine = make_engine();
        let mut restored = round_trip(&engine);
        let steps = [[0.5, 0.3, 1.0], [2.0, -1.0, 0.5], [2.1, -1.0, 0.4], [0.0, 0.0, 0.0]];
        for s in steps {
            let pa = engine.phi(&s).unwrap();
            let pb = restored.phi(&s).unwrap();
            assert_eq!(
                engine.discover(&s, 0, 0.7, &pa).unwrap(),
                restored.discover(&s, 0, 0.7, &pb).unwrap()
            );
        }
        assert_eq!(engine.feature_count(), restored.feature_count());
    }

    #[test]
    fn test_version_constant() {
        let snapshot = EngineSnapshot::capture(&make_engine());
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn test_tampered_json_is_rejected() {
        let snapshot = EngineSnapshot::capture(&make_engine());
        let mut value = serde_json::to_value(&snapshot).unwrap();
        // make feature 1 claim to be base {0}
        value["features"][1]["feature"]["identity"] = serde_json::json!([0]);
        let tampered: EngineSnapshot = serde_json::from_value(value).unwrap();
        assert!(matches!(
            tampered.restore(),
            Err(DiscoveryError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_unsorted_identity_fails_to_decode() {
        let snapshot = EngineSnapshot::capture(&make_engine());
        let refined = snapshot
            .features
            .iter()
            .position(|r| !r.feature.is_base())
            .expect("fixture should refine");
        let mut reversed = snapshot.features[refined].feature.identity.ids().to_vec();
        reversed.reverse();

        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["features"][refined]["feature"]["identity"] = serde_json::json!(reversed);
        let err = serde_json::from_value::<EngineSnapshot>(value).unwrap_err();
        assert!(err.to_string().contains("strictly ascending"), "error: {}", err);
    }

    #[test]
    fn test_duplicate_identity_ids_fail_to_decode() {
        let snapshot = EngineSnapshot::capture(&make_engine());
        let mut value = serde_json::to_value(&snapshot).unwrap();
        value["features"][0]["feature"]["identity"] = serde_json::json!([0, 0]);
        assert!(serde_json::from_value::<EngineSnapshot>(value).is_err());
    }

    #[test]
    fn test_swapped_candidate_sides_are_canonicalised() {
        let engine = make_engine();
        let snapshot = EngineSnapshot::capture(&engine);
        assert!(!snapshot.candidates.is_empty(), "fixture should leave candidates pending");

        let mut value = serde_json::to_value(&snapshot).unwrap();
        for candidate in value["candidates"].as_array_mut().unwrap() {
            let key = &mut candidate["key"];
            let (lo, hi) = (key["lo"].take(), key["hi"].take());
            key["lo"] = hi;
            key["hi"] = lo;
        }
        let decoded: EngineSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, snapshot);

        let restored = decoded.restore().expect("restore");
        for record in &snapshot.candidates {
            let (a, b) = record.key.sides();
            let (ia, ib) = (
                restored.feature_id_for(a).unwrap(),
                restored.feature_id_for(b).unwrap(),
            );
            assert_eq!(restored.candidate(ib, ia), engine.candidate(ia, ib));
            assert!(restored.candidate(ia, ib).is_some(), "{} × {} lost", a, b);
        }
    }

    #[test]
    fn test_candidate_recreating_a_feature_is_rejected() {
        let mut snapshot = EngineSnapshot::capture(&make_engine());
        let parents = snapshot
            .features
            .iter()
            .find(|r| !r.feature.is_base())
            .map(|r| r.parents.clone())
            .expect("fixture should refine");
        snapshot.candidates.push(CandidateRecord {
            key: parents,
            stats: Candidate::new(),
        });
        assert!(matches!(
            snapshot.restore(),
            Err(DiscoveryError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_refined_identity_must_name_base_features() {
        let mut snapshot = EngineSnapshot::capture(&make_engine());
        let refined: Vec<usize> = snapshot
            .features
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.feature.is_base())
            .map(|(id, _)| id)
            .collect();
        assert!(refined.len() >= 2, "fixture should refine twice");
        let (first, last) = (refined[0], refined[refined.len() - 1]);
        let record = &mut snapshot.features[last];
        record.feature.identity = Identity::from_ids(vec![0, first]);
        record.parents = PairKey::new(Identity::base(0), Identity::base(first));
        assert!(matches!(
            snapshot.restore(),
            Err(DiscoveryError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_empty_engine_round_trips() {
        let engine = DiscoveryEngine::new(DiscoveryConfig {
            widths: vec![1.0],
            ..DiscoveryConfig::default()
        })
        .unwrap();
        let restored = round_trip(&engine);
        assert_eq!(restored.feature_count(), 0);
        assert_eq!(restored.phi(&[0.0]).unwrap(), Vec::<f64>::new());
    }
}
