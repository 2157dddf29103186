//! Activation evaluation (`phi`): the feature vector of a state.
//!
//! # Modes
//!
//! | Level | [`Sparsification`] | Behaviour |
//! |-------|--------------------|-----------|
//! | ≤ 0 | `Dense` | every feature fires with its kernel value |
//! | 1 | `Smoothed` | covering features fire scaled by the remaining weight of their base ids |
//! | 2 | `Strict { require_threshold: true }` | finest covering feature above threshold wins and consumes its base ids |
//! | 3–9, > 10 | `Strict { require_threshold: false }` | as level 2, no threshold on the covering feature |
//! | 10 | `MaximalCover` | every covered feature that is not contained in a larger chosen one fires |
//!
//! In every sparse mode a feature can only fire if all of its base ids are
//! *active*, i.e. the base feature's kernel value exceeds the activation
//! threshold. Features are visited specific-first, so finer conjunctions are
//! considered before the coarser ones they refine.
//!
//! With normalisation on and a non-zero L1 sum the output is divided by that
//! sum; otherwise the raw vector (possibly all zeros) is returned.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::config::DiscoveryConfig;
use crate::feature::{Feature, FeatureStore};
use crate::identity::{FeatureId, Identity};

/// How many, and which, features fire together for one state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sparsification {
    /// No sparsification: every feature's kernel value.
    #[default]
    Dense,
    /// Continuous hand-off between overlapping covering features.
    Smoothed,
    /// Mutually exclusive covering features; the finest one wins.
    Strict {
        /// Only let a covering feature fire if its own value exceeds the
        /// activation threshold.
        require_threshold: bool,
    },
    /// Maximal covered conjunctions only.
    MaximalCover,
}

impl Sparsification {
    /// Map an integer sparsification level onto a mode.
    pub fn from_level(level: i32) -> Self {
        match level {
            i32::MIN..=0 => Self::Dense,
            1 => Self::Smoothed,
            2 => Self::Strict {
                require_threshold: true,
            },
            10 => Self::MaximalCover,
            _ => Self::Strict {
                require_threshold: false,
            },
        }
    }

    /// Canonical integer level for this mode.
    pub fn level(self) -> i32 {
        match self {
            Self::Dense => 0,
            Self::Smoothed => 1,
            Self::Strict {
                require_threshold: true,
            } => 2,
            Self::Strict {
                require_threshold: false,
            } => 3,
            Self::MaximalCover => 10,
        }
    }

    /// `true` for every mode except [`Sparsification::Dense`].
    pub fn is_sparse(self) -> bool {
        !matches!(self, Self::Dense)
    }
}

/// Kernel value of `feature` at `state` over the feature's own dimensions.
#[inline]
pub fn feature_value(config: &DiscoveryConfig, feature: &Feature, state: &[f64]) -> f64 {
    config
        .kernel
        .similarity(&feature.center, state, &feature.dims, &config.widths)
}

/// Active base features with an initial weight of 1.0 each, keyed by id.
pub fn active_bases(
    store: &FeatureStore,
    config: &DiscoveryConfig,
    state: &[f64],
) -> BTreeMap<FeatureId, f64> {
    store
        .general_first()
        .single_dim()
        .filter(|&id| is_active(store, config, id, state))
        .map(|id| (id, 1.0))
        .collect()
}

/// Active base features grouped by the single dimension each depends on.
///
/// Dimensions without an active base are absent from the map.
pub fn active_bases_per_dim(
    store: &FeatureStore,
    config: &DiscoveryConfig,
    state: &[f64],
) -> BTreeMap<usize, Vec<FeatureId>> {
    let mut per_dim: BTreeMap<usize, Vec<FeatureId>> = BTreeMap::new();
    for id in store.general_first().single_dim() {
        if is_active(store, config, id, state) {
            per_dim.entry(store_feature(store, id).dims[0]).or_default().push(id);
        }
    }
    per_dim
}

/// Un-sparsified, un-normalised kernel values of every feature, in id order.
pub fn raw(store: &FeatureStore, config: &DiscoveryConfig, state: &[f64]) -> Vec<f64> {
    store
        .iter()
        .map(|f| feature_value(config, f, state))
        .collect()
}

/// Evaluate the activation vector of `state`: one value per feature, in id order.
pub fn evaluate(store: &FeatureStore, config: &DiscoveryConfig, state: &[f64]) -> Vec<f64> {
    let mut output = vec![0.0; store.len()];
    let l1 = match config.sparsification {
        Sparsification::Dense => dense(store, config, state, &mut output),
        Sparsification::Smoothed => smoothed(store, config, state, &mut output),
        Sparsification::Strict { require_threshold } => {
            strict(store, config, state, require_threshold, &mut output)
        }
        Sparsification::MaximalCover => maximal_cover(store, config, state, &mut output),
    };
    if config.normalization && l1 != 0.0 {
        for v in output.iter_mut().filter(|v| **v != 0.0) {
            *v /= l1;
        }
    }
    output
}

// ─── Modes ───────────────────────────────────────────────────────────────────

fn dense(store: &FeatureStore, config: &DiscoveryConfig, state: &[f64], out: &mut [f64]) -> f64 {
    let mut l1 = 0.0;
    for (id, f) in store.iter().enumerate() {
        out[id] = feature_value(config, f, state);
        l1 += libm::fabs(out[id]);
    }
    l1
}

fn strict(
    store: &FeatureStore,
    config: &DiscoveryConfig,
    state: &[f64],
    require_threshold: bool,
    out: &mut [f64],
) -> f64 {
    let mut active = active_bases(store, config, state);
    let mut l1 = 0.0;
    for id in store.specific_first().ids() {
        if active.is_empty() {
            break;
        }
        let f = store_feature(store, id);
        if !f.identity.is_covered_by(&active) {
            continue;
        }
        let value = feature_value(config, f, state);
        if require_threshold && value <= config.activation_threshold {
            continue;
        }
        out[id] = value;
        l1 += libm::fabs(value);
        for base in f.identity.ids() {
            active.remove(base);
        }
    }
    l1
}

fn smoothed(store: &FeatureStore, config: &DiscoveryConfig, state: &[f64], out: &mut [f64]) -> f64 {
    let mut active = active_bases(store, config, state);
    let mut l1 = 0.0;
    for id in store.specific_first().ids() {
        if active.is_empty() {
            break;
        }
        let f = store_feature(store, id);
        if !f.identity.is_covered_by(&active) {
            continue;
        }
        let value = feature_value(config, f, state);
        if value <= config.activation_threshold {
            continue;
        }
        let available = f
            .identity
            .ids()
            .iter()
            .filter_map(|b| active.get(b))
            .fold(f64::INFINITY, |m, &w| if w < m { w } else { m });
        let output = available * value;
        out[id] = output;
        l1 += libm::fabs(output);
        for base in f.identity.ids() {
            if let Some(w) = active.get_mut(base) {
                if output < *w {
                    *w = output;
                }
                if *w <= 0.0 {
                    active.remove(base);
                }
            }
        }
    }
    l1
}

fn maximal_cover(
    store: &FeatureStore,
    config: &DiscoveryConfig,
    state: &[f64],
    out: &mut [f64],
) -> f64 {
    let active = active_bases(store, config, state);
    let mut chosen: Vec<&Identity> = Vec::new();
    let mut l1 = 0.0;
    if active.is_empty() {
        return l1;
    }
    for id in store.specific_first().ids() {
        let f = store_feature(store, id);
        if !f.identity.is_covered_by(&active) {
            continue;
        }
        if chosen.iter().any(|c| f.identity.is_strict_subset_of(c)) {
            continue;
        }
        let value = feature_value(config, f, state);
        out[id] = value;
        l1 += libm::fabs(value);
        chosen.push(&f.identity);
    }
    l1
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn is_active(store: &FeatureStore, config: &DiscoveryConfig, id: FeatureId, state: &[f64]) -> bool {
    feature_value(config, store_feature(store, id), state) > config.activation_threshold
}

/// Ids handed out by the store's own indices are always valid.
fn store_feature(store: &FeatureStore, id: FeatureId) -> &Feature {
    match store.get(id) {
        Some(f) => f,
        None => unreachable!("index refers to unknown feature {}", id),
    }
}
