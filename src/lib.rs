//! # kifdd-core
//!
//! Kernelized incremental feature dependency discovery: a self-growing, sparse
//! kernel feature representation for online value-function learning.
//!
//! ---
//!
//! ## Features grow where the error is
//!
//! A learner starts with no features at all. Each observed transition does two
//! things to the representation:
//!
//! **Density-controlled base creation**: every state dimension that has too few
//! active base features (or none close enough) gets a new one-dimensional kernel
//! centred on the observed state. Coverage follows the visited part of the state
//! space, not a fixed grid.
//!
//! **Relevance-driven refinement**: every pair of active bases in different
//! dimensions is a *candidate* conjunction. Its relevance
//! `|Σ φᵢφⱼe| / sqrt(Σ (φᵢφⱼ)²)` accumulates online from the TD error `e`. Once it
//! crosses the discovery threshold the pair is promoted to a multi-dimensional
//! feature, which can itself combine further.
//!
//! Features are never removed. Ids are dense and stable, so a learner can grow
//! its weight vector in step with [`DiscoveryEngine::feature_count`].
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! state ─► Kernel ─► active bases ─► Sparsification ─► φ ─► learner
//!                          │                                   │
//!                          ▼                                   ▼ tdError
//!                   density control ─► FeatureStore ◄─ CandidateTracker
//!                                         (add_base)     (add_refined)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`kernel`] | [`Kernel`] | Gaussian and L∞-triangle similarity over a dimension subset |
//! | [`identity`] | [`Identity`], [`PairKey`] | Base-id sets and canonical unordered candidate keys |
//! | [`ordering`] | [`ordering::FeatureIndex`] | General-first and specific-first feature orders |
//! | [`candidate`] | [`Candidate`], [`CandidateTracker`] | Online relevance statistic per proposed conjunction |
//! | [`feature`] | [`Feature`], [`FeatureStore`] | Append-only feature set with identity lookups |
//! | [`activation`] | [`Sparsification`] | `phi` in dense, smoothed, strict and maximal-cover modes |
//! | [`engine`] | [`DiscoveryEngine`] | `phi` and `discover` over the whole state |
//! | [`config`] | [`DiscoveryConfig`] | Thresholds, kernel, widths and density limits |
//! | [`snapshot`] | [`snapshot::EngineSnapshot`] | Serialisable engine state (requires `serde` feature) |
//!
//! ## Quick start
//!
//! ```rust
//! use kifdd_core::{DiscoveryConfig, DiscoveryEngine};
//!
//! let config = DiscoveryConfig {
//!     widths: vec![1.0, 1.0],
//!     discovery_threshold: 0.5,
//!     max_active_neighbors: 1,
//!     ..DiscoveryConfig::default()
//! };
//! let mut engine = DiscoveryEngine::new(config)?;
//!
//! let state = [0.0, 0.0];
//! let phi = engine.phi(&state)?;
//! assert!(phi.is_empty());
//! assert_eq!(engine.discover(&state, 0, 0.3, &phi)?, 2);
//! assert_eq!(engine.phi(&state)?.len(), engine.feature_count());
//! # Ok::<(), kifdd_core::DiscoveryError>(())
//! ```
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` + `alloc` by default. Enable the `std` feature for
//! `std::error::Error` on [`DiscoveryError`] and std-backed tracing. Enable
//! `serde` for [`snapshot`], and `python-ffi` for the PyO3 bindings.
//!
//! ## Logging
//!
//! Feature creation is reported through [`tracing`] at `debug` level and every
//! candidate update at `trace` level. Nothing is emitted unless the application
//! installs a subscriber.

#![cfg_attr(not(any(feature = "std", feature = "python-ffi", test)), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod activation;
pub mod candidate;
pub mod config;
pub mod engine;
pub mod error;
pub mod feature;
pub mod identity;
pub mod kernel;
pub mod ordering;
#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use activation::Sparsification;
pub use candidate::{Candidate, CandidateTracker};
pub use config::DiscoveryConfig;
pub use engine::DiscoveryEngine;
pub use error::{DiscoveryError, Result};
pub use feature::{Feature, FeatureStore};
pub use identity::{FeatureId, Identity, PairKey};
pub use kernel::Kernel;
