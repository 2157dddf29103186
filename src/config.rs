//! Engine configuration.
//!
//! All values are fixed at construction. [`DiscoveryConfig::validate`] runs in
//! [`crate::engine::DiscoveryEngine::new`], so an engine never exists with an
//! unknown kernel, a missing or non-positive width, or a non-finite threshold.

use alloc::vec::Vec;

use crate::activation::Sparsification;
use crate::error::{DiscoveryError, Result};
use crate::kernel::Kernel;

/// Hyperparameters of a discovery engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveryConfig {
    /// Kernel value a base feature must exceed to count as active.
    /// Default: 0.01.
    pub activation_threshold: f64,

    /// Relevance a candidate must exceed to be promoted to a feature.
    /// Default: 0.1.
    pub discovery_threshold: f64,

    /// Similarity kernel. Default: Gaussian.
    pub kernel: Kernel,

    /// Kernel width per state dimension; its length is the state dimensionality.
    /// Every width must be positive. Default: empty (must be set).
    pub widths: Vec<f64>,

    /// Sparsification mode of the activation vector. Default: dense.
    pub sparsification: Sparsification,

    /// A new base is not added in a dimension where an active base is already
    /// more similar than this to the state. Default: 0.5.
    pub max_neighbor_similarity: f64,

    /// A new base is not added in a dimension that already has this many
    /// active bases. Default: 10.
    pub max_active_neighbors: usize,

    /// Divide the activation vector by its L1 norm. Default: true.
    pub normalization: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.01,
            discovery_threshold: 0.1,
            kernel: Kernel::Gaussian,
            widths: Vec::new(),
            sparsification: Sparsification::Dense,
            max_neighbor_similarity: 0.5,
            max_active_neighbors: 10,
            normalization: true,
        }
    }
}

impl DiscoveryConfig {
    /// Build a configuration from the raw values a learner passes in:
    /// kernel by selector name and sparsification by integer level.
    ///
    /// Fails with [`DiscoveryError::UnknownKernel`] for an unrecognised selector,
    /// or any error of [`DiscoveryConfig::validate`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_selector(
        activation_threshold: f64,
        discovery_threshold: f64,
        kernel: &str,
        widths: Vec<f64>,
        sparsification: i32,
        max_neighbor_similarity: f64,
        max_active_neighbors: usize,
    ) -> Result<Self> {
        let config = Self {
            activation_threshold,
            discovery_threshold,
            kernel: kernel.parse()?,
            widths,
            sparsification: Sparsification::from_level(sparsification),
            max_neighbor_similarity,
            max_active_neighbors,
            normalization: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// Number of state dimensions.
    pub fn dimensions(&self) -> usize {
        self.widths.len()
    }

    /// Check widths and thresholds.
    pub fn validate(&self) -> Result<()> {
        if self.widths.is_empty() {
            return Err(DiscoveryError::MissingWidths);
        }
        for (dim, &width) in self.widths.iter().enumerate() {
            if !(width.is_finite() && width > 0.0) {
                return Err(DiscoveryError::InvalidWidth { dim, width });
            }
        }
        let thresholds = [
            ("activation_threshold", self.activation_threshold),
            ("discovery_threshold", self.discovery_threshold),
            ("max_neighbor_similarity", self.max_neighbor_similarity),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(DiscoveryError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}
