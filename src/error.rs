//! Error types for feature discovery.
//!
//! Every error here is a configuration or caller-contract error. The engine
//! performs no I/O, so nothing is transient and nothing is retried.

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

/// Errors surfaced by engine construction and the per-step operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// The kernel selector names no known kernel.
    #[error("unknown kernel selector: {0:?} (expected \"gaussian\" or \"triangle\")")]
    UnknownKernel(String),

    /// No kernel widths were configured, so the state space has no dimensions.
    #[error("at least one kernel width is required")]
    MissingWidths,

    /// A kernel width is zero, negative or not finite.
    #[error("kernel width for dimension {dim} must be positive and finite, got {width}")]
    InvalidWidth {
        /// Offending dimension.
        dim: usize,
        /// Configured width.
        width: f64,
    },

    /// A threshold is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    InvalidThreshold {
        /// Configuration field name.
        name: &'static str,
        /// Configured value.
        value: f64,
    },

    /// A state vector is shorter than the configured dimensionality.
    #[error("state has {got} dimensions, engine is configured for {expected}")]
    StateTooShort {
        /// Configured dimensionality (number of kernel widths).
        expected: usize,
        /// Length of the supplied state.
        got: usize,
    },

    /// An identity is empty or its ids are not strictly ascending.
    #[error("identity {0:?} must be a non-empty, strictly ascending id list")]
    InvalidIdentity(Vec<usize>),

    /// A snapshot cannot be restored into a consistent engine.
    #[error("inconsistent snapshot: {0}")]
    SnapshotMismatch(String),
}

/// Result alias for discovery operations.
pub type Result<T> = core::result::Result<T, DiscoveryError>;
