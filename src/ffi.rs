//! Python FFI bindings via PyO3.
//!
//! Exposes [`DiscoveryEngine`] to Python as `KernelizedIFDD`, a drop-in feature
//! representation for online value-function learners.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from kifdd_core import KernelizedIFDD
//!
//! rep = KernelizedIFDD(0.05, 0.5, "gaussian", [1.0, 1.0], 0, 0.9, 1)
//! phi = rep.phi([0.0, 0.0])            # [] before any discovery
//! added = rep.discover([0.0, 0.0], 0, 1.0, phi)
//! print(rep.features_num, rep.candidates_num)
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::DiscoveryConfig;
use crate::engine::DiscoveryEngine;
use crate::error::DiscoveryError;

impl From<DiscoveryError> for PyErr {
    fn from(err: DiscoveryError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

/// Kernelized incremental feature dependency discovery.
///
/// Args:
///     activation_threshold:    kernel value a base must exceed to be active
///     discovery_threshold:     relevance a candidate must exceed to be promoted
///     kernel:                  "gaussian" or "triangle"
///     widths:                  kernel width per state dimension
///     sparsification:          <= 0 dense, 1 smoothed, 2 strict with threshold,
///                              10 maximal cover, any other > 2 strict without threshold
///     max_neighbor_similarity: density-control similarity cutoff
///     max_active_neighbors:    density-control count cutoff
///     normalization:           divide phi by its L1 norm (default True)
#[pyclass(name = "KernelizedIFDD")]
pub struct PyKernelizedIfdd {
    inner: DiscoveryEngine,
}

#[pymethods]
impl PyKernelizedIfdd {
    /// Create an engine with no features.
    #[new]
    #[pyo3(signature = (
        activation_threshold,
        discovery_threshold,
        kernel,
        widths,
        sparsification,
        max_neighbor_similarity,
        max_active_neighbors,
        normalization=true
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        activation_threshold: f64,
        discovery_threshold: f64,
        kernel: &str,
        widths: Vec<f64>,
        sparsification: i32,
        max_neighbor_similarity: f64,
        max_active_neighbors: usize,
        normalization: bool,
    ) -> PyResult<Self> {
        let mut config = DiscoveryConfig::from_selector(
            activation_threshold,
            discovery_threshold,
            kernel,
            widths,
            sparsification,
            max_neighbor_similarity,
            max_active_neighbors,
        )?;
        config.normalization = normalization;
        Ok(Self {
            inner: DiscoveryEngine::new(config)?,
        })
    }

    /// Activation vector of `state`, one entry per feature.
    pub fn phi(&self, state: Vec<f64>) -> PyResult<Vec<f64>> {
        Ok(self.inner.phi(&state)?)
    }

    /// Kernel values of every feature, without sparsification or normalisation.
    pub fn raw_phi(&self, state: Vec<f64>) -> PyResult<Vec<f64>> {
        Ok(self.inner.raw_phi(&state)?)
    }

    /// Observe one transition; returns the number of features added.
    pub fn discover(
        &mut self,
        state: Vec<f64>,
        action: usize,
        td_error: f64,
        previous_phi: Vec<f64>,
    ) -> PyResult<usize> {
        Ok(self.inner.discover(&state, action, td_error, &previous_phi)?)
    }

    /// Current number of features.
    #[getter]
    pub fn features_num(&self) -> usize {
        self.inner.feature_count()
    }

    /// Number of pending candidates.
    #[getter]
    pub fn candidates_num(&self) -> usize {
        self.inner.candidate_count()
    }

    /// Dimensions each feature depends on, in id order.
    pub fn feature_dims(&self) -> Vec<Vec<usize>> {
        self.inner.features().map(|f| f.dims.clone()).collect()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        let c = self.inner.config();
        format!(
            "KernelizedIFDD(kernel={:?}, dims={}, features={}, candidates={})",
            c.kernel.as_str(),
            c.dimensions(),
            self.inner.feature_count(),
            self.inner.candidate_count(),
        )
    }
}

/// Kernelized iFDD Python bindings.
#[pymodule]
pub fn kifdd_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyKernelizedIfdd>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
