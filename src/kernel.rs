//! Kernel similarity functions between two points restricted to a dimension subset.
//!
//! Both kernels are pure and symmetric. `widths[d] > 0` is a precondition; it is
//! checked once by [`crate::config::DiscoveryConfig::validate`], not on every call.
//!
//! | Kernel | Range | Support |
//! |--------|-------|---------|
//! | [`Kernel::Gaussian`] | (0, 1] | global, thresholded only approximately |
//! | [`Kernel::Triangle`] | [0, 1] | compact: exactly 0 outside a box neighbourhood |

use core::fmt;
use core::str::FromStr;

use crate::error::DiscoveryError;

/// The closed set of kernels an engine can be configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Kernel {
    /// `exp(-Σ ((p[d] - q[d]) / w[d])²)`
    #[default]
    Gaussian,
    /// L∞-normalised triangle: `min_d (1 - |p[d] - q[d]| / w[d])`, or 0 once any term is ≤ 0.
    Triangle,
}

impl Kernel {
    /// Similarity between `p` and `q` over `dims`, scaled per dimension by `widths`.
    ///
    /// Equal points on every dimension in `dims` give exactly 1.0. An empty
    /// `dims` also gives 1.0 (no constraint).
    #[inline]
    pub fn similarity(self, p: &[f64], q: &[f64], dims: &[usize], widths: &[f64]) -> f64 {
        match self {
            Self::Gaussian => gaussian(p, q, dims, widths),
            Self::Triangle => linf_triangle(p, q, dims, widths),
        }
    }

    /// Canonical selector string for this kernel.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kernel {
    type Err = DiscoveryError;

    /// Accepts the short names and the `*_kernel` names used by existing experiment scripts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" | "gaussian_kernel" => Ok(Self::Gaussian),
            "triangle" | "linf_triangle" | "linf_triangle_kernel" => Ok(Self::Triangle),
            other => Err(DiscoveryError::UnknownKernel(other.into())),
        }
    }
}

/// Gaussian similarity, range (0, 1].
pub fn gaussian(p: &[f64], q: &[f64], dims: &[usize], widths: &[f64]) -> f64 {
    let exponent: f64 = dims
        .iter()
        .map(|&d| {
            let z = (p[d] - q[d]) / widths[d];
            z * z
        })
        .sum();
    libm::exp(-exponent)
}

/// L∞ triangle similarity, range [0, 1].
///
/// Short-circuits to exactly 0.0 as soon as one dimension is a full width or
/// more away, so points outside the box never register as active.
pub fn linf_triangle(p: &[f64], q: &[f64], dims: &[usize], widths: &[f64]) -> f64 {
    let mut res = 1.0_f64;
    for &d in dims {
        let r = 1.0 - libm::fabs(p[d] - q[d]) / widths[d];
        if r <= 0.0 {
            return 0.0;
        }
        if r < res {
            res = r;
        }
    }
    res
}
