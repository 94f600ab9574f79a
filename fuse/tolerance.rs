// fuse/tolerance.rs

//! # Tolerance-Based Near-Equality
//!
//! [`approx`] reports, element by element, whether an array is close to a
//! reference under a combined absolute/relative rule. The relative test is
//! taken against the *largest* observed deviation rather than each element's
//! own reference magnitude, which keeps the predicate well-defined when the
//! reference contains zeros and gives one global scale for "relatively
//! small". [`squeeze`] applies it to prune negligible (variance, direction)
//! pairs from an uncertainty representation.

use ndarray::{Array, Array1, Array2, ArrayBase, ArrayView, Axis, Data, Dimension};
use ndarray_linalg::Scalar;
use serde::{Deserialize, Serialize};

/// Combined absolute and relative tolerance.
///
/// An element passes when its deviation is below `atol` outright, or below
/// `rtol` relative to the largest deviation in the whole comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            atol: 1e-5,
            rtol: 1e-8,
        }
    }
}

/// What an array is compared against.
pub enum Reference<'a, D: Dimension> {
    /// Compare against zero: the deviation is `|a|` itself.
    Zero,
    /// Elementwise comparison against an array of the same shape.
    Array(ArrayView<'a, f64, D>),
    /// A generator invoked with the subject's shape before comparing.
    Deferred(&'a dyn Fn(&[usize]) -> Array<f64, D>),
}

/// Elementwise near-equality of `a` and `reference`.
///
/// Let `M` be the largest deviation (0 for an empty input). When `M < atol`
/// every element is reported close: the whole comparison is in the noise, and
/// suppressing the relative test avoids dividing by a tiny or zero `M`.
/// Otherwise element `i` is close iff `delta_i < atol`, or `M != 0` and
/// `delta_i / M < rtol`. NaN deviations are never close.
pub fn approx<S, D>(a: &ArrayBase<S, D>, reference: Reference<'_, D>, tol: Tolerance) -> Array<bool, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let delta = match reference {
        Reference::Zero => a.mapv(f64::abs),
        Reference::Array(reference) => (a - &reference).mapv(f64::abs),
        Reference::Deferred(generator) => (a - &generator(a.shape())).mapv(f64::abs),
    };

    let max_delta = delta.iter().fold(0.0_f64, |acc, &d| acc.max(d));
    if max_delta < tol.atol {
        return Array::from_elem(delta.raw_dim(), true);
    }
    delta.mapv(|d| d < tol.atol || (max_delta != 0.0 && d / max_delta < tol.rtol))
}

/// Removes negligible (variance, direction) pairs.
///
/// A pair is negligible when its standard deviation `sqrt(|variance|)` is
/// within tolerance of zero *and* finite; the modulus tolerates complex
/// variances. Surviving rows keep their order. With nothing negligible the
/// inputs come back unchanged.
pub fn squeeze<A>(
    variances: Array1<A>,
    directions: Array2<A>,
    tol: Tolerance,
) -> (Array1<A>, Array2<A>)
where
    A: Scalar<Real = f64>,
{
    let std_dev = variances.mapv(|v| v.abs().sqrt());
    let negligible = approx(&std_dev, Reference::Zero, tol);
    let mut keep = Vec::with_capacity(std_dev.len());
    for (i, (&sd, &near_zero)) in std_dev.iter().zip(negligible.iter()).enumerate() {
        if !(near_zero && sd.is_finite()) {
            keep.push(i);
        }
    }
    if keep.len() == variances.len() {
        return (variances, directions);
    }
    log::debug!(
        "squeezed out {} of {} directions",
        variances.len() - keep.len(),
        variances.len()
    );
    (
        variances.select(Axis(0), &keep),
        directions.select(Axis(0), &keep),
    )
}
