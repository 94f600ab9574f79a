// fuse/vector.rs

//! Small helpers over sets of direction vectors: magnitudes, normalization,
//! complex views, row ordering.

use itertools::Itertools;
use ndarray::{
    Array, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, LinalgScalar, RemoveAxis, array,
};
use ndarray_linalg::Scalar;
use num_complex::Complex64;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("last axis has length {len}, expected (re, im) pairs of length 2")]
pub struct ComplexPairError {
    pub len: usize,
}

/// Squared magnitude of each vector along the last axis: the sum of
/// elementwise conjugate products. Conjugate products are real, so the
/// result is real even for complex input.
pub fn norm_sqr<A, S, D>(vectors: &ArrayBase<S, D>) -> Array<A::Real, D::Smaller>
where
    A: Scalar,
    S: Data<Elem = A>,
    D: Dimension + RemoveAxis,
{
    let last = Axis(vectors.ndim() - 1);
    vectors.map_axis(last, |lane| lane.iter().map(|&x| x.square()).sum())
}

/// Each last-axis vector divided by its Euclidean magnitude.
pub fn unit<A, S, D>(vectors: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Scalar,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut unit = vectors.to_owned();
    let last = Axis(unit.ndim() - 1);
    for mut lane in unit.lanes_mut(last) {
        let magnitude = lane.iter().map(|&x| x.square()).sum::<A::Real>().sqrt();
        lane.mapv_inplace(|x| x.div_real(magnitude));
    }
    unit
}

/// Elementwise `x / |x|`: unit-modulus values pointing the same way as the
/// input. Generalizes the sign function to complex arrays.
pub fn sign<A, S, D>(values: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Scalar,
    S: Data<Elem = A>,
    D: Dimension,
{
    values.mapv(|x| x.div_real(x.abs()))
}

/// Reads a real array whose last axis holds (re, im) pairs as one complex
/// axis. This copies; the result does not alias the input storage. A last
/// axis of any length other than 2 is an error.
pub fn as_complex<S, D>(
    pairs: &ArrayBase<S, D>,
) -> Result<Array<Complex64, D::Smaller>, ComplexPairError>
where
    S: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    let last = Axis(pairs.ndim() - 1);
    let len = pairs.len_of(last);
    if len != 2 {
        return Err(ComplexPairError { len });
    }
    Ok(pairs.map_axis(last, |pair| Complex64::new(pair[0], pair[1])))
}

/// Rows reordered by ascending value (real part) of one column. Ties keep
/// their order; empty input comes back unchanged.
pub fn sort_rows<A>(data: &Array2<A>, column: usize) -> Array2<A>
where
    A: Scalar,
{
    if data.is_empty() {
        return data.clone();
    }
    let order: Vec<usize> = (0..data.nrows())
        .sorted_by(|&i, &j| {
            data[(i, column)]
                .re()
                .partial_cmp(&data[(j, column)].re())
                .unwrap_or(Ordering::Equal)
        })
        .collect();
    data.select(Axis(0), &order)
}

/// Counterclockwise rotation of the plane by `angle` radians.
pub fn rotation2d(angle: f64) -> Array2<f64> {
    let (sin, cos) = angle.sin_cos();
    array![[cos, -sin], [sin, cos]]
}

/// Chained matrix product of two or more operands, left to right.
pub fn dots<A: LinalgScalar>(operands: &[ArrayView2<'_, A>]) -> Array2<A> {
    assert!(
        operands.len() >= 2,
        "chained product needs at least two operands"
    );
    operands[1..]
        .iter()
        .fold(operands[0].to_owned(), |product, rhs| product.dot(rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn norm_sqr_sums_squares_along_the_last_axis() {
        let vectors = array![[3.0, 4.0], [0.0, 2.0]];
        assert_eq!(norm_sqr(&vectors), array![25.0, 4.0]);
        assert_eq!(norm_sqr(&array![3.0, 4.0]).into_scalar(), 25.0);
    }

    #[test]
    fn norm_sqr_of_complex_vectors_is_real() {
        let vectors = array![[Complex64::new(3.0, 4.0)], [Complex64::new(0.0, 1.0)]];
        assert_eq!(norm_sqr(&vectors), array![25.0, 1.0]);
    }

    #[test]
    fn unit_normalizes_each_row() {
        let vectors = array![[3.0, 4.0], [0.0, -2.0]];
        assert_abs_diff_eq!(
            unit(&vectors),
            array![[0.6, 0.8], [0.0, -1.0]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn sign_has_unit_modulus_and_same_direction() {
        assert_eq!(sign(&array![-3.0, 0.5]), array![-1.0, 1.0]);
        let signed = sign(&array![Complex64::new(3.0, 4.0)]);
        assert!((signed[0] - Complex64::new(0.6, 0.8)).norm() < 1e-12);
    }

    #[test]
    fn as_complex_pairs_up_the_last_axis() {
        let pairs = array![[1.0, 2.0], [3.0, -4.0]];
        let complex = as_complex(&pairs).unwrap();
        assert_eq!(
            complex,
            array![Complex64::new(1.0, 2.0), Complex64::new(3.0, -4.0)]
        );
    }

    #[test]
    fn as_complex_rejects_unpaired_axes() {
        let odd = array![[1.0, 2.0, 3.0]];
        let err = as_complex(&odd).unwrap_err();
        assert_eq!(err.len, 3);
    }

    #[test]
    fn sort_rows_orders_by_one_column() {
        let data = array![[3.0, 30.0], [1.0, 10.0], [2.0, 20.0]];
        assert_eq!(
            sort_rows(&data, 0),
            array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]]
        );
        assert_eq!(sort_rows(&data, 1), sort_rows(&data, 0));
    }

    #[test]
    fn sort_rows_of_empty_input_is_a_no_op() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert_eq!(sort_rows(&empty, 0), empty);
    }

    #[test]
    fn rotation2d_quarter_turn() {
        assert_abs_diff_eq!(
            rotation2d(std::f64::consts::FRAC_PI_2),
            array![[0.0, -1.0], [1.0, 0.0]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn rotation2d_rotates_counterclockwise() {
        let rotated = rotation2d(std::f64::consts::FRAC_PI_2).dot(&array![1.0, 0.0]);
        assert_abs_diff_eq!(rotated, array![0.0, 1.0], epsilon = 1e-12);
    }

    #[test]
    fn dots_chains_left_to_right() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[0.0, 1.0], [1.0, 0.0]];
        let c = array![[2.0, 0.0], [0.0, 2.0]];
        let chained = dots(&[a.view(), b.view(), c.view()]);
        assert_eq!(chained, a.dot(&b).dot(&c));
    }
}
