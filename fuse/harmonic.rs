// fuse/harmonic.rs

//! # Harmonic Combination
//!
//! `combine` is the parallel-resistor formula `(sum of inverses)^-1` lifted
//! to anything invertible. Applied to covariance matrices of independent
//! estimates of the same quantity it is exactly the covariance-fusion step
//! of a one-shot Kalman update.

use ndarray::Array2;
use ndarray_linalg::{Inverse, error::LinalgError};
use num_complex::Complex64;
use std::ops::Add;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarmonicError {
    #[error("harmonic combination needs at least one operand")]
    Empty,

    #[error("operand could not be inverted: {0}")]
    Singular(#[from] LinalgError),
}

/// Quantities that combine the way parallel resistors do: anything with a
/// multiplicative inverse and addition.
pub trait Parallel: Sized + Add<Output = Self> {
    /// Multiplicative inverse. Fallible for matrices; scalar inversion
    /// follows IEEE 754 through zero into infinity.
    fn invert(&self) -> Result<Self, HarmonicError>;
}

impl Parallel for f64 {
    fn invert(&self) -> Result<Self, HarmonicError> {
        Ok(self.recip())
    }
}

impl Parallel for Complex64 {
    fn invert(&self) -> Result<Self, HarmonicError> {
        Ok(self.inv())
    }
}

impl Parallel for Array2<f64> {
    fn invert(&self) -> Result<Self, HarmonicError> {
        Ok(self.inv()?)
    }
}

impl Parallel for Array2<Complex64> {
    fn invert(&self) -> Result<Self, HarmonicError> {
        Ok(self.inv()?)
    }
}

/// Combines operands harmonically: `(sum of item^-1)^-1`.
///
/// A single operand is returned untouched; `x^-1^-1` only equals `x` up to
/// rounding.
pub fn combine<T, I>(items: I) -> Result<T, HarmonicError>
where
    T: Parallel,
    I: IntoIterator<Item = T>,
{
    let mut items = items.into_iter();
    let first = items.next().ok_or(HarmonicError::Empty)?;
    let Some(second) = items.next() else {
        return Ok(first);
    };
    let mut total = first.invert()? + second.invert()?;
    for item in items {
        total = total + item.invert()?;
    }
    total.invert()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn single_operand_passes_through() {
        assert_eq!(combine(vec![3.7]).unwrap(), 3.7);
    }

    #[test]
    fn single_singular_matrix_passes_through_uninverted() {
        let zero = Array2::<f64>::zeros((2, 2));
        assert_eq!(combine(vec![zero.clone()]).unwrap(), zero);
    }

    #[test]
    fn equal_operands_split_in_half() {
        assert_abs_diff_eq!(combine(vec![4.0, 4.0]).unwrap(), 2.0);
    }

    #[test]
    fn resistors_in_parallel() {
        // 1 / (1/2 + 1/3) = 6/5
        assert_abs_diff_eq!(combine(vec![2.0, 3.0]).unwrap(), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn no_operands_is_an_error() {
        assert!(matches!(
            combine(Vec::<f64>::new()),
            Err(HarmonicError::Empty)
        ));
    }

    #[test]
    fn singular_operand_is_an_error() {
        let a = Array2::<f64>::eye(2);
        let singular = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            combine(vec![a, singular]),
            Err(HarmonicError::Singular(_))
        ));
    }

    #[test]
    fn matrix_fusion_matches_the_kalman_identity() {
        let a = array![[4.0, 1.0], [1.0, 3.0]];
        let b = array![[2.0, 0.5], [0.5, 5.0]];
        let fused = combine(vec![a.clone(), b.clone()]).unwrap();
        // (A^-1 + B^-1)^-1 = A (A + B)^-1 B for invertible A, B
        let expected = a.dot(&(&a + &b).inv().unwrap()).dot(&b);
        assert_abs_diff_eq!(fused, expected, epsilon = 1e-10);
    }

    #[test]
    fn complex_operands_combine() {
        let fused = combine(vec![Complex64::new(0.0, 2.0), Complex64::new(0.0, 2.0)]).unwrap();
        assert!((fused - Complex64::new(0.0, 1.0)).norm() < 1e-12);
    }
}
