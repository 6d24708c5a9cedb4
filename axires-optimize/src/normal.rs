use axires_traits::{DimensionMismatch, Equation, Real};
use itertools::iproduct;
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView};
use rayon::prelude::*;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroObservation {
    pub index: usize,
}

impl fmt::Display for ZeroObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observation {} is zero and cannot be used as a relative weight", self.index)
    }
}

impl Error for ZeroObservation {}

/// Squared relative weights `w_k² = 1 / observed_k²`.
pub fn squared_weights<T: Real>(observed: DVectorView<T>) -> Result<DVector<T>, ZeroObservation> {
    if let Some(index) = observed.iter().position(|v| *v == T::zero()) {
        return Err(ZeroObservation { index });
    }
    Ok(observed.map(|v| T::one() / (v * v)))
}

/// The weighted misfit `Σ_k w_k² (predicted_k - observed_k)²`.
pub fn misfit_functional<T: Real>(
    weights_squared: DVectorView<T>,
    predicted: DVectorView<T>,
    observed: DVectorView<T>,
) -> T {
    weights_squared
        .iter()
        .zip(predicted.iter().zip(observed.iter()))
        .fold(T::zero(), |sum, (&w2, (&f, &obs))| sum + w2 * (f - obs) * (f - obs))
}

/// Fills the Gauss-Newton normal equations `H δ = g` of the weighted misfit, where
///
/// ```text
/// H_qs = Σ_k w_k² J_kq J_ks,
/// g_q  = -Σ_k w_k² (predicted_k - observed_k) J_kq.
/// ```
///
/// The Jacobian has one row per measurement and one column per parameter. The solution vector of
/// `normal` is reset to zero.
pub fn assemble_normal_equations<T: Real>(
    jacobian: DMatrixView<T>,
    weights_squared: DVectorView<T>,
    predicted: DVectorView<T>,
    observed: DVectorView<T>,
    normal: &mut Equation<DMatrix<T>, T>,
) -> Result<(), DimensionMismatch> {
    let (m, n) = jacobian.shape();
    for len in [weights_squared.len(), predicted.len(), observed.len()] {
        if len != m {
            return Err(DimensionMismatch { expected: m, actual: len });
        }
    }
    if normal.dim() != n {
        return Err(DimensionMismatch {
            expected: n,
            actual: normal.dim(),
        });
    }

    // Each Hessian entry is an independent reduction over the measurements
    let pairs: Vec<_> = iproduct!(0..n, 0..n).filter(|(q, s)| q <= s).collect();
    let entries: Vec<T> = pairs
        .par_iter()
        .map(|&(q, s)| {
            (0..m).fold(T::zero(), |sum, k| {
                sum + weights_squared[k] * jacobian[(k, q)] * jacobian[(k, s)]
            })
        })
        .collect();

    let (matrix, mut solution, mut rhs) = normal.parts_mut();
    for (&(q, s), &h_qs) in pairs.iter().zip(&entries) {
        matrix[(q, s)] = h_qs;
        matrix[(s, q)] = h_qs;
    }
    for q in 0..n {
        rhs[q] = -(0..m).fold(T::zero(), |sum, k| {
            sum + weights_squared[k] * (predicted[k] - observed[k]) * jacobian[(k, q)]
        });
    }
    solution.fill(T::zero());
    Ok(())
}
