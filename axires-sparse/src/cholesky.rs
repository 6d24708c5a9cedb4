use crate::cg::{LinearOperator, OperatorError};
use crate::{SparseError, SymmetricSparseMatrix};
use axires_traits::Real;
use nalgebra::{DVectorView, DVectorViewMut};
use std::cmp::Ordering;
use std::sync::Arc;

/// Computes the zero fill-in incomplete Cholesky factorization `A ≈ L Lᵀ` in place.
///
/// On return, the diagonal of `matrix` holds `L_ii` and the stored lower triangle holds `L_ij`.
/// The factor keeps the sparsity pattern of `A`; contributions that would fall outside of it are
/// dropped.
pub fn incomplete_cholesky_in_place<T: Real>(matrix: &mut SymmetricSparseMatrix<T>) -> Result<(), SparseError> {
    let pattern = Arc::clone(matrix.pattern());
    let offsets = pattern.row_offsets();
    let columns = pattern.column_indices();
    let (diagonal, values) = matrix.diagonal_and_values_mut();

    for i in 0..pattern.dim() {
        let row_begin = offsets[i];
        let mut diagonal_sum = T::zero();

        for idx_ij in row_begin..offsets[i + 1] {
            let j = columns[idx_ij];

            // Sum of L_ik L_jk over the columns k < j stored in both row i and row j
            let mut sum = T::zero();
            let (mut a, mut b) = (row_begin, offsets[j]);
            let b_end = offsets[j + 1];
            while a < idx_ij && b < b_end {
                match columns[a].cmp(&columns[b]) {
                    Ordering::Less => a += 1,
                    Ordering::Greater => b += 1,
                    Ordering::Equal => {
                        sum += values[a] * values[b];
                        a += 1;
                        b += 1;
                    }
                }
            }

            let l_ij = (values[idx_ij] - sum) / diagonal[j];
            values[idx_ij] = l_ij;
            diagonal_sum += l_ij * l_ij;
        }

        let pivot = diagonal[i] - diagonal_sum;
        if !(pivot > T::zero()) {
            return Err(SparseError::NonPositivePivot { row: i });
        }
        diagonal[i] = pivot.sqrt();
    }

    Ok(())
}

/// Solves `L y = b` in place, where `L` is the lower triangle (including the diagonal) of `factor`.
pub fn solve_lower_triangular_in_place<T: Real>(factor: &SymmetricSparseMatrix<T>, y: &mut DVectorViewMut<T>) {
    let diagonal = factor.diagonal();
    for i in 0..factor.dim() {
        let mut y_i = y[i];
        for (&j, &l_ij) in factor.row_columns(i).iter().zip(factor.row_values(i)) {
            y_i -= l_ij * y[j];
        }
        y[i] = y_i / diagonal[i];
    }
}

/// Solves `Lᵀ x = y` in place, where `L` is the lower triangle (including the diagonal) of `factor`.
pub fn solve_upper_triangular_in_place<T: Real>(factor: &SymmetricSparseMatrix<T>, x: &mut DVectorViewMut<T>) {
    let diagonal = factor.diagonal();
    for i in (0..factor.dim()).rev() {
        let x_i = x[i] / diagonal[i];
        x[i] = x_i;
        for (&j, &l_ij) in factor.row_columns(i).iter().zip(factor.row_values(i)) {
            x[j] -= l_ij * x_i;
        }
    }
}

/// An incomplete Cholesky preconditioner.
///
/// Applying it as a [`LinearOperator`] computes `y = (L Lᵀ)⁻¹ x` by a forward and a backward
/// substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct IncompleteCholesky<T: Real> {
    factor: SymmetricSparseMatrix<T>,
}

impl<T: Real> IncompleteCholesky<T> {
    pub fn factor(matrix: &SymmetricSparseMatrix<T>) -> Result<Self, SparseError> {
        let mut factor = matrix.clone();
        incomplete_cholesky_in_place(&mut factor)?;
        Ok(Self { factor })
    }

    /// Recomputes the factorization for a matrix with the same sparsity pattern, reusing storage.
    pub fn refactor(&mut self, matrix: &SymmetricSparseMatrix<T>) -> Result<(), SparseError> {
        self.factor.copy_values_from(matrix)?;
        incomplete_cholesky_in_place(&mut self.factor)
    }

    /// The factor `L`, stored as its diagonal and strictly lower triangle.
    pub fn lower_factor(&self) -> &SymmetricSparseMatrix<T> {
        &self.factor
    }

    pub fn solve_in_place(&self, x: &mut DVectorViewMut<T>) {
        solve_lower_triangular_in_place(&self.factor, x);
        solve_upper_triangular_in_place(&self.factor, x);
    }
}

impl<T: Real> LinearOperator<T> for IncompleteCholesky<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        let dim = self.factor.dim();
        if x.len() != dim || y.len() != dim {
            return Err(Box::new(SparseError::DimensionMismatch {
                expected: dim,
                actual: if x.len() != dim { x.len() } else { y.len() },
            }));
        }
        y.copy_from(&x);
        self.solve_in_place(&mut y);
        Ok(())
    }
}
