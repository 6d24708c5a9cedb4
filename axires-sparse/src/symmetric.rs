use crate::{SparseError, SymmetricPattern};
use axires_traits::{Real, SystemMatrix};
use nalgebra::{DMatrix, DVectorView, DVectorViewMut, Scalar};
use num::Zero;
use std::sync::Arc;

/// A symmetric sparse matrix storing its diagonal densely and its strictly lower triangle in
/// compressed row form.
///
/// Reads and writes of an off-diagonal entry `(i, j)` are symmetric: `(i, j)` and `(j, i)` refer to
/// the same stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricSparseMatrix<T: Scalar> {
    pattern: Arc<SymmetricPattern>,
    diagonal: Vec<T>,
    values: Vec<T>,
}

impl<T: Scalar> SystemMatrix for SymmetricSparseMatrix<T> {
    fn dim(&self) -> usize {
        self.pattern.dim()
    }
}

impl<T: Scalar + Zero> SymmetricSparseMatrix<T> {
    pub fn zeros(pattern: Arc<SymmetricPattern>) -> Self {
        let diagonal = vec![T::zero(); pattern.dim()];
        let values = vec![T::zero(); pattern.nnz_lower()];
        Self {
            pattern,
            diagonal,
            values,
        }
    }

    pub fn fill_zero(&mut self) {
        self.diagonal.fill(T::zero());
        self.values.fill(T::zero());
    }
}

impl<T: Scalar> SymmetricSparseMatrix<T> {
    pub fn try_from_parts(
        pattern: Arc<SymmetricPattern>,
        diagonal: Vec<T>,
        values: Vec<T>,
    ) -> Result<Self, SparseError> {
        if diagonal.len() != pattern.dim() {
            return Err(SparseError::DimensionMismatch {
                expected: pattern.dim(),
                actual: diagonal.len(),
            });
        }
        if values.len() != pattern.nnz_lower() {
            return Err(SparseError::DimensionMismatch {
                expected: pattern.nnz_lower(),
                actual: values.len(),
            });
        }
        Ok(Self {
            pattern,
            diagonal,
            values,
        })
    }

    pub fn pattern(&self) -> &Arc<SymmetricPattern> {
        &self.pattern
    }

    pub fn dim(&self) -> usize {
        self.pattern.dim()
    }

    pub fn diagonal(&self) -> &[T] {
        &self.diagonal
    }

    pub fn diagonal_mut(&mut self) -> &mut [T] {
        &mut self.diagonal
    }

    /// Values of the strictly lower triangle, ordered as the pattern's column indices.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn diagonal_and_values_mut(&mut self) -> (&mut [T], &mut [T]) {
        (&mut self.diagonal, &mut self.values)
    }

    /// Stored columns `j < row` of the given row.
    pub fn row_columns(&self, row: usize) -> &[usize] {
        self.pattern.row_columns(row)
    }

    pub fn row_values(&self, row: usize) -> &[T] {
        let offsets = self.pattern.row_offsets();
        &self.values[offsets[row]..offsets[row + 1]]
    }

    fn check_index(&self, index: usize) -> Result<(), SparseError> {
        let dim = self.dim();
        if index < dim {
            Ok(())
        } else {
            Err(SparseError::IndexOutOfBounds { index, dim })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T, SparseError> {
        self.check_index(row)?;
        self.check_index(col)?;
        if row == col {
            Ok(self.diagonal[row].clone())
        } else {
            let (i, j) = (row.max(col), row.min(col));
            self.pattern
                .find_offset(i, j)
                .map(|offset| self.values[offset].clone())
                .ok_or(SparseError::EntryOutsidePattern { row, col })
        }
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut T, SparseError> {
        self.check_index(row)?;
        self.check_index(col)?;
        if row == col {
            Ok(&mut self.diagonal[row])
        } else {
            let (i, j) = (row.max(col), row.min(col));
            let offset = self
                .pattern
                .find_offset(i, j)
                .ok_or(SparseError::EntryOutsidePattern { row, col })?;
            Ok(&mut self.values[offset])
        }
    }

    /// Overwrites the values of `self` with those of `other` without reallocating.
    pub fn copy_values_from(&mut self, other: &SymmetricSparseMatrix<T>) -> Result<(), SparseError> {
        if !Arc::ptr_eq(&self.pattern, &other.pattern) && self.pattern != other.pattern {
            return Err(SparseError::PatternMismatch);
        }
        self.diagonal.clone_from_slice(&other.diagonal);
        self.values.clone_from_slice(&other.values);
        Ok(())
    }
}

impl<T: Real> SymmetricSparseMatrix<T> {
    /// Adds `value` to the entry `(row, col)`, and therefore also to `(col, row)`.
    pub fn add(&mut self, row: usize, col: usize, value: T) -> Result<(), SparseError> {
        *self.get_mut(row, col)? += value;
        Ok(())
    }

    /// Computes `y = A x`.
    pub fn mul_vec_into(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), SparseError> {
        let dim = self.dim();
        for len in [x.len(), y.len()] {
            if len != dim {
                return Err(SparseError::DimensionMismatch {
                    expected: dim,
                    actual: len,
                });
            }
        }

        for i in 0..dim {
            y[i] = self.diagonal[i] * x[i];
        }

        let offsets = self.pattern.row_offsets();
        let columns = self.pattern.column_indices();
        for i in 0..dim {
            let mut y_i = y[i];
            for idx in offsets[i]..offsets[i + 1] {
                let j = columns[idx];
                let a_ij = self.values[idx];
                y_i += a_ij * x[j];
                y[j] += a_ij * x[i];
            }
            y[i] = y_i;
        }
        Ok(())
    }

    pub fn to_dense(&self) -> DMatrix<T> {
        let dim = self.dim();
        let mut dense = DMatrix::zeros(dim, dim);
        for i in 0..dim {
            dense[(i, i)] = self.diagonal[i];
            for (&j, &a_ij) in self.row_columns(i).iter().zip(self.row_values(i)) {
                dense[(i, j)] = a_ij;
                dense[(j, i)] = a_ij;
            }
        }
        dense
    }
}
