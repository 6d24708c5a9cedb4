use nalgebra::{DMatrix, DVector, DVectorViewMut, Scalar};
use num::Zero;
use std::error::Error;
use std::fmt;

/// A matrix that can serve as the left-hand side of an [`Equation`].
pub trait SystemMatrix {
    /// The number of rows (and columns) of the square matrix.
    fn dim(&self) -> usize;
}

impl<T: Scalar> SystemMatrix for DMatrix<T> {
    fn dim(&self) -> usize {
        self.nrows()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for DimensionMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dimension mismatch: expected dimension {}, got {}",
            self.expected, self.actual
        )
    }
}

impl Error for DimensionMismatch {}

/// A linear system `A x = b`.
///
/// The solution vector doubles as the initial guess handed to iterative solvers and receives their
/// output. The matrix, solution and right-hand side always share the same dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation<M, T: Scalar> {
    matrix: M,
    solution: DVector<T>,
    rhs: DVector<T>,
}

impl<M: SystemMatrix, T: Scalar> Equation<M, T> {
    pub fn try_new(matrix: M, solution: DVector<T>, rhs: DVector<T>) -> Result<Self, DimensionMismatch> {
        let dim = matrix.dim();
        for actual in [solution.len(), rhs.len()] {
            if actual != dim {
                return Err(DimensionMismatch { expected: dim, actual });
            }
        }
        Ok(Self { matrix, solution, rhs })
    }

    /// Wraps the matrix together with zero-filled solution and right-hand side vectors.
    pub fn zeroed(matrix: M) -> Self
    where
        T: Zero,
    {
        let dim = matrix.dim();
        Self {
            matrix,
            solution: DVector::zeros(dim),
            rhs: DVector::zeros(dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    /// Mutable access to the matrix. The matrix must keep its dimension.
    pub fn matrix_mut(&mut self) -> &mut M {
        &mut self.matrix
    }

    pub fn solution(&self) -> &DVector<T> {
        &self.solution
    }

    pub fn solution_mut(&mut self) -> DVectorViewMut<T> {
        DVectorViewMut::from(&mut self.solution)
    }

    pub fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    pub fn rhs_mut(&mut self) -> DVectorViewMut<T> {
        DVectorViewMut::from(&mut self.rhs)
    }

    /// Splits the equation into simultaneously borrowable parts `(matrix, solution, rhs)`.
    pub fn parts_mut(&mut self) -> (&mut M, DVectorViewMut<T>, DVectorViewMut<T>) {
        (
            &mut self.matrix,
            DVectorViewMut::from(&mut self.solution),
            DVectorViewMut::from(&mut self.rhs),
        )
    }

    pub fn into_parts(self) -> (M, DVector<T>, DVector<T>) {
        (self.matrix, self.solution, self.rhs)
    }
}
