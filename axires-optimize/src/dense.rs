use axires_traits::{Equation, Real};
use nalgebra::DMatrix;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenseSolveError {
    /// The matrix is singular, or so close to singular that the solution is not finite.
    Singular,
}

impl fmt::Display for DenseSolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular => write!(f, "matrix is singular"),
        }
    }
}

impl Error for DenseSolveError {}

/// Solves a dense equation by LU decomposition with partial pivoting, writing the result into
/// the solution vector of the equation.
///
/// The matrix is left untouched.
pub fn solve_dense<T: Real>(equation: &mut Equation<DMatrix<T>, T>) -> Result<(), DenseSolveError> {
    let (matrix, mut solution, rhs) = equation.parts_mut();
    let lu = matrix.clone().lu();
    let x = lu.solve(&rhs).ok_or(DenseSolveError::Singular)?;
    if !x.iter().all(|x_i| x_i.is_finite()) {
        return Err(DenseSolveError::Singular);
    }
    solution.copy_from(&x);
    Ok(())
}
