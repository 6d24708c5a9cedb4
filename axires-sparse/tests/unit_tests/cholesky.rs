use super::{shifted_laplacian, QuadGrid};
use axires_sparse::cholesky::{incomplete_cholesky_in_place, IncompleteCholesky};
use axires_sparse::{SparseError, SymmetricPattern, SymmetricSparseMatrix};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector, DVectorViewMut};
use nalgebra_sparse::pattern::SparsityPattern;
use std::sync::Arc;

fn dense_lower_factor(factor: &SymmetricSparseMatrix<f64>) -> DMatrix<f64> {
    let dense = factor.to_dense();
    DMatrix::from_fn(dense.nrows(), dense.ncols(), |i, j| if j <= i { dense[(i, j)] } else { 0.0 })
}

fn tridiagonal(n: usize) -> SymmetricSparseMatrix<f64> {
    let offsets = (0..=n).map(|i| i.saturating_sub(1)).collect();
    let columns = (0..n.saturating_sub(1)).collect();
    let lower = SparsityPattern::try_from_offsets_and_indices(n, n, offsets, columns).unwrap();
    let pattern = Arc::new(SymmetricPattern::from_lower_triangle(lower).unwrap());
    SymmetricSparseMatrix::try_from_parts(pattern, vec![4.0; n], vec![-1.0; n - 1]).unwrap()
}

#[test]
fn incomplete_cholesky_of_tridiagonal_matrix_is_exact() {
    // A tridiagonal matrix has no fill-in, so the incomplete factorization is the full one
    let matrix = tridiagonal(6);
    let preconditioner = IncompleteCholesky::factor(&matrix).unwrap();
    let l = dense_lower_factor(preconditioner.lower_factor());

    assert_matrix_eq!(&l * l.transpose(), matrix.to_dense(), comp = abs, tol = 1e-12);

    let expected = matrix.to_dense().cholesky().unwrap().l();
    assert_matrix_eq!(l, expected, comp = abs, tol = 1e-12);
}

#[test]
fn incomplete_cholesky_reproduces_entries_in_pattern() {
    let matrix = shifted_laplacian(&QuadGrid::new(4, 3));
    let preconditioner = IncompleteCholesky::factor(&matrix).unwrap();
    let l = dense_lower_factor(preconditioner.lower_factor());
    let product = &l * l.transpose();
    let dense = matrix.to_dense();

    let pattern = matrix.pattern();
    for i in 0..matrix.dim() {
        for j in 0..matrix.dim() {
            if pattern.contains(i, j) {
                assert!(
                    (product[(i, j)] - dense[(i, j)]).abs() < 1e-12,
                    "mismatch at ({}, {})",
                    i,
                    j
                );
            }
        }
    }
}

#[test]
fn triangular_solves_invert_the_factor() {
    let matrix = shifted_laplacian(&QuadGrid::new(3, 3));
    let preconditioner = IncompleteCholesky::factor(&matrix).unwrap();
    let l = dense_lower_factor(preconditioner.lower_factor());

    let b = DVector::from_fn(matrix.dim(), |i, _| (i as f64).sin() + 2.0);
    let mut x = b.clone();
    preconditioner.solve_in_place(&mut DVectorViewMut::from(&mut x));

    assert_matrix_eq!(&l * l.transpose() * &x, b, comp = abs, tol = 1e-12);
}

#[test]
fn refactor_matches_fresh_factorization() {
    let grid = QuadGrid::new(3, 2);
    let matrix = shifted_laplacian(&grid);
    let mut preconditioner = IncompleteCholesky::factor(&matrix).unwrap();

    let mut scaled = matrix.clone();
    scaled.values_mut().iter_mut().for_each(|v| *v *= 0.5);
    preconditioner.refactor(&scaled).unwrap();

    let fresh = IncompleteCholesky::factor(&scaled).unwrap();
    assert_eq!(preconditioner, fresh);
}

#[test]
fn incomplete_cholesky_reports_non_positive_pivot() {
    let mut matrix = tridiagonal(3);
    matrix.diagonal_mut()[1] = 0.25;
    assert_eq!(
        incomplete_cholesky_in_place(&mut matrix),
        Err(SparseError::NonPositivePivot { row: 1 })
    );
}
