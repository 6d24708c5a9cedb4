use axires_optimize::dense::{solve_dense, DenseSolveError};
use axires_traits::Equation;
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};

#[test]
fn solve_dense_small_system() {
    #[rustfmt::skip]
    let a = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, 0.0,
                                            1.0, 3.0, 1.0,
                                            0.0, 1.0, 4.0]);
    let x_expected = DVector::from_column_slice(&[1.0, -1.0, 0.5]);
    let b = &a * &x_expected;

    let mut equation = Equation::try_new(a.clone(), DVector::zeros(3), b).unwrap();
    solve_dense(&mut equation).unwrap();

    assert_matrix_eq!(equation.solution(), &x_expected, comp = abs, tol = 1e-14);
    assert_eq!(equation.matrix(), &a);
}

#[test]
fn solve_dense_reports_singular_matrix() {
    let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
    let mut equation = Equation::try_new(a, DVector::zeros(2), DVector::from_column_slice(&[1.0, 1.0])).unwrap();
    assert_eq!(solve_dense(&mut equation), Err(DenseSolveError::Singular));
}

#[test]
fn equation_rejects_mismatched_dimensions() {
    let result = Equation::try_new(DMatrix::<f64>::identity(3, 3), DVector::<f64>::zeros(3), DVector::zeros(2));
    let err = result.unwrap_err();
    assert_eq!(err.expected, 3);
    assert_eq!(err.actual, 2);
}
