use nalgebra::storage::Storage;
use nalgebra::{DVector, Dim, Matrix};

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Asserts that two scalars agree to within a relative tolerance of the larger magnitude.
#[macro_export]
macro_rules! assert_scalar_eq {
    ($x:expr, $y:expr, reltol = $tol:expr) => {{
        let (x, y): (f64, f64) = ($x, $y);
        let scale = x.abs().max(y.abs());
        let approx_eq = (x - y).abs() <= $tol * scale;
        if !approx_eq {
            println!("reltol: {:e}", $tol);
            println!("left: {:e}", x);
            println!("right: {:e}", y);
        }
        assert!(approx_eq);
    }};
}

/// Largest entry-wise relative difference `|x_i - y_i| / max(|x_i|, |y_i|)`, skipping entries
/// where both are zero.
pub fn max_relative_difference<R, C, S1, S2>(x: &Matrix<f64, R, C, S1>, y: &Matrix<f64, R, C, S2>) -> f64
where
    R: Dim,
    C: Dim,
    S1: Storage<f64, R, C>,
    S2: Storage<f64, R, C>,
{
    assert_eq!(x.shape(), y.shape(), "Matrices must have the same shape.");
    x.iter()
        .zip(y.iter())
        .filter(|(a, b)| **a != 0.0 || **b != 0.0)
        .map(|(a, b)| (a - b).abs() / a.abs().max(b.abs()))
        .fold(0.0, f64::max)
}

/// Evenly spaced samples `a, a + h, ..., b` with `n` intervals.
pub fn linspace(a: f64, b: f64, n: usize) -> DVector<f64> {
    assert!(n > 0, "Need at least one interval.");
    DVector::from_fn(n + 1, |i, _| a + (b - a) * (i as f64) / (n as f64))
}
