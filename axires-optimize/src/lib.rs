/// Damping strategies that regularize the normal equations
pub mod damping;
/// Dense linear solves
pub mod dense;
/// Damped Gauss-Newton for weighted least squares
pub mod gauss_newton;
/// Weighted misfit and normal equations
pub mod normal;
