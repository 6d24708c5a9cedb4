use crate::dense::{solve_dense, DenseSolveError};
use axires_traits::{DimensionMismatch, Equation, Real};
use log::warn;
use nalgebra::{DMatrix, DVector, DVectorView, Scalar};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Adds per-parameter damping terms to the diagonal of the normal equations and solves the
/// resulting system.
///
/// The regularized system is kept as a buffer and reused between solves.
#[derive(Debug, Clone)]
pub struct Regularizer<T: Scalar> {
    regularized: Equation<DMatrix<T>, T>,
}

impl<T: Real> Default for Regularizer<T> {
    fn default() -> Self {
        Self {
            regularized: Equation::zeroed(DMatrix::zeros(0, 0)),
        }
    }
}

impl<T: Real> Regularizer<T> {
    /// Forms `(H + diag(alphas)) δ = g` from the normal equations `H δ = g`.
    pub fn regularize(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        alphas: DVectorView<T>,
    ) -> Result<&mut Equation<DMatrix<T>, T>, DimensionMismatch> {
        let n = normal.dim();
        if alphas.len() != n {
            return Err(DimensionMismatch {
                expected: n,
                actual: alphas.len(),
            });
        }

        if self.regularized.dim() != n {
            self.regularized = Equation::zeroed(DMatrix::zeros(n, n));
        }

        let (matrix, mut solution, mut rhs) = self.regularized.parts_mut();
        matrix.copy_from(normal.matrix());
        for (q, alpha) in alphas.iter().enumerate() {
            matrix[(q, q)] += *alpha;
        }
        rhs.copy_from(normal.rhs());
        solution.fill(T::zero());
        Ok(&mut self.regularized)
    }

    /// Regularizes and solves, returning the increment.
    pub fn solve(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        alphas: DVectorView<T>,
    ) -> Result<DVector<T>, DampingError> {
        let regularized = self.regularize(normal, alphas)?;
        solve_dense(regularized)?;
        Ok(regularized.solution().clone())
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum DampingError {
    DimensionMismatch(DimensionMismatch),
    Solve(DenseSolveError),
    /// No admissible step was found within the allowed number of attempts.
    AttemptsExhausted { attempts: usize },
}

impl fmt::Display for DampingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch(err) => write!(f, "failed to regularize normal equations: {}", err),
            Self::Solve(err) => write!(f, "failed to solve regularized normal equations: {}", err),
            Self::AttemptsExhausted { attempts } => {
                write!(f, "no admissible step found after {} damping attempts", attempts)
            }
        }
    }
}

impl Error for DampingError {}

impl From<DimensionMismatch> for DampingError {
    fn from(err: DimensionMismatch) -> Self {
        Self::DimensionMismatch(err)
    }
}

impl From<DenseSolveError> for DampingError {
    fn from(err: DenseSolveError) -> Self {
        Self::Solve(err)
    }
}

/// An increment together with the damping that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DampedStep<T: Scalar> {
    pub increment: DVector<T>,
    pub alphas: DVector<T>,
}

/// Chooses the damping of each Gauss-Newton step.
pub trait DampingStrategy<T: Scalar> {
    fn damped_step(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        parameters: DVectorView<T>,
    ) -> Result<DampedStep<T>, DampingError>;
}

impl<'a, T: Scalar, D: ?Sized + DampingStrategy<T>> DampingStrategy<T> for &'a mut D {
    fn damped_step(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        parameters: DVectorView<T>,
    ) -> Result<DampedStep<T>, DampingError> {
        D::damped_step(self, normal, parameters)
    }
}

/// Undamped Gauss-Newton: every alpha is zero.
#[derive(Debug, Clone)]
pub struct NoDamping<T: Scalar> {
    regularizer: Regularizer<T>,
}

impl<T: Real> NoDamping<T> {
    pub fn new() -> Self {
        Self {
            regularizer: Regularizer::default(),
        }
    }
}

impl<T: Real> Default for NoDamping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> DampingStrategy<T> for NoDamping<T> {
    fn damped_step(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        _parameters: DVectorView<T>,
    ) -> Result<DampedStep<T>, DampingError> {
        let alphas = DVector::zeros(normal.dim());
        let increment = self.regularizer.solve(normal, DVectorView::from(&alphas))?;
        Ok(DampedStep { increment, alphas })
    }
}

/// Initial damping `alpha_q = scale * H_qq`, falling back to `scale` for a zero diagonal entry.
fn initial_alphas<T: Real>(normal: &Equation<DMatrix<T>, T>, scale: T) -> DVector<T> {
    DVector::from_fn(normal.dim(), |q, _| {
        let h_qq = normal.matrix()[(q, q)].abs();
        if h_qq > T::zero() {
            scale * h_qq
        } else {
            scale
        }
    })
}

/// Settings shared by the damping strategies that escalate alphas until a step is admissible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscalationSettings<T> {
    /// Relative scale of the first alphas with respect to the Hessian diagonal.
    pub initial_scale: T,
    /// Factor applied to an alpha each time it is escalated.
    pub growth: T,
    pub max_attempts: usize,
}

impl<T: Real> Default for EscalationSettings<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn default() -> Self {
        Self {
            initial_scale: 1e-8,
            growth: 1.5,
            max_attempts: 200,
        }
    }
}

/// Escalates all alphas uniformly until the regularized system can be solved.
#[derive(Debug, Clone)]
pub struct EscalatingDamping<T: Scalar> {
    settings: EscalationSettings<T>,
    regularizer: Regularizer<T>,
}

impl<T: Real> EscalatingDamping<T> {
    pub fn new(settings: EscalationSettings<T>) -> Self {
        Self {
            settings,
            regularizer: Regularizer::default(),
        }
    }
}

impl<T: Real> Default for EscalatingDamping<T> {
    fn default() -> Self {
        Self::new(EscalationSettings::default())
    }
}

impl<T: Real> DampingStrategy<T> for EscalatingDamping<T> {
    fn damped_step(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        _parameters: DVectorView<T>,
    ) -> Result<DampedStep<T>, DampingError> {
        let mut alphas = initial_alphas(normal, self.settings.initial_scale);
        for attempt in 0..self.settings.max_attempts {
            let result = self.regularizer.solve(normal, DVectorView::from(&alphas));
            match result {
                Ok(increment) => return Ok(DampedStep { increment, alphas }),
                Err(DampingError::Solve(err)) => {
                    warn!("Damping attempt {} failed ({}), escalating alphas", attempt, err);
                    alphas *= self.settings.growth;
                }
                Err(err) => return Err(err),
            }
        }
        Err(DampingError::AttemptsExhausted {
            attempts: self.settings.max_attempts,
        })
    }
}

/// Escalates the alphas of individual parameters until every parameter changes by at most a
/// factor `max_ratio` and stays within its bounds.
#[derive(Debug, Clone)]
pub struct BoundedStepDamping<T: Scalar> {
    settings: EscalationSettings<T>,
    max_ratio: T,
    bounds: Vec<Option<(T, T)>>,
    regularizer: Regularizer<T>,
}

impl<T: Real> BoundedStepDamping<T> {
    /// Creates the strategy with one optional `(lower, upper)` bound per parameter.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn new(settings: EscalationSettings<T>, bounds: Vec<Option<(T, T)>>) -> Self {
        Self {
            settings,
            max_ratio: 2.0,
            bounds,
            regularizer: Regularizer::default(),
        }
    }

    pub fn with_max_ratio(self, max_ratio: T) -> Self {
        Self { max_ratio, ..self }
    }

    fn is_admissible(&self, q: usize, current: T, updated: T) -> bool {
        let ratio = updated / current;
        let within_ratio = ratio > T::zero() && ratio.max(T::one() / ratio) <= self.max_ratio;
        let within_bounds = self
            .bounds
            .get(q)
            .copied()
            .flatten()
            .map(|(lower, upper)| lower <= updated && updated <= upper)
            .unwrap_or(true);
        within_ratio && within_bounds
    }
}

impl<T: Real> DampingStrategy<T> for BoundedStepDamping<T> {
    fn damped_step(
        &mut self,
        normal: &Equation<DMatrix<T>, T>,
        parameters: DVectorView<T>,
    ) -> Result<DampedStep<T>, DampingError> {
        if parameters.len() != normal.dim() {
            return Err(DampingError::DimensionMismatch(DimensionMismatch {
                expected: normal.dim(),
                actual: parameters.len(),
            }));
        }

        let growth = self.settings.growth;
        let mut alphas = initial_alphas(normal, self.settings.initial_scale);
        for attempt in 0..self.settings.max_attempts {
            let result = self.regularizer.solve(normal, DVectorView::from(&alphas));
            let increment = match result {
                Ok(increment) => increment,
                Err(DampingError::Solve(err)) => {
                    warn!("Damping attempt {} failed ({}), escalating alphas", attempt, err);
                    alphas *= growth;
                    continue;
                }
                Err(err) => return Err(err),
            };

            let mut admissible = true;
            for q in 0..parameters.len() {
                let current = parameters[q];
                if !self.is_admissible(q, current, current + increment[q]) {
                    alphas[q] *= growth;
                    admissible = false;
                }
            }

            if admissible {
                return Ok(DampedStep { increment, alphas });
            }
        }
        Err(DampingError::AttemptsExhausted {
            attempts: self.settings.max_attempts,
        })
    }
}
