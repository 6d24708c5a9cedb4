use crate::cholesky::IncompleteCholesky;
use crate::SymmetricSparseMatrix;
use axires_traits::{Equation, Real};
use core::fmt;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, Scalar};
use num::Zero;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

pub type OperatorError = Box<dyn Error + Send + Sync>;

pub trait LinearOperator<T: Scalar> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: Scalar,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        <A as LinearOperator<T>>::apply(self, y, x)
    }
}

impl<T: Real> LinearOperator<T> for DMatrix<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        y.gemv(T::one(), self, &x, T::zero());
        Ok(())
    }
}

impl<T: Real> LinearOperator<T> for SymmetricSparseMatrix<T> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        self.mul_vec_into(y, x)?;
        Ok(())
    }
}

pub struct IdentityOperator;

impl<T: Scalar> LinearOperator<T> for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), OperatorError> {
        y.copy_from(&x);
        Ok(())
    }
}

pub trait CgStoppingCriterion<T: Scalar> {
    fn has_converged(&self, b_norm: T, iteration: usize, approx_residual: DVectorView<T>) -> Result<bool, SolveErrorKind>;
}

/// Relative residual tolerance ||r|| < tol * ||b||.
///
/// Note that we use the *approximate* residual given by Conjugate-Gradient, which is updated
/// recursively and may keep decreasing below the accuracy of the true residual.
#[derive(Debug)]
pub struct RelativeResidualCriterion<T: Scalar> {
    tol: T,
}

impl<T: Scalar + Zero> RelativeResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }
}

impl<T: Real> CgStoppingCriterion<T> for RelativeResidualCriterion<T> {
    fn has_converged(&self, b_norm: T, _iteration: usize, approx_residual: DVectorView<T>) -> Result<bool, SolveErrorKind> {
        Ok(approx_residual.norm() < self.tol * b_norm)
    }
}

/// Settings for preconditioned conjugate gradient solves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CgSettings<T> {
    /// Iteration stops once the relative residual drops below `epsilon²`.
    pub epsilon: T,
    pub max_iterations: usize,
}

impl<T: Real> Default for CgSettings<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn default() -> Self {
        Self {
            epsilon: 1e-15,
            max_iterations: 10000,
        }
    }
}

impl<T: Real> CgSettings<T> {
    pub fn stopping_criterion(&self) -> RelativeResidualCriterion<T> {
        RelativeResidualCriterion::new(self.epsilon * self.epsilon)
    }
}

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct CgWorkspace<T: Scalar> {
    r: DVector<T>,
    z: DVector<T>,
    p: DVector<T>,
    Ap: DVector<T>,
}

#[allow(non_snake_case)]
struct Buffers<'a, T: Scalar> {
    r: &'a mut DVector<T>,
    z: &'a mut DVector<T>,
    p: &'a mut DVector<T>,
    Ap: &'a mut DVector<T>,
}

impl<T: Scalar + Zero> Default for CgWorkspace<T> {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            z: DVector::zeros(0),
            p: DVector::zeros(0),
            Ap: DVector::zeros(0),
        }
    }
}

impl<T: Scalar + Zero> CgWorkspace<T> {
    fn prepare_buffers(&mut self, dim: usize) -> Buffers<T> {
        self.r.resize_vertically_mut(dim, T::zero());
        self.z.resize_vertically_mut(dim, T::zero());
        self.p.resize_vertically_mut(dim, T::zero());
        self.Ap.resize_vertically_mut(dim, T::zero());
        Buffers {
            r: &mut self.r,
            z: &mut self.z,
            p: &mut self.p,
            Ap: &mut self.Ap,
        }
    }
}

#[derive(Debug)]
enum OwnedOrMutRef<'a, T> {
    Owned(T),
    MutRef(&'a mut T),
}

impl<'a, T> Deref for OwnedOrMutRef<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

impl<'a, T> DerefMut for OwnedOrMutRef<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

#[derive(Debug)]
pub struct ConjugateGradient<'a, T, A, P, Criterion>
where
    T: Scalar,
{
    workspace: OwnedOrMutRef<'a, CgWorkspace<T>>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<'a, T: Scalar + Zero> ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            workspace: OwnedOrMutRef::Owned(CgWorkspace::default()),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a, T: Scalar> ConjugateGradient<'a, T, (), IdentityOperator, ()> {
    pub fn with_workspace(workspace: &'a mut CgWorkspace<T>) -> Self {
        Self {
            workspace: OwnedOrMutRef::MutRef(workspace),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<'a, T: Scalar, P, Criterion> ConjugateGradient<'a, T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<'a, T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<'a, T: Scalar, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<'a, T, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<'a, T: Scalar, A, P> ConjugateGradient<'a, T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(
        self,
        stopping_criterion: Criterion,
    ) -> ConjugateGradient<'a, T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(OperatorError),
    PreconditionerError(OperatorError),
    StoppingCriterionError(OperatorError),
    DimensionMismatch { expected: usize, actual: usize },
    IndefiniteOperator,
    IndefinitePreconditioner,
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => {
                write!(f, "Error applying operator: ")?;
                err.fmt(f)
            }
            Self::PreconditionerError(err) => {
                write!(f, "Error applying preconditioner: ")?;
                err.fmt(f)
            }
            Self::StoppingCriterionError(err) => {
                write!(f, "Error evaluating stopping criterion: ")?;
                err.fmt(f)
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "Right-hand side has dimension {}, but the solution has dimension {}", expected, actual)
            }
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner"),
        }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError<T> {
    pub output: CgOutput<T>,
    pub kind: SolveErrorKind,
}

impl<T> SolveError<T> {
    fn new(output: CgOutput<T>, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl<T> fmt::Display for SolveError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CG solve failed after {} iterations. ", self.output.num_iterations)?;
        write!(f, "Error: {}", self.kind)
    }
}

impl<T: fmt::Debug> std::error::Error for SolveError<T> {}

/// y = Ax
fn apply_operator<'a, T, A>(
    y: impl Into<DVectorViewMut<'a, T>>,
    a: &'a A,
    x: impl Into<DVectorView<'a, T>>,
) -> Result<(), OperatorError>
where
    T: Scalar,
    A: LinearOperator<T>,
{
    a.apply(y.into(), x.into())
}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CgOutput<T> {
    /// Number of iterations of the solver.
    ///
    /// Corresponds to the number of updates made to the (initial) solution vector,
    pub num_iterations: usize,
    /// Relative norm `||r|| / ||b||` of the approximate residual at termination.
    pub relative_residual: T,
    /// Whether the stopping criterion was satisfied before the iteration limit.
    pub converged: bool,
}

impl<'a, T, A, P, Criterion> ConjugateGradient<'a, T, A, P, Criterion>
where
    T: Real,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: CgStoppingCriterion<T>,
{
    /// Runs (preconditioned) conjugate gradient starting from the guess stored in `x`.
    ///
    /// Exhausting the iteration limit is not an error: the current iterate is kept and the
    /// returned output reports `converged = false`.
    pub fn solve_with_guess<'b>(
        &mut self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<CgOutput<T>, SolveError<T>> {
        self.solve_with_guess_(b.into(), x.into())
    }

    #[allow(non_snake_case)]
    fn solve_with_guess_(&mut self, b: DVectorView<T>, mut x: DVectorViewMut<T>) -> Result<CgOutput<T>, SolveError<T>> {
        use SolveErrorKind::*;

        let mut output = CgOutput {
            num_iterations: 0,
            relative_residual: T::zero(),
            converged: false,
        };

        if b.len() != x.len() {
            let kind = DimensionMismatch {
                expected: b.len(),
                actual: x.len(),
            };
            return Err(SolveError::new(output, kind));
        }

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            output.converged = true;
            return Ok(output);
        }

        let Buffers { r, z, p, Ap } = self.workspace.prepare_buffers(x.len());

        // r = b - Ax
        if let Err(err) = apply_operator(&mut *r, &self.operator, &x) {
            return Err(SolveError::new(output, OperatorError(err)));
        }
        r.zip_apply(&b, |Ax_i, b_i| *Ax_i = b_i - *Ax_i);

        // z = Pr
        if let Err(err) = apply_operator(&mut *z, &self.preconditioner, &*r) {
            return Err(SolveError::new(output, PreconditionerError(err)));
        }

        // p = z
        p.copy_from(&*z);

        let mut zTr = z.dot(&*r);
        let mut pAp;

        loop {
            output.relative_residual = r.norm() / b_norm;
            let convergence = self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations, (&*r).into());

            let has_converged = match convergence {
                Ok(converged) => converged,
                Err(error_kind) => return Err(SolveError::new(output, error_kind)),
            };

            if has_converged {
                output.converged = true;
                break;
            } else if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    warn!(
                        "CG did not converge within {} iterations (relative residual {})",
                        max_iter, output.relative_residual
                    );
                    break;
                }
            }

            // Ap = A * p
            if let Err(err) = apply_operator(&mut *Ap, &self.operator, &*p) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            pAp = p.dot(&*Ap);

            if pAp <= T::zero() {
                return Err(SolveError::new(output, IndefiniteOperator));
            }
            if zTr <= T::zero() {
                return Err(SolveError::new(output, IndefinitePreconditioner));
            }

            let alpha = zTr / pAp;
            // x <- x + alpha * p
            x.zip_apply(&*p, |x_i, p_i| *x_i += alpha * p_i);
            // r <- r - alpha * Ap
            r.zip_apply(&*Ap, |r_i, Ap_i| *r_i -= alpha * Ap_i);

            // Number of iterations corresponds to number of updates to the x vector
            output.num_iterations += 1;

            // z <- P r
            if let Err(err) = apply_operator(&mut *z, &self.preconditioner, &*r) {
                return Err(SolveError::new(output, PreconditionerError(err)));
            }
            let zTr_next = z.dot(&*r);
            let beta = zTr_next / zTr;

            // p <- z + beta * p
            p.zip_apply(&*z, |p_i, z_i| *p_i = z_i + beta * *p_i);

            zTr = zTr_next;
        }

        Ok(output)
    }
}

/// Conjugate gradient preconditioned by the incomplete Cholesky factorization of the system matrix.
///
/// The solver owns its workspace and the preconditioner storage, both of which are reused across
/// solves as long as the sparsity pattern of the system matrix does not change.
#[derive(Debug, Clone)]
pub struct PcgSolver<T: Real> {
    settings: CgSettings<T>,
    workspace: CgWorkspace<T>,
    preconditioner: Option<IncompleteCholesky<T>>,
}

impl<T: Real> Default for PcgSolver<T> {
    fn default() -> Self {
        Self::new(CgSettings::default())
    }
}

impl<T: Real> PcgSolver<T> {
    pub fn new(settings: CgSettings<T>) -> Self {
        Self {
            settings,
            workspace: CgWorkspace::default(),
            preconditioner: None,
        }
    }

    pub fn settings(&self) -> &CgSettings<T> {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: CgSettings<T>) {
        self.settings = settings;
    }

    /// Solves the equation, using its current solution vector as the initial guess.
    pub fn solve(&mut self, equation: &mut Equation<SymmetricSparseMatrix<T>, T>) -> Result<CgOutput<T>, SolveError<T>> {
        let (matrix, solution, rhs) = equation.parts_mut();
        let matrix = &*matrix;

        let failed = |err: crate::SparseError| {
            let output = CgOutput {
                num_iterations: 0,
                relative_residual: T::zero(),
                converged: false,
            };
            SolveError::new(output, SolveErrorKind::PreconditionerError(Box::new(err)))
        };

        let preconditioner = match &mut self.preconditioner {
            Some(preconditioner) if Arc::ptr_eq(preconditioner.lower_factor().pattern(), matrix.pattern()) => {
                preconditioner.refactor(matrix).map_err(failed)?;
                preconditioner
            }
            preconditioner => preconditioner.insert(IncompleteCholesky::factor(matrix).map_err(failed)?),
        };

        let output = ConjugateGradient::with_workspace(&mut self.workspace)
            .with_operator(matrix)
            .with_preconditioner(&*preconditioner)
            .with_stopping_criterion(self.settings.stopping_criterion())
            .with_max_iter(self.settings.max_iterations)
            .solve_with_guess(DVectorView::from(&rhs), solution)?;

        debug!(
            "PCG finished after {} iterations with relative residual {}",
            output.num_iterations, output.relative_residual
        );
        Ok(output)
    }
}
