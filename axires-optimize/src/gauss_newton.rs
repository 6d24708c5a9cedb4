use crate::damping::{DampingError, DampingStrategy};
use crate::normal::{assemble_normal_equations, misfit_functional, squared_weights, ZeroObservation};
use axires_traits::{DimensionMismatch, Equation, Real};
use log::{debug, info};
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorView, DVectorViewMut, Scalar};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

pub type ModelError = Box<dyn Error + Send + Sync>;

/// A model whose predictions are fitted to observations by least squares.
pub trait LeastSquaresModel<T: Scalar> {
    fn num_parameters(&self) -> usize;

    fn num_measurements(&self) -> usize;

    /// The current parameter vector.
    fn parameters(&self) -> DVector<T>;

    fn set_parameters(&mut self, parameters: DVectorView<T>) -> Result<(), ModelError>;

    /// Evaluates the model at the current parameters.
    fn predict_into(&mut self, predicted: DVectorViewMut<T>) -> Result<(), ModelError>;

    /// Computes the Jacobian of the predictions with respect to the parameters, with one row per
    /// measurement and one column per parameter.
    ///
    /// `predicted` holds the predictions at the current parameters.
    fn jacobian_into(&mut self, predicted: DVectorView<T>, jacobian: DMatrixViewMut<T>) -> Result<(), ModelError>;
}

impl<'a, T: Scalar, M: ?Sized + LeastSquaresModel<T>> LeastSquaresModel<T> for &'a mut M {
    fn num_parameters(&self) -> usize {
        M::num_parameters(self)
    }

    fn num_measurements(&self) -> usize {
        M::num_measurements(self)
    }

    fn parameters(&self) -> DVector<T> {
        M::parameters(self)
    }

    fn set_parameters(&mut self, parameters: DVectorView<T>) -> Result<(), ModelError> {
        M::set_parameters(self, parameters)
    }

    fn predict_into(&mut self, predicted: DVectorViewMut<T>) -> Result<(), ModelError> {
        M::predict_into(self, predicted)
    }

    fn jacobian_into(&mut self, predicted: DVectorView<T>, jacobian: DMatrixViewMut<T>) -> Result<(), ModelError> {
        M::jacobian_into(self, predicted, jacobian)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussNewtonSettings<T> {
    pub max_iterations: usize,
    /// Iteration continues while the functional changes by more than this relative amount.
    pub min_relative_change: T,
    /// Iteration stops once the functional drops below this value.
    pub functional_precision: T,
}

impl<T: Real> Default for GaussNewtonSettings<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            min_relative_change: 1e-7,
            functional_precision: 1e-15,
        }
    }
}

impl<T: Real> GaussNewtonSettings<T> {
    /// Decides whether another iteration should be performed after the functional went from
    /// `previous` to `current`.
    pub fn should_continue(&self, previous: Option<T>, current: T) -> bool {
        if current < self.functional_precision {
            return false;
        }
        match previous {
            None => true,
            Some(previous) => {
                let ratio = (current / previous).abs();
                (ratio.max(T::one() / ratio) - T::one()).abs() > self.min_relative_change
            }
        }
    }
}

#[derive(Debug)]
pub enum GaussNewtonError {
    /// The model failed to evaluate, differentiate or accept parameters.
    Model(ModelError),
    /// No damped step could be computed.
    Damping(DampingError),
    ZeroObservation(ZeroObservation),
    DimensionMismatch(DimensionMismatch),
}

impl fmt::Display for GaussNewtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            GaussNewtonError::Model(err) => write!(f, "Model evaluation failed. Error: {}", err),
            GaussNewtonError::Damping(err) => write!(f, "Failed to compute Gauss-Newton step. Error: {}", err),
            GaussNewtonError::ZeroObservation(err) => write!(f, "Invalid observations. Error: {}", err),
            GaussNewtonError::DimensionMismatch(err) => {
                write!(f, "Observations do not match the model. Error: {}", err)
            }
        }
    }
}

impl Error for GaussNewtonError {}

impl From<DampingError> for GaussNewtonError {
    fn from(err: DampingError) -> Self {
        Self::Damping(err)
    }
}

impl From<ZeroObservation> for GaussNewtonError {
    fn from(err: ZeroObservation) -> Self {
        Self::ZeroObservation(err)
    }
}

impl From<DimensionMismatch> for GaussNewtonError {
    fn from(err: DimensionMismatch) -> Self {
        Self::DimensionMismatch(err)
    }
}

/// Snapshot of the state after a Gauss-Newton iteration.
///
/// Iteration `0` describes the initial model, before any step has been taken; its increment and
/// alphas are zero.
#[derive(Debug, Clone, Copy)]
pub struct IterationReport<'a, T: Scalar> {
    pub iteration: usize,
    pub functional: T,
    pub parameters: DVectorView<'a, T>,
    pub increment: DVectorView<'a, T>,
    pub alphas: DVectorView<'a, T>,
}

pub trait IterationObserver<T: Scalar> {
    fn observe(&mut self, report: &IterationReport<T>);
}

impl<T: Scalar, F: FnMut(&IterationReport<T>)> IterationObserver<T> for F {
    fn observe(&mut self, report: &IterationReport<T>) {
        self(report)
    }
}

/// Logs the functional at `info` level and the parameters at `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl<T: Real> IterationObserver<T> for LogObserver {
    fn observe(&mut self, report: &IterationReport<T>) {
        info!(
            "Gauss-Newton iteration {}: functional = {}",
            report.iteration, report.functional
        );
        for (q, (value, increment)) in report.parameters.iter().zip(report.increment.iter()).enumerate() {
            debug!(
                "  parameter {}: value = {}, increment = {}, alpha = {}",
                q, value, increment, report.alphas[q]
            );
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaussNewtonOutput<T: Scalar> {
    pub parameters: DVector<T>,
    /// The increment of the last iteration, or zero if no iteration was performed.
    pub increment: DVector<T>,
    pub iterations: usize,
    pub functional: T,
    /// The functional of the initial model followed by its value after every iteration.
    pub functional_history: Vec<T>,
}

/// Minimizes the weighted misfit `Σ_k (predicted_k - observed_k)² / observed_k²` by damped
/// Gauss-Newton iterations.
///
/// The first iteration is always attempted unless the initial functional is already below the
/// precision. Afterwards, iteration continues while the functional keeps changing by more than
/// the configured relative amount.
pub fn gauss_newton<T, M>(
    model: &mut M,
    observed: DVectorView<T>,
    settings: &GaussNewtonSettings<T>,
    damping: &mut impl DampingStrategy<T>,
    observer: &mut impl IterationObserver<T>,
) -> Result<GaussNewtonOutput<T>, GaussNewtonError>
where
    T: Real,
    M: ?Sized + LeastSquaresModel<T>,
{
    let m = model.num_measurements();
    let n = model.num_parameters();
    if observed.len() != m {
        return Err(DimensionMismatch {
            expected: m,
            actual: observed.len(),
        }
        .into());
    }

    let weights_squared = squared_weights(observed)?;
    let weights_squared = DVectorView::from(&weights_squared);

    let mut parameters = model.parameters();
    let mut predicted = DVector::zeros(m);
    model
        .predict_into(DVectorViewMut::from(&mut predicted))
        .map_err(GaussNewtonError::Model)?;

    let mut functional = misfit_functional(weights_squared, DVectorView::from(&predicted), observed);
    let mut functional_history = vec![functional];
    let mut previous_functional = None;
    let mut increment = DVector::zeros(n);
    let mut alphas = DVector::zeros(n);

    observer.observe(&IterationReport {
        iteration: 0,
        functional,
        parameters: DVectorView::from(&parameters),
        increment: DVectorView::from(&increment),
        alphas: DVectorView::from(&alphas),
    });

    let mut jacobian = DMatrix::zeros(m, n);
    let mut normal = Equation::zeroed(DMatrix::zeros(n, n));
    let mut iterations = 0;

    while iterations < settings.max_iterations && settings.should_continue(previous_functional, functional) {
        model
            .jacobian_into(DVectorView::from(&predicted), DMatrixViewMut::from(&mut jacobian))
            .map_err(GaussNewtonError::Model)?;
        assemble_normal_equations(
            (&jacobian).into(),
            weights_squared,
            DVectorView::from(&predicted),
            observed,
            &mut normal,
        )?;

        let step = damping.damped_step(&normal, DVectorView::from(&parameters))?;
        parameters += &step.increment;
        model
            .set_parameters(DVectorView::from(&parameters))
            .map_err(GaussNewtonError::Model)?;
        model
            .predict_into(DVectorViewMut::from(&mut predicted))
            .map_err(GaussNewtonError::Model)?;

        previous_functional = Some(functional);
        functional = misfit_functional(weights_squared, DVectorView::from(&predicted), observed);
        functional_history.push(functional);
        increment = step.increment;
        alphas = step.alphas;
        iterations += 1;

        observer.observe(&IterationReport {
            iteration: iterations,
            functional,
            parameters: DVectorView::from(&parameters),
            increment: DVectorView::from(&increment),
            alphas: DVectorView::from(&alphas),
        });
    }

    debug!(
        "Gauss-Newton finished after {} iterations with functional {}",
        iterations, functional
    );

    Ok(GaussNewtonOutput {
        parameters,
        increment,
        iterations,
        functional,
        functional_history,
    })
}
