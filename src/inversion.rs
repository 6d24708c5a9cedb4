//! Recovery of model parameters from measured potential differences by damped Gauss-Newton
//! iterations on top of the forward solver.
use crate::assembly::ElectrodeLoad;
use axires_optimize::damping::DampingStrategy;
use axires_optimize::gauss_newton::{
    gauss_newton, GaussNewtonOutput, GaussNewtonSettings, IterationObserver, LeastSquaresModel, ModelError,
};
use axires_sparse::cg::CgSettings;
use axires_traits::Real;
use eyre::{ensure, eyre};
use nalgebra::{DMatrixViewMut, DVector, DVectorView, DVectorViewMut};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

mod jacobian;
mod parameter;
mod survey;

pub use jacobian::{JacobianAssembler, SolverInstance};
pub use parameter::{ModelState, Parameter};
pub use survey::{SurfacePoint, SurfaceReceiver, Survey};

/// Settings of the forward solves performed during an inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardOptions<T> {
    pub electrode_load: ElectrodeLoad,
    pub cg: CgSettings<T>,
}

impl<T: Real> Default for ForwardOptions<T> {
    fn default() -> Self {
        Self {
            electrode_load: ElectrodeLoad::default(),
            cg: CgSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JacobianSettings<T> {
    /// Finite-difference step relative to the magnitude of the perturbed parameter.
    pub relative_step: T,
    /// Upper bound on the number of forward solves running concurrently.
    pub max_concurrency: usize,
}

impl<T: Real> Default for JacobianSettings<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn default() -> Self {
        Self {
            relative_step: 0.05,
            max_concurrency: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl<T> JacobianSettings<T> {
    /// Number of solver instances used for a problem with the given number of parameters.
    pub fn pool_size(&self, num_parameters: usize) -> usize {
        self.max_concurrency.min(num_parameters).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InversionSettings<T> {
    pub forward: ForwardOptions<T>,
    pub gauss_newton: GaussNewtonSettings<T>,
    pub jacobian: JacobianSettings<T>,
}

impl<T: Real> Default for InversionSettings<T> {
    fn default() -> Self {
        Self {
            forward: ForwardOptions::default(),
            gauss_newton: GaussNewtonSettings::default(),
            jacobian: JacobianSettings::default(),
        }
    }
}

/// Computes the potential differences a survey would measure for the given model.
pub fn predict_measurements<T: Real>(
    state: &ModelState<T>,
    survey: &Survey<T>,
    options: ForwardOptions<T>,
) -> eyre::Result<DVector<T>> {
    let mut instance = SolverInstance::new(state.clone(), Arc::new(survey.clone()), options)?;
    let mut predicted = DVector::zeros(survey.num_measurements());
    instance.predict_into(DVectorViewMut::from(&mut predicted))?;
    Ok(predicted)
}

/// The least-squares problem of fitting selected model parameters to measurements.
///
/// The canonical model and every replica in the Jacobian pool are kept in sync: accepted
/// parameter updates are applied to all of them.
#[derive(Debug)]
pub struct Inversion<T: Real> {
    parameters: Vec<Parameter>,
    values: DVector<T>,
    state: ModelState<T>,
    survey: Arc<Survey<T>>,
    settings: InversionSettings<T>,
    jacobian: JacobianAssembler<T>,
}

impl<T: Real> Inversion<T> {
    pub fn new(
        state: ModelState<T>,
        survey: Survey<T>,
        parameters: Vec<Parameter>,
        settings: InversionSettings<T>,
    ) -> eyre::Result<Self> {
        ensure!(!parameters.is_empty(), "at least one parameter must be inverted for");
        ensure!(survey.num_measurements() > 0, "survey has no receivers");
        for (q, parameter) in parameters.iter().enumerate() {
            ensure!(
                !parameters[..q].contains(parameter),
                "{} is listed more than once",
                parameter
            );
        }
        let values = parameters
            .iter()
            .map(|&parameter| state.value(parameter))
            .collect::<eyre::Result<Vec<_>>>()?;

        let survey = Arc::new(survey);
        let jacobian = JacobianAssembler::new(
            &state,
            Arc::clone(&survey),
            settings.forward,
            settings.jacobian,
            parameters.len(),
        )?;
        Ok(Self {
            values: DVector::from_vec(values),
            parameters,
            state,
            survey,
            settings,
            jacobian,
        })
    }

    /// The parameters being inverted for, in the order of the parameter vector.
    pub fn unknowns(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn state(&self) -> &ModelState<T> {
        &self.state
    }

    pub fn survey(&self) -> &Survey<T> {
        &self.survey
    }

    pub fn settings(&self) -> &InversionSettings<T> {
        &self.settings
    }

    pub fn jacobian_assembler(&self) -> &JacobianAssembler<T> {
        &self.jacobian
    }

    fn update(&mut self, values: DVectorView<T>) -> eyre::Result<()> {
        ensure!(
            values.len() == self.parameters.len(),
            "expected {} parameter values, got {}",
            self.parameters.len(),
            values.len()
        );
        for (&parameter, &value) in self.parameters.iter().zip(values.iter()) {
            self.state.set_value(parameter, value)?;
            for instance in self.jacobian.instances_mut() {
                instance.state_mut().set_value(parameter, value)?;
            }
        }
        self.values.copy_from(&values);
        Ok(())
    }

    /// Runs Gauss-Newton iterations from the current model and leaves the model at the final
    /// parameters.
    pub fn run(
        &mut self,
        observed: DVectorView<T>,
        damping: &mut impl DampingStrategy<T>,
        observer: &mut impl IterationObserver<T>,
    ) -> eyre::Result<GaussNewtonOutput<T>> {
        let settings = self.settings.gauss_newton;
        Ok(gauss_newton(self, observed, &settings, damping, observer)?)
    }
}

impl<T: Real> LeastSquaresModel<T> for Inversion<T> {
    fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    fn num_measurements(&self) -> usize {
        self.survey.num_measurements()
    }

    fn parameters(&self) -> DVector<T> {
        self.values.clone()
    }

    fn set_parameters(&mut self, parameters: DVectorView<T>) -> Result<(), ModelError> {
        Ok(self.update(parameters)?)
    }

    fn predict_into(&mut self, predicted: DVectorViewMut<T>) -> Result<(), ModelError> {
        let instance = self
            .jacobian
            .instances_mut()
            .first_mut()
            .ok_or_else(|| eyre!("no solver instances available"))?;
        Ok(instance.predict_into(predicted)?)
    }

    fn jacobian_into(&mut self, predicted: DVectorView<T>, jacobian: DMatrixViewMut<T>) -> Result<(), ModelError> {
        let baseline = predicted.clone_owned();
        Ok(self.jacobian.assemble(&self.parameters, &baseline, jacobian)?)
    }
}
