use crate::assembly::FirstBoundaryProvider;
use crate::field::FieldSolution;
use crate::forward::{ForwardConfig, ForwardSolver};
use crate::grid::{Grid, GridLayout};
use crate::inversion::{ForwardOptions, JacobianSettings, ModelState, Parameter, Survey};
use axires_traits::Real;
use crossbeam::channel;
use eyre::{ensure, eyre};
use nalgebra::{DMatrixViewMut, DVector, DVectorViewMut};
use std::sync::Arc;
use std::thread;

/// A forward solver together with the model replica it solves for.
#[derive(Debug)]
pub struct SolverInstance<T: Real> {
    solver: ForwardSolver<T>,
    state: ModelState<T>,
    built_layout: GridLayout<T>,
    survey: Arc<Survey<T>>,
    options: ForwardOptions<T>,
}

fn forward_config<T: Real>(
    state: &ModelState<T>,
    grid: Arc<Grid<T>>,
    survey: &Survey<T>,
    options: &ForwardOptions<T>,
) -> ForwardConfig<T> {
    let source = survey.source(state.current);
    let boundary_conditions = FirstBoundaryProvider::conditions(&grid);
    ForwardConfig::new(grid, state.conductivities.clone(), source)
        .with_boundary_conditions(boundary_conditions)
        .with_electrode_load(options.electrode_load)
        .with_cg_settings(options.cg)
}

impl<T: Real> SolverInstance<T> {
    pub fn new(state: ModelState<T>, survey: Arc<Survey<T>>, options: ForwardOptions<T>) -> eyre::Result<Self> {
        let grid = Arc::new(state.layout.build()?);
        let solver = ForwardSolver::new(forward_config(&state, grid, &survey, &options))?;
        Ok(Self {
            solver,
            built_layout: state.layout.clone(),
            state,
            survey,
            options,
        })
    }

    pub fn state(&self) -> &ModelState<T> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ModelState<T> {
        &mut self.state
    }

    pub fn solver(&self) -> &ForwardSolver<T> {
        &self.solver
    }

    /// Brings the forward solver up to date with the model replica. The grid is only rebuilt if
    /// the layout changed since it was last built.
    fn sync(&mut self) -> eyre::Result<()> {
        let grid = if self.state.layout != self.built_layout {
            let grid = Arc::new(self.state.layout.build()?);
            self.built_layout = self.state.layout.clone();
            grid
        } else {
            Arc::clone(self.solver.grid())
        };
        let config = forward_config(&self.state, grid, &self.survey, &self.options);
        self.solver.apply_config(config)
    }

    /// Solves the forward problem for the current model replica.
    pub fn solve(&mut self) -> eyre::Result<FieldSolution<T>> {
        self.sync()?;
        self.solver.solve()
    }

    /// Computes every measurement of the survey for the current model replica.
    pub fn predict_into(&mut self, mut predicted: DVectorViewMut<T>) -> eyre::Result<()> {
        let num_measurements = self.survey.num_measurements();
        ensure!(
            predicted.len() == num_measurements,
            "prediction buffer has length {}, but the survey has {} receivers",
            predicted.len(),
            num_measurements
        );
        let field = self.solve()?;
        for k in 0..num_measurements {
            predicted[k] = self.survey.measure(&field, k);
        }
        Ok(())
    }

    /// Forward-difference derivative of the predictions with respect to one parameter.
    ///
    /// The parameter is perturbed by `relative_step · |value|` (or `relative_step` if the value is
    /// zero) and restored afterwards, also when solving fails.
    pub fn sensitivity(
        &mut self,
        parameter: Parameter,
        baseline: &DVector<T>,
        relative_step: T,
    ) -> eyre::Result<DVector<T>> {
        let value = self.state.value(parameter)?;
        let step = if value == T::zero() {
            relative_step
        } else {
            relative_step * value.abs()
        };

        self.state.set_value(parameter, value + step)?;
        let mut perturbed = DVector::zeros(baseline.len());
        let result = self.predict_into(DVectorViewMut::from(&mut perturbed));
        self.state.set_value(parameter, value)?;
        result?;

        Ok((perturbed - baseline) / step)
    }
}

/// Computes finite-difference Jacobians on a fixed pool of solver instances.
#[derive(Debug)]
pub struct JacobianAssembler<T: Real> {
    instances: Vec<SolverInstance<T>>,
    settings: JacobianSettings<T>,
}

impl<T: Real> JacobianAssembler<T> {
    /// Creates `settings.pool_size(num_parameters)` instances, each with its own copy of `state`.
    pub fn new(
        state: &ModelState<T>,
        survey: Arc<Survey<T>>,
        options: ForwardOptions<T>,
        settings: JacobianSettings<T>,
        num_parameters: usize,
    ) -> eyre::Result<Self> {
        let instances = (0..settings.pool_size(num_parameters))
            .map(|_| SolverInstance::new(state.clone(), Arc::clone(&survey), options))
            .collect::<eyre::Result<Vec<_>>>()?;
        Ok(Self { instances, settings })
    }

    pub fn settings(&self) -> &JacobianSettings<T> {
        &self.settings
    }

    pub fn instances(&self) -> &[SolverInstance<T>] {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut [SolverInstance<T>] {
        &mut self.instances
    }

    /// Fills column `q` of the Jacobian with the sensitivities of the predictions to
    /// `parameters[q]`, given the predictions `baseline` at the current model.
    ///
    /// Every column is computed by exactly one instance, which is checked out of the pool for the
    /// whole perturb-solve-restore cycle. When all instances are busy, dispatching the next
    /// parameter blocks until one is checked back in.
    pub fn assemble(
        &mut self,
        parameters: &[Parameter],
        baseline: &DVector<T>,
        mut jacobian: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        ensure!(
            jacobian.shape() == (baseline.len(), parameters.len()),
            "Jacobian of shape {:?} cannot hold {} measurements and {} parameters",
            jacobian.shape(),
            baseline.len(),
            parameters.len()
        );
        ensure!(!self.instances.is_empty(), "no solver instances available");

        let relative_step = self.settings.relative_step;
        let (instance_sender, instance_receiver) = channel::bounded(self.instances.len());
        for instance in self.instances.iter_mut() {
            instance_sender
                .send(instance)
                .map_err(|_| eyre!("solver instance pool disconnected"))?;
        }

        let (result_sender, result_receiver) = channel::unbounded();
        thread::scope(|scope| -> eyre::Result<()> {
            for (q, &parameter) in parameters.iter().enumerate() {
                let instance: &mut SolverInstance<T> = instance_receiver
                    .recv()
                    .map_err(|_| eyre!("solver instance pool disconnected"))?;
                let instance_sender = instance_sender.clone();
                let result_sender = result_sender.clone();
                scope.spawn(move || {
                    let column = instance
                        .sensitivity(parameter, baseline, relative_step)
                        .map_err(|err| err.wrap_err(format!("failed to compute sensitivity to {}", parameter)));
                    // The receivers outlive the scope, so sending cannot fail
                    let _ = result_sender.send((q, column));
                    let _ = instance_sender.send(instance);
                });
            }
            Ok(())
        })?;
        drop(result_sender);

        for (q, column) in result_receiver.iter() {
            jacobian.column_mut(q).copy_from(&column?);
        }
        Ok(())
    }
}
