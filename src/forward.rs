//! The forward problem: potential of a current source in an axisymmetric conductor.
use crate::assembly::{
    apply_dirichlet_bc, apply_source, assemble_matrix_into, assemble_portrait, prescribed_dofs, BoundaryCondition,
    ElectrodeLoad, FirstBoundaryProvider, Source,
};
use crate::field::{ElementLocator, FieldSolution};
use crate::grid::Grid;
use axires_sparse::cg::{CgOutput, CgSettings, PcgSolver};
use axires_sparse::SymmetricSparseMatrix;
use axires_traits::{Equation, Real};
use eyre::ensure;
use log::debug;
use nalgebra::Scalar;
use std::sync::Arc;

/// Complete description of a forward problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardConfig<T: Scalar> {
    pub grid: Arc<Grid<T>>,
    /// Conductivity of every material, indexed by material id.
    pub conductivities: Vec<T>,
    pub source: Source<T>,
    pub boundary_conditions: Vec<BoundaryCondition<T>>,
    pub electrode_load: ElectrodeLoad,
    pub cg: CgSettings<T>,
}

impl<T: Real> ForwardConfig<T> {
    /// Creates a configuration with the potential vanishing on the outer boundary of the grid.
    pub fn new(grid: Arc<Grid<T>>, conductivities: Vec<T>, source: Source<T>) -> Self {
        let boundary_conditions = FirstBoundaryProvider::conditions(&grid);
        Self {
            grid,
            conductivities,
            source,
            boundary_conditions,
            electrode_load: ElectrodeLoad::default(),
            cg: CgSettings::default(),
        }
    }

    pub fn with_boundary_conditions(self, boundary_conditions: Vec<BoundaryCondition<T>>) -> Self {
        Self {
            boundary_conditions,
            ..self
        }
    }

    pub fn with_electrode_load(self, electrode_load: ElectrodeLoad) -> Self {
        Self { electrode_load, ..self }
    }

    pub fn with_cg_settings(self, cg: CgSettings<T>) -> Self {
        Self { cg, ..self }
    }

    fn validate(&self) -> eyre::Result<()> {
        let num_materials = self.grid.num_materials();
        ensure!(
            self.conductivities.len() >= num_materials,
            "grid uses {} materials, but only {} conductivities are given",
            num_materials,
            self.conductivities.len()
        );
        for (material, sigma) in self.conductivities.iter().enumerate() {
            ensure!(
                sigma.is_finite() && *sigma > T::zero(),
                "conductivity of material {} must be positive, got {}",
                material,
                sigma
            );
        }
        ensure!(self.source.current.is_finite(), "source current must be finite");
        Ok(())
    }
}

/// Assembles and solves forward problems, reusing the sparse portrait and all buffers for as
/// long as the grid does not change.
#[derive(Debug)]
pub struct ForwardSolver<T: Real> {
    config: ForwardConfig<T>,
    locator: Arc<ElementLocator<T>>,
    prescribed: Vec<(usize, T)>,
    equation: Equation<SymmetricSparseMatrix<T>, T>,
    pcg: PcgSolver<T>,
    last_output: Option<CgOutput<T>>,
}

impl<T: Real> ForwardSolver<T> {
    pub fn new(config: ForwardConfig<T>) -> eyre::Result<Self> {
        config.validate()?;
        let pattern = assemble_portrait(&config.grid)?;
        debug!(
            "Built sparse portrait for {} nodes with {} off-diagonal entries",
            pattern.dim(),
            pattern.nnz_lower()
        );
        Ok(Self {
            locator: Arc::new(ElementLocator::new(&config.grid)),
            prescribed: prescribed_dofs(&config.grid, &config.boundary_conditions)?,
            equation: Equation::zeroed(SymmetricSparseMatrix::zeros(pattern)),
            pcg: PcgSolver::new(config.cg),
            last_output: None,
            config,
        })
    }

    /// Replaces the configuration.
    ///
    /// The portrait, matrix and preconditioner storage and the point locator are kept if the new
    /// grid equals the current one, and rebuilt otherwise.
    pub fn reconfigure(mut self, config: ForwardConfig<T>) -> eyre::Result<Self> {
        self.apply_config(config)?;
        Ok(self)
    }

    /// In-place variant of [`reconfigure`](Self::reconfigure). On error, the solver is unchanged.
    pub(crate) fn apply_config(&mut self, config: ForwardConfig<T>) -> eyre::Result<()> {
        config.validate()?;
        let prescribed = prescribed_dofs(&config.grid, &config.boundary_conditions)?;
        let same_grid = Arc::ptr_eq(&self.config.grid, &config.grid) || self.config.grid == config.grid;
        if !same_grid {
            let pattern = assemble_portrait(&config.grid)?;
            debug!(
                "Grid changed, rebuilt sparse portrait for {} nodes with {} off-diagonal entries",
                pattern.dim(),
                pattern.nnz_lower()
            );
            self.locator = Arc::new(ElementLocator::new(&config.grid));
            self.equation = Equation::zeroed(SymmetricSparseMatrix::zeros(pattern));
        }
        self.prescribed = prescribed;
        self.pcg.set_settings(config.cg);
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &ForwardConfig<T> {
        &self.config
    }

    pub fn grid(&self) -> &Arc<Grid<T>> {
        &self.config.grid
    }

    /// The system of the last solve, after boundary conditions were applied.
    pub fn equation(&self) -> &Equation<SymmetricSparseMatrix<T>, T> {
        &self.equation
    }

    /// Convergence information of the last conjugate gradient solve.
    pub fn last_output(&self) -> Option<&CgOutput<T>> {
        self.last_output.as_ref()
    }

    /// Assembles the system for the current configuration and solves it, starting from a zero
    /// initial guess.
    ///
    /// Reaching the iteration limit of the conjugate gradient solver is not an error; see
    /// [`last_output`](Self::last_output).
    pub fn solve(&mut self) -> eyre::Result<FieldSolution<T>> {
        let grid = &self.config.grid;
        assemble_matrix_into(self.equation.matrix_mut(), grid, &self.config.conductivities)?;
        {
            let (_, mut solution, mut rhs) = self.equation.parts_mut();
            solution.fill(T::zero());
            rhs.fill(T::zero());
            apply_source(rhs, grid, &self.config.source, self.config.electrode_load)?;
        }
        apply_dirichlet_bc(&mut self.equation, &self.prescribed)?;

        let output = self.pcg.solve(&mut self.equation)?;
        self.last_output = Some(output);

        Ok(FieldSolution::new(
            Arc::clone(grid),
            Arc::clone(&self.locator),
            self.equation.solution().clone(),
        ))
    }
}
