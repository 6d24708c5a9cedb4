use crate::assembly::global::LocalVector;
use crate::grid::{Bound, Grid};
use axires_traits::Real;
use eyre::eyre;
use serde::{Deserialize, Serialize};

/// Prescribed values on the two nodes of an element edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition<T> {
    pub element: usize,
    pub bound: Bound,
    /// Values at the two edge nodes, in the order of [`Bound::local_nodes`].
    pub values: [T; 2],
}

impl<T: Real> BoundaryCondition<T> {
    pub fn homogeneous(element: usize, bound: Bound) -> Self {
        Self::with_values(element, bound, [T::zero(); 2])
    }

    pub fn with_values(element: usize, bound: Bound, values: [T; 2]) -> Self {
        Self { element, bound, values }
    }

    /// Global indices of the edge nodes together with their prescribed values.
    pub fn to_local_vector(&self, grid: &Grid<T>) -> eyre::Result<LocalVector<T>> {
        let element = grid.elements().get(self.element).ok_or_else(|| {
            eyre!(
                "boundary condition refers to element {}, but the grid has {} elements",
                self.element,
                grid.elements().len()
            )
        })?;
        LocalVector::new(element.bound_nodes(self.bound).to_vec(), self.values.to_vec())
    }
}

/// Enumerates the edges on which the potential is assumed to vanish: the lower edges of the
/// bottom row of elements and the right edges of the outermost column.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstBoundaryProvider;

impl FirstBoundaryProvider {
    pub fn conditions<T: Real>(grid: &Grid<T>) -> Vec<BoundaryCondition<T>> {
        let nr = grid.elements_along_r();
        let nz = grid.elements_along_z();
        let lower = (0..nr).map(|i| BoundaryCondition::homogeneous(i, Bound::Lower));
        let right = (0..nz).map(|i| BoundaryCondition::homogeneous((i + 1) * nr - 1, Bound::Right));
        lower.chain(right).collect()
    }
}

/// Collects the prescribed `(dof, value)` pairs of the given conditions, sorted by dof.
///
/// Nodes shared by several edges are prescribed once, with the value of the first condition
/// mentioning them.
pub fn prescribed_dofs<T: Real>(grid: &Grid<T>, conditions: &[BoundaryCondition<T>]) -> eyre::Result<Vec<(usize, T)>> {
    let mut prescribed = Vec::with_capacity(2 * conditions.len());
    for condition in conditions {
        let local = condition.to_local_vector(grid)?;
        prescribed.extend(local.iter().map(|(index, &value)| (index, value)));
    }
    // Stable sort keeps the first occurrence of every dof in front
    prescribed.sort_by_key(|&(dof, _)| dof);
    prescribed.dedup_by_key(|&mut (dof, _)| dof);
    Ok(prescribed)
}
