use crate::assembly::local::element_stiffness;
use crate::grid::Grid;
use axires_sparse::{SparseError, SymmetricPattern, SymmetricSparseMatrix};
use axires_traits::{Equation, Real};
use eyre::eyre;
use nalgebra::{DVectorViewMut, Matrix4};
use std::sync::Arc;

/// Global node indices paired with values, e.g. an element load or prescribed nodal values.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVector<T> {
    pub indices: Vec<usize>,
    pub values: Vec<T>,
}

impl<T> LocalVector<T> {
    pub fn new(indices: Vec<usize>, values: Vec<T>) -> eyre::Result<Self> {
        if indices.len() != values.len() {
            return Err(eyre!(
                "local vector has {} indices but {} values",
                indices.len(),
                values.len()
            ));
        }
        Ok(Self { indices, values })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.indices.iter().copied().zip(self.values.iter())
    }
}

/// Builds the sparse portrait of the global matrix of a grid.
pub fn assemble_portrait<T: Real>(grid: &Grid<T>) -> eyre::Result<Arc<SymmetricPattern>> {
    Ok(Arc::new(SymmetricPattern::from_connectivity(grid)?))
}

/// Adds a local element matrix into the global matrix.
///
/// Only the lower triangle of the (symmetric) local matrix is read.
pub fn insert_element_matrix<T: Real>(
    matrix: &mut SymmetricSparseMatrix<T>,
    nodes: &[usize; 4],
    local: &Matrix4<T>,
) -> Result<(), SparseError> {
    for i in 0..4 {
        for j in 0..=i {
            matrix.add(nodes[i], nodes[j], local[(i, j)])?;
        }
    }
    Ok(())
}

/// Adds a local vector into a global vector.
pub fn insert_element_vector<T: Real>(mut global: DVectorViewMut<T>, local: &LocalVector<T>) -> Result<(), SparseError> {
    let dim = global.len();
    for (index, &value) in local.iter() {
        if index >= dim {
            return Err(SparseError::IndexOutOfBounds { index, dim });
        }
        global[index] += value;
    }
    Ok(())
}

/// Overwrites `matrix` with the global stiffness matrix of the grid.
///
/// The matrix must have been created from the portrait of the same grid.
pub fn assemble_matrix_into<T: Real>(
    matrix: &mut SymmetricSparseMatrix<T>,
    grid: &Grid<T>,
    conductivities: &[T],
) -> eyre::Result<()> {
    if matrix.dim() != grid.nodes().len() {
        return Err(SparseError::DimensionMismatch {
            expected: grid.nodes().len(),
            actual: matrix.dim(),
        }
        .into());
    }
    matrix.fill_zero();
    for (index, element) in grid.elements().iter().enumerate() {
        let local = element_stiffness(grid, index, conductivities)?;
        insert_element_matrix(matrix, element.nodes(), &local)?;
    }
    Ok(())
}

/// Prescribes the solution at the given dofs by Gauss exclusion.
///
/// For every `(dof, value)` the row and column of `dof` are eliminated from the system, their
/// contributions moved to the right-hand side, and the diagonal entry set to one with the
/// right-hand side equal to `value`. The matrix stays symmetric, and positive definite if it was
/// before. Dofs are processed in the given order.
pub fn apply_dirichlet_bc<T: Real>(
    equation: &mut Equation<SymmetricSparseMatrix<T>, T>,
    prescribed: &[(usize, T)],
) -> Result<(), SparseError> {
    let (matrix, _, mut rhs) = equation.parts_mut();
    let pattern = Arc::clone(matrix.pattern());
    let dim = pattern.dim();
    let offsets = pattern.row_offsets();
    let columns = pattern.column_indices();

    for &(dof, value) in prescribed {
        if dof >= dim {
            return Err(SparseError::IndexOutOfBounds { index: dof, dim });
        }

        let (diagonal, values) = matrix.diagonal_and_values_mut();
        for offset in offsets[dof]..offsets[dof + 1] {
            let k = columns[offset];
            rhs[k] -= values[offset] * value;
            values[offset] = T::zero();
        }
        diagonal[dof] = T::one();
        rhs[dof] = value;

        for &row in pattern.column_rows(dof) {
            let offset = pattern
                .find_offset(row, dof)
                .ok_or(SparseError::EntryOutsidePattern { row, col: dof })?;
            rhs[row] -= values[offset] * value;
            values[offset] = T::zero();
        }
    }
    Ok(())
}
