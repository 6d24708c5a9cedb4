use axires_sparse::{ElementConnectivity, SymmetricPattern, SymmetricSparseMatrix};
use std::sync::Arc;

mod cholesky;
mod pattern;

/// Connectivity of a structured grid of `nx` by `ny` bilinear quadrilaterals.
pub struct QuadGrid {
    nx: usize,
    ny: usize,
}

impl QuadGrid {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    pub fn element_nodes(&self, element_index: usize) -> [usize; 4] {
        let (ix, iy) = (element_index % self.nx, element_index / self.nx);
        let node = |ix: usize, iy: usize| iy * (self.nx + 1) + ix;
        [node(ix, iy), node(ix + 1, iy), node(ix, iy + 1), node(ix + 1, iy + 1)]
    }
}

impl ElementConnectivity for QuadGrid {
    fn num_nodes(&self) -> usize {
        (self.nx + 1) * (self.ny + 1)
    }

    fn num_elements(&self) -> usize {
        self.nx * self.ny
    }

    fn element_node_count(&self, _element_index: usize) -> usize {
        4
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.element_nodes(element_index));
    }
}

/// Assembles a symmetric positive definite M-matrix on the grid: a graph Laplacian of the element
/// couplings plus a unit shift of the diagonal.
pub fn shifted_laplacian(grid: &QuadGrid) -> SymmetricSparseMatrix<f64> {
    let pattern = Arc::new(SymmetricPattern::from_connectivity(grid).unwrap());
    let mut matrix = SymmetricSparseMatrix::zeros(pattern);
    for e in 0..grid.num_elements() {
        let nodes = grid.element_nodes(e);
        for (i, &node_i) in nodes.iter().enumerate() {
            matrix.add(node_i, node_i, 3.0).unwrap();
            for &node_j in &nodes[..i] {
                matrix.add(node_i, node_j, -1.0).unwrap();
            }
        }
    }
    for d in matrix.diagonal_mut() {
        *d += 1.0;
    }
    matrix
}
