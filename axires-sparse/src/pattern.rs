use crate::SparseError;
use nalgebra_sparse::pattern::SparsityPattern;
use std::collections::BTreeSet;

/// Connectivity between elements and the global nodes they touch.
pub trait ElementConnectivity {
    fn num_nodes(&self) -> usize;

    fn num_elements(&self) -> usize;

    fn element_node_count(&self, element_index: usize) -> usize;

    /// Writes the global node indices of the element into `output`.
    ///
    /// The length of `output` equals [`element_node_count`](Self::element_node_count).
    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize);
}

/// Sparsity pattern of a symmetric matrix.
///
/// Only the strictly lower triangle is stored: row `i` lists, in ascending order, the columns
/// `j < i` such that `(i, j)` is structurally non-zero. The transposed pattern is kept alongside
/// so that the rows `r > j` storing column `j` can be enumerated without a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricPattern {
    lower: SparsityPattern,
    upper: SparsityPattern,
}

impl SymmetricPattern {
    /// Builds the pattern coupling every pair of distinct nodes that share an element.
    pub fn from_connectivity(connectivity: &dyn ElementConnectivity) -> Result<Self, SparseError> {
        let num_nodes = connectivity.num_nodes();
        let mut rows = vec![BTreeSet::new(); num_nodes];
        let mut element_nodes = Vec::new();

        for element_index in 0..connectivity.num_elements() {
            element_nodes.resize(connectivity.element_node_count(element_index), usize::MAX);
            connectivity.populate_element_nodes(&mut element_nodes, element_index);

            for &node in &element_nodes {
                if node >= num_nodes {
                    return Err(SparseError::NodeOutOfBounds {
                        element: element_index,
                        node,
                        num_nodes,
                    });
                }
            }

            for &node_i in &element_nodes {
                for &node_j in &element_nodes {
                    if node_i > node_j {
                        rows[node_i].insert(node_j);
                    }
                }
            }
        }

        let mut offsets = Vec::with_capacity(num_nodes + 1);
        let mut column_indices = Vec::new();
        offsets.push(0);
        for row in rows {
            column_indices.extend(row);
            offsets.push(column_indices.len());
        }

        let lower = SparsityPattern::try_from_offsets_and_indices(num_nodes, num_nodes, offsets, column_indices)
            .map_err(|err| SparseError::InvalidPattern(err.to_string()))?;
        Self::from_lower_triangle(lower)
    }

    /// Wraps an existing pattern, which must be square and strictly lower triangular.
    pub fn from_lower_triangle(lower: SparsityPattern) -> Result<Self, SparseError> {
        if lower.major_dim() != lower.minor_dim() {
            return Err(SparseError::InvalidPattern(format!(
                "pattern must be square, but has dimensions {}x{}",
                lower.major_dim(),
                lower.minor_dim()
            )));
        }
        for row in 0..lower.major_dim() {
            if let Some(&col) = lower.lane(row).last() {
                if col >= row {
                    return Err(SparseError::InvalidPattern(format!(
                        "entry ({}, {}) is not strictly below the diagonal",
                        row, col
                    )));
                }
            }
        }
        let upper = lower.transpose();
        Ok(Self { lower, upper })
    }

    pub fn dim(&self) -> usize {
        self.lower.major_dim()
    }

    /// Number of stored off-diagonal entries, i.e. entries of the strictly lower triangle.
    pub fn nnz_lower(&self) -> usize {
        self.lower.nnz()
    }

    pub fn row_offsets(&self) -> &[usize] {
        self.lower.major_offsets()
    }

    pub fn column_indices(&self) -> &[usize] {
        self.lower.minor_indices()
    }

    /// Columns `j < row` stored in the given row, in ascending order.
    pub fn row_columns(&self, row: usize) -> &[usize] {
        self.lower.lane(row)
    }

    /// Rows `r > col` that store an entry in the given column, in ascending order.
    pub fn column_rows(&self, col: usize) -> &[usize] {
        self.upper.lane(col)
    }

    /// Position of the entry `(row, col)`, `row > col`, in the value array of a matrix.
    pub fn find_offset(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.dim() {
            return None;
        }
        let offset = self.row_offsets()[row];
        self.row_columns(row)
            .binary_search(&col)
            .ok()
            .map(|local_index| offset + local_index)
    }

    /// Structural test for the full symmetric matrix, including the diagonal.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let dim = self.dim();
        if row >= dim || col >= dim {
            false
        } else if row == col {
            true
        } else {
            self.find_offset(row.max(col), row.min(col)).is_some()
        }
    }

    pub fn lower_triangle(&self) -> &SparsityPattern {
        &self.lower
    }
}
