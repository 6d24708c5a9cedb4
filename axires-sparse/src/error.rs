use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SparseError {
    /// The entry `(row, col)` is not part of the sparsity pattern.
    EntryOutsidePattern { row: usize, col: usize },
    /// An element references a node that does not exist.
    NodeOutOfBounds { element: usize, node: usize, num_nodes: usize },
    /// A row or column index exceeds the dimension of the matrix.
    IndexOutOfBounds { index: usize, dim: usize },
    DimensionMismatch { expected: usize, actual: usize },
    /// Two matrices were expected to share the same sparsity pattern.
    PatternMismatch,
    InvalidPattern(String),
    /// The incomplete factorization encountered a pivot that is not strictly positive.
    NonPositivePivot { row: usize },
}

impl fmt::Display for SparseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryOutsidePattern { row, col } => {
                write!(f, "entry ({}, {}) is outside the sparsity pattern", row, col)
            }
            Self::NodeOutOfBounds {
                element,
                node,
                num_nodes,
            } => write!(
                f,
                "element {} references node {}, but there are only {} nodes",
                element, node, num_nodes
            ),
            Self::IndexOutOfBounds { index, dim } => {
                write!(f, "index {} is out of bounds for dimension {}", index, dim)
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, actual)
            }
            Self::PatternMismatch => write!(f, "matrices do not share the same sparsity pattern"),
            Self::InvalidPattern(reason) => write!(f, "invalid sparsity pattern: {}", reason),
            Self::NonPositivePivot { row } => {
                write!(f, "incomplete Cholesky factorization broke down at row {}", row)
            }
        }
    }
}

impl Error for SparseError {}
