//! Sparse linear algebra for symmetric finite element systems.
//!
//! Only the strictly lower triangle of a symmetric matrix is stored, together with a dense
//! diagonal. The sparsity pattern is shared between matrices through an `Arc`, so that a
//! preconditioner or a scratch copy of the system matrix can reuse it without reallocation.

/// Conjugate gradient with pluggable operators, preconditioners and stopping criteria
pub mod cg;
/// Incomplete Cholesky factorization and triangular solves
pub mod cholesky;
mod error;
/// Symmetric sparsity patterns built from element connectivity
pub mod pattern;
/// Symmetric sparse matrix storage
pub mod symmetric;

pub use error::SparseError;
pub use pattern::{ElementConnectivity, SymmetricPattern};
pub use symmetric::SymmetricSparseMatrix;
