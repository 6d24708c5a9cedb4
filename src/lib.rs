//! Finite element forward modelling and Gauss-Newton inversion of direct-current resistivity
//! surveys in axisymmetric media.
pub mod assembly;
pub mod field;
pub mod forward;
pub mod grid;
pub mod inversion;

pub mod sparse {
    pub use axires_sparse::*;
}

pub mod optimize {
    pub use axires_optimize::*;
}

pub use axires_traits::{DimensionMismatch, Equation, Real, SystemMatrix};

pub extern crate nalgebra;
