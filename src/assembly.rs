//! Assembly of the axisymmetric forward problem: element matrices, the global system, boundary
//! conditions and electrode loads.
pub mod boundary;
pub mod global;
pub mod local;
pub mod source;

pub use boundary::*;
pub use global::*;
pub use local::*;
pub use source::*;
