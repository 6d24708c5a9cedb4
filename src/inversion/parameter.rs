use crate::grid::GridLayout;
use axires_traits::Real;
use eyre::eyre;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar unknown of the inverse problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Strength of the source current.
    Current,
    /// Conductivity of the material with the given id.
    Conductivity(usize),
    /// Radial position of the r breakpoint with the given index.
    VerticalBoundary(usize),
    /// Depth of the z breakpoint with the given index.
    HorizontalBoundary(usize),
}

impl Parameter {
    /// Whether changing the parameter changes the grid.
    pub fn is_geometric(&self) -> bool {
        matches!(self, Parameter::VerticalBoundary(_) | Parameter::HorizontalBoundary(_))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Current => write!(f, "current"),
            Parameter::Conductivity(material) => write!(f, "conductivity of material {}", material),
            Parameter::VerticalBoundary(index) => write!(f, "vertical boundary {}", index),
            Parameter::HorizontalBoundary(index) => write!(f, "horizontal boundary {}", index),
        }
    }
}

/// Everything that may be adjusted by the inversion: source strength, conductivities and the
/// geometry of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState<T> {
    pub current: T,
    pub conductivities: Vec<T>,
    pub layout: GridLayout<T>,
}

impl<T: Real> ModelState<T> {
    pub fn new(current: T, conductivities: Vec<T>, layout: GridLayout<T>) -> Self {
        Self {
            current,
            conductivities,
            layout,
        }
    }

    pub fn value(&self, parameter: Parameter) -> eyre::Result<T> {
        let value = match parameter {
            Parameter::Current => Some(self.current),
            Parameter::Conductivity(material) => self.conductivities.get(material).copied(),
            Parameter::VerticalBoundary(index) => self.layout.r_breakpoints().get(index).copied(),
            Parameter::HorizontalBoundary(index) => self.layout.z_breakpoints().get(index).copied(),
        };
        value.ok_or_else(|| eyre!("model has no {}", parameter))
    }

    /// Sets a parameter. Geometric parameters take effect when the layout is next built.
    pub fn set_value(&mut self, parameter: Parameter, value: T) -> eyre::Result<()> {
        match parameter {
            Parameter::Current => self.current = value,
            Parameter::Conductivity(material) => {
                let sigma = self
                    .conductivities
                    .get_mut(material)
                    .ok_or_else(|| eyre!("model has no {}", parameter))?;
                *sigma = value;
            }
            Parameter::VerticalBoundary(index) => self.layout.set_r_breakpoint(index, value)?,
            Parameter::HorizontalBoundary(index) => self.layout.set_z_breakpoint(index, value)?,
        }
        Ok(())
    }
}
