//! Evaluation of the finite element solution at arbitrary points.
use crate::assembly::bilinear_basis;
use crate::grid::{Grid, Point2D};
use axires_traits::Real;
use itertools::izip;
use nalgebra::{DVector, Scalar, Vector2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod spatially_indexed;

pub use spatially_indexed::ElementLocator;

/// A measuring dipole: the potential difference `u(m) - u(n)` between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Receiver<T> {
    pub m: Point2D<T>,
    pub n: Point2D<T>,
}

impl<T> Receiver<T> {
    pub fn new(m: Point2D<T>, n: Point2D<T>) -> Self {
        Self { m, n }
    }
}

/// Nodal solution of a forward problem together with the grid it lives on.
#[derive(Debug, Clone)]
pub struct FieldSolution<T: Scalar> {
    grid: Arc<Grid<T>>,
    locator: Arc<ElementLocator<T>>,
    weights: DVector<T>,
}

impl<T: Real> FieldSolution<T> {
    /// Panics if the number of weights does not match the number of grid nodes.
    pub fn new(grid: Arc<Grid<T>>, locator: Arc<ElementLocator<T>>, weights: DVector<T>) -> Self {
        assert_eq!(
            grid.nodes().len(),
            weights.len(),
            "Number of weights must match number of grid nodes"
        );
        Self { grid, locator, weights }
    }

    pub fn grid(&self) -> &Arc<Grid<T>> {
        &self.grid
    }

    pub fn nodal_values(&self) -> &DVector<T> {
        &self.weights
    }

    /// Interpolates the solution at a point, returning NaN outside the grid.
    pub fn evaluate(&self, point: &Point2D<T>) -> T {
        match self.locator.locate(&self.grid, point) {
            Some(index) => {
                let element = &self.grid.elements()[index];
                let (lower_left, _) = self.grid.element_corners(index);
                let phi = bilinear_basis(&lower_left, element.length(), element.height(), point);
                izip!(element.nodes(), phi.iter())
                    .fold(T::zero(), |sum, (&node, &phi_i)| sum + self.weights[node] * phi_i)
            }
            None => T::from_subset(&f64::NAN),
        }
    }

    pub fn potential_difference(&self, receiver: &Receiver<T>) -> T {
        self.evaluate(&receiver.m) - self.evaluate(&receiver.n)
    }

    /// Central-difference approximation of `(∂u/∂r, ∂u/∂z)` with step `1e-3`.
    ///
    /// Components whose stencil leaves the grid are NaN.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn gradient(&self, point: &Point2D<T>) -> Vector2<T> {
        let delta = 1e-3;
        let du_dr = self.evaluate(&Point2D::new(point.r + delta, point.z))
            - self.evaluate(&Point2D::new(point.r - delta, point.z));
        let du_dz = self.evaluate(&Point2D::new(point.r, point.z + delta))
            - self.evaluate(&Point2D::new(point.r, point.z - delta));
        Vector2::new(du_dr, du_dz) / (2.0 * delta)
    }

    /// Euclidean norm of the difference between the nodal values and an exact field sampled at
    /// the nodes.
    pub fn l2_error(&self, exact: impl Fn(&Point2D<T>) -> T) -> T {
        self.grid
            .nodes()
            .iter()
            .zip(self.weights.iter())
            .fold(T::zero(), |sum, (node, &u)| {
                let e = u - exact(node);
                sum + e * e
            })
            .sqrt()
    }
}
