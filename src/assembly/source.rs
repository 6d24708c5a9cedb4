use crate::assembly::global::{insert_element_vector, LocalVector};
use crate::assembly::local::bilinear_basis;
use crate::grid::{Bound, Grid, Point2D};
use axires_traits::Real;
use eyre::{ensure, eyre};
use nalgebra::{DVectorViewMut, Matrix2, Vector2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Absolute tolerance used when locating the element containing an electrode.
pub const ELECTRODE_LOCATION_TOLERANCE: f64 = 1e-13;

/// A current injected at the positive electrode and, if present, withdrawn at the negative one.
///
/// Without a negative electrode the source is a pole whose return electrode is at infinity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Source<T> {
    pub positive: Point2D<T>,
    pub negative: Option<Point2D<T>>,
    pub current: T,
}

impl<T> Source<T> {
    pub fn pole(positive: Point2D<T>, current: T) -> Self {
        Self {
            positive,
            negative: None,
            current,
        }
    }

    pub fn dipole(positive: Point2D<T>, negative: Point2D<T>, current: T) -> Self {
        Self {
            positive,
            negative: Some(negative),
            current,
        }
    }
}

/// How the current of an electrode is turned into nodal loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElectrodeLoad {
    /// `±I/(2π) φ_i(electrode)` on the nodes of the element containing the electrode.
    #[default]
    Point,
    /// A flux `±I/(2π r)` through the vertical element edge nearest to the electrode, distributed
    /// by the consistent edge mass matrix.
    EdgeFlux,
}

fn locate_electrode<T: Real>(grid: &Grid<T>, electrode: &Point2D<T>) -> eyre::Result<usize> {
    let delta = T::from_f64(ELECTRODE_LOCATION_TOLERANCE).expect("Literal must fit in T");
    grid.find_element(electrode, delta).ok_or_else(|| {
        eyre!(
            "electrode at ({}, {}) is not contained in any element",
            electrode.r,
            electrode.z
        )
    })
}

/// Nodal loads of a single electrode injecting `current`, which is negative for a sink.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn electrode_load<T: Real>(
    grid: &Grid<T>,
    electrode: &Point2D<T>,
    current: T,
    load: ElectrodeLoad,
) -> eyre::Result<LocalVector<T>> {
    let element_index = locate_electrode(grid, electrode)?;
    let element = &grid.elements()[element_index];
    let (lower_left, _) = grid.element_corners(element_index);
    let scale = current / T::two_pi();

    match load {
        ElectrodeLoad::Point => {
            let phi = bilinear_basis(&lower_left, element.length(), element.height(), electrode);
            LocalVector::new(element.nodes().to_vec(), (phi * scale).iter().copied().collect())
        }
        ElectrodeLoad::EdgeFlux => {
            let to_left = electrode.r - lower_left.r;
            let to_right = lower_left.r + element.length() - electrode.r;
            let bound = if to_left <= to_right { Bound::Left } else { Bound::Right };
            let nodes = element.bound_nodes(bound);
            let r_edge = grid.nodes()[nodes[0]].r;
            ensure!(
                r_edge > T::zero(),
                "edge-flux load of electrode at ({}, {}) requires an edge off the symmetry axis",
                electrode.r,
                electrode.z
            );
            let theta = Vector2::repeat(scale / r_edge);
            let edge_mass = Matrix2::new(2.0, 1.0, 1.0, 2.0) * (element.height() / 6.0);
            let values = edge_mass * theta;
            LocalVector::new(nodes.to_vec(), values.iter().copied().collect())
        }
    }
}

/// Adds the loads of both electrodes of the source to the right-hand side.
pub fn apply_source<T: Real>(
    mut rhs: DVectorViewMut<T>,
    grid: &Grid<T>,
    source: &Source<T>,
    load: ElectrodeLoad,
) -> eyre::Result<()> {
    let positive = electrode_load(grid, &source.positive, source.current, load)?;
    let dim = rhs.len();
    insert_element_vector(rhs.rows_mut(0, dim), &positive)?;
    if let Some(negative) = &source.negative {
        let negative = electrode_load(grid, negative, -source.current, load)?;
        insert_element_vector(rhs, &negative)?;
    }
    Ok(())
}
