//! Structured grids of axis-aligned rectangular elements in the (r, z) half-plane.
use axires_sparse::ElementConnectivity;
use axires_traits::Real;
use eyre::{bail, ensure};
use nalgebra::Scalar;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

pub mod layout;

pub use layout::{GridLayout, LayoutRegion};

/// Tolerance used when deciding whether an element belongs to a region.
pub const REGION_TOLERANCE: f64 = 1e-3;

/// A point in cylindrical coordinates, with radius `r ≥ 0` and depth coordinate `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D<T> {
    pub r: T,
    pub z: T,
}

impl<T> Point2D<T> {
    pub fn new(r: T, z: T) -> Self {
        Self { r, z }
    }
}

/// An edge of a rectangular element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    Lower,
    Right,
    Upper,
    Left,
}

impl Bound {
    /// Local indices of the two nodes on this edge.
    pub fn local_nodes(&self) -> [usize; 2] {
        match self {
            Bound::Lower => [0, 1],
            Bound::Right => [1, 3],
            Bound::Upper => [2, 3],
            Bound::Left => [0, 2],
        }
    }
}

/// A bilinear rectangular element.
///
/// Local node `i` sits at the corner `(i % 2, i / 2)` of the element: node 0 at the lower-r,
/// lower-z corner, node 1 at the upper-r corner, node 2 at the upper-z corner and node 3 opposite
/// of node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element<T> {
    nodes: [usize; 4],
    length: T,
    height: T,
    material: usize,
}

impl<T: Scalar + Copy> Element<T> {
    pub fn new(nodes: [usize; 4], length: T, height: T, material: usize) -> Self {
        Self {
            nodes,
            length,
            height,
            material,
        }
    }

    pub fn nodes(&self) -> &[usize; 4] {
        &self.nodes
    }

    /// Extent of the element along r.
    pub fn length(&self) -> T {
        self.length
    }

    /// Extent of the element along z.
    pub fn height(&self) -> T {
        self.height
    }

    pub fn material(&self) -> usize {
        self.material
    }

    /// Global indices of the two nodes on the given edge.
    pub fn bound_nodes(&self, bound: Bound) -> [usize; 2] {
        bound.local_nodes().map(|local| self.nodes[local])
    }
}

/// An axis-aligned rectangle of constant material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region<T> {
    pub material: usize,
    pub lower_left: Point2D<T>,
    pub upper_right: Point2D<T>,
}

impl<T: Real> Region<T> {
    pub fn contains(&self, point: &Point2D<T>) -> bool {
        let delta = T::from_f64(REGION_TOLERANCE).expect("Literal must fit in T");
        self.lower_left.r - delta <= point.r
            && point.r <= self.upper_right.r + delta
            && self.lower_left.z - delta <= point.z
            && point.z <= self.upper_right.z + delta
    }

    /// Whether the rectangle spanned by the two corners lies inside the region.
    pub fn contains_rectangle(&self, lower_left: &Point2D<T>, upper_right: &Point2D<T>) -> bool {
        self.contains(lower_left) && self.contains(upper_right)
    }
}

/// A structured grid of rectangular elements.
///
/// Elements are stored row by row: element `iz * elements_along_r + ir` is the `ir`-th element
/// along r in the `iz`-th row along z.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    nodes: Vec<Point2D<T>>,
    elements: Vec<Element<T>>,
    elements_along_r: usize,
    elements_along_z: usize,
    regions: Vec<Region<T>>,
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn approx_eq<T: Real>(a: T, b: T) -> bool {
    (a - b).abs() <= 1e-9 * T::one().max(a.abs()).max(b.abs())
}

impl<T: Real> Grid<T> {
    pub fn new(
        nodes: Vec<Point2D<T>>,
        elements: Vec<Element<T>>,
        elements_along_r: usize,
        elements_along_z: usize,
    ) -> eyre::Result<Self> {
        ensure!(
            elements.len() == elements_along_r * elements_along_z,
            "grid with {} x {} elements along r and z cannot hold {} elements",
            elements_along_r,
            elements_along_z,
            elements.len()
        );

        for (i, node) in nodes.iter().enumerate() {
            ensure!(
                node.r.is_finite() && node.z.is_finite(),
                "node {} has non-finite coordinates",
                i
            );
            ensure!(node.r >= T::zero(), "node {} has negative radius {}", i, node.r);
        }

        for (index, element) in elements.iter().enumerate() {
            if let Some(&node) = element.nodes.iter().find(|&&node| node >= nodes.len()) {
                bail!(
                    "element {} references node {}, but the grid has {} nodes",
                    index,
                    node,
                    nodes.len()
                );
            }
            ensure!(
                element.length > T::zero() && element.height > T::zero(),
                "element {} has non-positive extent",
                index
            );

            let [n0, n1, n2, n3] = element.nodes.map(|node| nodes[node]);
            let consistent = approx_eq(n1.r, n0.r + element.length)
                && approx_eq(n1.z, n0.z)
                && approx_eq(n2.r, n0.r)
                && approx_eq(n2.z, n0.z + element.height)
                && approx_eq(n3.r, n1.r)
                && approx_eq(n3.z, n2.z);
            ensure!(
                consistent,
                "nodes of element {} are not ordered as the corners of a {} x {} rectangle",
                index,
                element.length,
                element.height
            );
        }

        Ok(Self {
            nodes,
            elements,
            elements_along_r,
            elements_along_z,
            regions: Vec::new(),
        })
    }

    pub fn with_regions(self, regions: Vec<Region<T>>) -> Self {
        Self { regions, ..self }
    }

    pub fn nodes(&self) -> &[Point2D<T>] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element<T>] {
        &self.elements
    }

    pub fn regions(&self) -> &[Region<T>] {
        &self.regions
    }

    pub fn elements_along_r(&self) -> usize {
        self.elements_along_r
    }

    pub fn elements_along_z(&self) -> usize {
        self.elements_along_z
    }

    /// The number of distinct material ids needed to cover every element.
    pub fn num_materials(&self) -> usize {
        self.elements
            .iter()
            .map(|element| element.material + 1)
            .max()
            .unwrap_or(0)
    }

    /// Lower-left (node 0) and upper-right (node 3) corners of an element.
    pub fn element_corners(&self, element_index: usize) -> (Point2D<T>, Point2D<T>) {
        let nodes = self.elements[element_index].nodes;
        (self.nodes[nodes[0]], self.nodes[nodes[3]])
    }

    /// The axis-aligned bounding box of all nodes, or `None` for an empty grid.
    pub fn bounding_box(&self) -> Option<(Point2D<T>, Point2D<T>)> {
        let first = *self.nodes.first()?;
        Some(self.nodes.iter().fold((first, first), |(min, max), p| {
            (
                Point2D::new(min.r.min(p.r), min.z.min(p.z)),
                Point2D::new(max.r.max(p.r), max.z.max(p.z)),
            )
        }))
    }

    /// Whether the point lies in the closed element, enlarged by `delta` in every direction.
    pub fn element_contains(&self, element_index: usize, point: &Point2D<T>, delta: T) -> bool {
        let (lower_left, upper_right) = self.element_corners(element_index);
        lower_left.r - delta <= point.r
            && point.r <= upper_right.r + delta
            && lower_left.z - delta <= point.z
            && point.z <= upper_right.z + delta
    }

    /// Finds the first element containing the point by a linear scan.
    pub fn find_element(&self, point: &Point2D<T>, delta: T) -> Option<usize> {
        (0..self.elements.len()).find(|&index| self.element_contains(index, point, delta))
    }
}

impl<T: Real> ElementConnectivity for Grid<T> {
    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn num_elements(&self) -> usize {
        self.elements.len()
    }

    fn element_node_count(&self, _element_index: usize) -> usize {
        4
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.elements[element_index].nodes);
    }
}
