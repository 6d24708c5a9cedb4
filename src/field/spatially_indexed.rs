use crate::grid::{Grid, Point2D};
use axires_traits::Real;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use std::fmt;

type IndexedRectangle = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Accelerates point location in a grid with an R-tree over the element bounding boxes.
///
/// The tree only proposes candidates; whether a point lies in an element is decided by the exact
/// test of [`Grid::element_contains`], so the result is the same as that of a linear scan.
#[derive(Clone)]
pub struct ElementLocator<T> {
    tree: RTree<IndexedRectangle>,
    bounding_box: Option<(Point2D<T>, Point2D<T>)>,
}

impl<T: fmt::Debug> fmt::Debug for ElementLocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementLocator")
            .field("num_elements", &self.tree.size())
            .field("bounding_box", &self.bounding_box)
            .finish()
    }
}

fn to_f64<T: Real>(x: T) -> f64 {
    x.to_subset().unwrap_or(f64::NAN)
}

impl<T: Real> ElementLocator<T> {
    pub fn new(grid: &Grid<T>) -> Self {
        let rectangles = (0..grid.elements().len())
            .map(|index| {
                let (lower_left, upper_right) = grid.element_corners(index);
                let min = [to_f64(lower_left.r), to_f64(lower_left.z)];
                let max = [to_f64(upper_right.r), to_f64(upper_right.z)];
                // Make the box slightly larger to accommodate floating point errors
                let enlarged = |i: usize| {
                    let center = 0.5 * (min[i] + max[i]);
                    let half_extent = 0.5 * 1.01 * (max[i] - min[i]);
                    (center - half_extent, center + half_extent)
                };
                let ((r0, r1), (z0, z1)) = (enlarged(0), enlarged(1));
                GeomWithData::new(Rectangle::from_corners([r0, z0], [r1, z1]), index)
            })
            .collect();
        Self {
            tree: RTree::bulk_load(rectangles),
            bounding_box: grid.bounding_box(),
        }
    }

    /// The bounding box of the indexed grid.
    pub fn bounding_box(&self) -> Option<&(Point2D<T>, Point2D<T>)> {
        self.bounding_box.as_ref()
    }

    pub fn in_bounding_box(&self, point: &Point2D<T>) -> bool {
        self.bounding_box
            .as_ref()
            .map(|(min, max)| min.r <= point.r && point.r <= max.r && min.z <= point.z && point.z <= max.z)
            .unwrap_or(false)
    }

    /// Finds the element containing the point, preferring the lowest element index when the
    /// point lies on a shared edge.
    ///
    /// The grid must be the one the locator was built from.
    pub fn locate(&self, grid: &Grid<T>, point: &Point2D<T>) -> Option<usize> {
        if !self.in_bounding_box(point) {
            return None;
        }
        self.tree
            .locate_all_at_point(&[to_f64(point.r), to_f64(point.z)])
            .map(|candidate| candidate.data)
            .filter(|&index| grid.element_contains(index, point, T::zero()))
            .min()
    }
}
