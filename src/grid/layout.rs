//! Procedural construction of grids from breakpoints.
use crate::grid::{Element, Grid, Point2D, Region};
use axires_traits::Real;
use eyre::{eyre, ensure};
use serde::{Deserialize, Serialize};

/// A rectangular block of constant material, given as ranges of breakpoint indices.
///
/// The block covers `r_breakpoints[r_range[0]]..=r_breakpoints[r_range[1]]` and likewise along z,
/// so that it follows its breakpoints when they are moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRegion {
    pub material: usize,
    pub r_range: [usize; 2],
    pub z_range: [usize; 2],
}

/// Describes a structured grid by breakpoints along each axis, a number of uniform elements per
/// interval between consecutive breakpoints, and a set of material regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout<T> {
    r_breakpoints: Vec<T>,
    r_splits: Vec<usize>,
    z_breakpoints: Vec<T>,
    z_splits: Vec<usize>,
    regions: Vec<LayoutRegion>,
}

fn check_splits(axis: &str, num_breakpoints: usize, splits: &[usize]) -> eyre::Result<()> {
    ensure!(num_breakpoints >= 2, "need at least two breakpoints along {}", axis);
    ensure!(
        splits.len() + 1 == num_breakpoints,
        "{} breakpoints along {} require {} interval splits, got {}",
        num_breakpoints,
        axis,
        num_breakpoints - 1,
        splits.len()
    );
    ensure!(
        splits.iter().all(|&n| n > 0),
        "every interval along {} needs at least one element",
        axis
    );
    Ok(())
}

fn check_increasing<T: Real>(axis: &str, breakpoints: &[T]) -> eyre::Result<()> {
    for (i, pair) in breakpoints.windows(2).enumerate() {
        ensure!(
            pair[0] < pair[1],
            "breakpoints along {} must be strictly increasing, but breakpoint {} ({}) is not below breakpoint {} ({})",
            axis,
            i,
            pair[0],
            i + 1,
            pair[1]
        );
    }
    Ok(())
}

/// Subdivides every interval between consecutive breakpoints uniformly.
fn subdivide<T: Real>(breakpoints: &[T], splits: &[usize]) -> Vec<T> {
    let mut coordinates = Vec::with_capacity(splits.iter().sum::<usize>() + 1);
    for (interval, &n) in breakpoints.windows(2).zip(splits) {
        let (a, b) = (interval[0], interval[1]);
        let n_as_t = T::from_usize(n).expect("Must be able to fit usize in T");
        for k in 0..n {
            let k_as_t = T::from_usize(k).expect("Must be able to fit usize in T");
            coordinates.push(a + (b - a) * k_as_t / n_as_t);
        }
    }
    coordinates.extend(breakpoints.last().copied());
    coordinates
}

impl<T: Real> GridLayout<T> {
    pub fn new(
        r_breakpoints: Vec<T>,
        r_splits: Vec<usize>,
        z_breakpoints: Vec<T>,
        z_splits: Vec<usize>,
    ) -> eyre::Result<Self> {
        check_splits("r", r_breakpoints.len(), &r_splits)?;
        check_splits("z", z_breakpoints.len(), &z_splits)?;
        Ok(Self {
            r_breakpoints,
            r_splits,
            z_breakpoints,
            z_splits,
            regions: Vec::new(),
        })
    }

    /// Adds a material region. Earlier regions take precedence where regions overlap.
    pub fn with_region(mut self, material: usize, r_range: [usize; 2], z_range: [usize; 2]) -> eyre::Result<Self> {
        for (axis, range, num_breakpoints) in [
            ("r", r_range, self.r_breakpoints.len()),
            ("z", z_range, self.z_breakpoints.len()),
        ] {
            ensure!(
                range[0] < range[1] && range[1] < num_breakpoints,
                "invalid breakpoint range {:?} along {} with {} breakpoints",
                range,
                axis,
                num_breakpoints
            );
        }
        self.regions.push(LayoutRegion {
            material,
            r_range,
            z_range,
        });
        Ok(self)
    }

    pub fn r_breakpoints(&self) -> &[T] {
        &self.r_breakpoints
    }

    pub fn z_breakpoints(&self) -> &[T] {
        &self.z_breakpoints
    }

    pub fn r_splits(&self) -> &[usize] {
        &self.r_splits
    }

    pub fn z_splits(&self) -> &[usize] {
        &self.z_splits
    }

    pub fn regions(&self) -> &[LayoutRegion] {
        &self.regions
    }

    pub fn set_r_breakpoint(&mut self, index: usize, value: T) -> eyre::Result<()> {
        let num_breakpoints = self.r_breakpoints.len();
        let breakpoint = self
            .r_breakpoints
            .get_mut(index)
            .ok_or_else(|| eyre!("r breakpoint {} does not exist ({} breakpoints)", index, num_breakpoints))?;
        *breakpoint = value;
        Ok(())
    }

    pub fn set_z_breakpoint(&mut self, index: usize, value: T) -> eyre::Result<()> {
        let num_breakpoints = self.z_breakpoints.len();
        let breakpoint = self
            .z_breakpoints
            .get_mut(index)
            .ok_or_else(|| eyre!("z breakpoint {} does not exist ({} breakpoints)", index, num_breakpoints))?;
        *breakpoint = value;
        Ok(())
    }

    /// The material regions in grid coordinates.
    pub fn coordinate_regions(&self) -> Vec<Region<T>> {
        self.regions
            .iter()
            .map(|region| Region {
                material: region.material,
                lower_left: Point2D::new(
                    self.r_breakpoints[region.r_range[0]],
                    self.z_breakpoints[region.z_range[0]],
                ),
                upper_right: Point2D::new(
                    self.r_breakpoints[region.r_range[1]],
                    self.z_breakpoints[region.z_range[1]],
                ),
            })
            .collect()
    }

    /// Builds the grid.
    ///
    /// Without regions every element gets material 0. Otherwise each element takes the material
    /// of the first region containing it, and an element outside all regions is an error.
    pub fn build(&self) -> eyre::Result<Grid<T>> {
        check_increasing("r", &self.r_breakpoints)?;
        check_increasing("z", &self.z_breakpoints)?;
        ensure!(
            self.r_breakpoints[0] >= T::zero(),
            "the first r breakpoint must be non-negative, got {}",
            self.r_breakpoints[0]
        );

        let r = subdivide(&self.r_breakpoints, &self.r_splits);
        let z = subdivide(&self.z_breakpoints, &self.z_splits);
        let (nr, nz) = (r.len() - 1, z.len() - 1);
        let node_index = |ir: usize, iz: usize| iz * (nr + 1) + ir;

        let nodes = z
            .iter()
            .flat_map(|&z_j| r.iter().map(move |&r_i| Point2D::new(r_i, z_j)))
            .collect();

        let regions = self.coordinate_regions();
        let mut elements = Vec::with_capacity(nr * nz);
        for iz in 0..nz {
            for ir in 0..nr {
                let lower_left = Point2D::new(r[ir], z[iz]);
                let upper_right = Point2D::new(r[ir + 1], z[iz + 1]);
                let material = if regions.is_empty() {
                    0
                } else {
                    regions
                        .iter()
                        .find(|region| region.contains_rectangle(&lower_left, &upper_right))
                        .map(|region| region.material)
                        .ok_or_else(|| {
                            eyre!(
                                "element {} spanning ({}, {}) to ({}, {}) is not covered by any region",
                                iz * nr + ir,
                                lower_left.r,
                                lower_left.z,
                                upper_right.r,
                                upper_right.z
                            )
                        })?
                };
                let nodes = [
                    node_index(ir, iz),
                    node_index(ir + 1, iz),
                    node_index(ir, iz + 1),
                    node_index(ir + 1, iz + 1),
                ];
                elements.push(Element::new(nodes, r[ir + 1] - r[ir], z[iz + 1] - z[iz], material));
            }
        }

        Ok(Grid::new(nodes, elements, nr, nz)?.with_regions(regions))
    }
}
