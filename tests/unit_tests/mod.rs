use axires::grid::{Grid, GridLayout};

mod field;
mod forward;
mod grid;

/// A grid of `nr` x `nz` unit squares with its lower-left corner at `(0, -nz)`.
pub fn unit_square_grid(nr: usize, nz: usize) -> Grid<f64> {
    GridLayout::new(vec![0.0, nr as f64], vec![nr], vec![-(nz as f64), 0.0], vec![nz])
        .unwrap()
        .build()
        .unwrap()
}
