use axires::field::{ElementLocator, FieldSolution, Receiver};
use axires::grid::{Grid, GridLayout, Point2D};
use nalgebra::DVector;
use proptest::prelude::*;
use std::sync::Arc;

fn graded_grid() -> Grid<f64> {
    GridLayout::new(vec![0.0, 1.0, 4.0, 10.0], vec![2, 3, 2], vec![-6.0, -1.0, 0.0], vec![3, 2])
        .unwrap()
        .build()
        .unwrap()
}

fn bilinear_field(p: &Point2D<f64>) -> f64 {
    1.5 - 0.3 * p.r + 0.7 * p.z + 0.05 * p.r * p.z
}

fn interpolated_solution(grid: Grid<f64>) -> FieldSolution<f64> {
    let weights = DVector::from_iterator(grid.nodes().len(), grid.nodes().iter().map(bilinear_field));
    let locator = Arc::new(ElementLocator::new(&grid));
    FieldSolution::new(Arc::new(grid), locator, weights)
}

#[test]
fn evaluate_outside_grid_is_nan() {
    let solution = interpolated_solution(graded_grid());
    assert!(solution.evaluate(&Point2D::new(10.5, -1.0)).is_nan());
    assert!(solution.evaluate(&Point2D::new(1.0, 0.5)).is_nan());
    assert!(solution.evaluate(&Point2D::new(2.0, -6.01)).is_nan());
    assert!(!solution.evaluate(&Point2D::new(10.0, 0.0)).is_nan());
}

#[test]
fn potential_difference_and_error_norm() {
    let solution = interpolated_solution(graded_grid());
    let receiver = Receiver::new(Point2D::new(2.0, -0.5), Point2D::new(7.0, -3.0));
    let expected = bilinear_field(&receiver.m) - bilinear_field(&receiver.n);
    assert!((solution.potential_difference(&receiver) - expected).abs() <= 1e-13);

    assert!(solution.l2_error(bilinear_field) <= 1e-14);
    let shifted_error = solution.l2_error(|p| bilinear_field(p) + 1.0);
    let num_nodes = solution.nodal_values().len() as f64;
    assert!((shifted_error - num_nodes.sqrt()).abs() <= 1e-12);
}

proptest! {
    #[test]
    fn evaluate_reproduces_bilinear_fields(r in 0.0 .. 10.0, z in -6.0 .. 0.0) {
        let solution = interpolated_solution(graded_grid());
        let point = Point2D::new(r, z);
        prop_assert!((solution.evaluate(&point) - bilinear_field(&point)).abs() <= 1e-12);
    }

    #[test]
    fn locator_agrees_with_linear_scan(r in -1.0 .. 11.0, z in -7.0 .. 1.0) {
        let grid = graded_grid();
        let locator = ElementLocator::new(&grid);
        let point = Point2D::new(r, z);
        prop_assert_eq!(locator.locate(&grid, &point), grid.find_element(&point, 0.0));
    }
}

#[test]
fn locator_prefers_lowest_element_on_shared_edges() {
    let grid = graded_grid();
    let locator = ElementLocator::new(&grid);
    // Breakpoint r = 1 separates elements 1 and 2 in the bottom row
    let point = Point2D::new(1.0, -5.5);
    assert_eq!(locator.locate(&grid, &point), Some(1));
    assert_eq!(locator.locate(&grid, &point), grid.find_element(&point, 0.0));
    assert_eq!(locator.locate(&grid, &Point2D::new(0.0, 0.0)), Some(7 * 4));
}

#[test]
fn gradient_of_bilinear_field() {
    let solution = interpolated_solution(graded_grid());
    // Exact gradient of the bilinear field, also across the element boundary at r = 4
    for point in [Point2D::new(2.5, -3.0), Point2D::new(4.0, -0.5), Point2D::new(7.0, -2.0)] {
        let gradient = solution.gradient(&point);
        assert!((gradient[0] - (-0.3 + 0.05 * point.z)).abs() <= 1e-9);
        assert!((gradient[1] - (0.7 + 0.05 * point.r)).abs() <= 1e-9);
    }

    // The stencil leaves the grid on the axis and on the surface
    assert!(solution.gradient(&Point2D::new(0.0, -2.0))[0].is_nan());
    assert!(!solution.gradient(&Point2D::new(0.0, -2.0))[1].is_nan());
    assert!(solution.gradient(&Point2D::new(3.0, 0.0))[1].is_nan());
}
