use axires::grid::{Bound, Element, Grid, GridLayout, Point2D, Region};
use axires::sparse::ElementConnectivity;

fn single_element_nodes() -> Vec<Point2D<f64>> {
    vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(1.0, 0.0),
        Point2D::new(0.0, 2.0),
        Point2D::new(1.0, 2.0),
    ]
}

fn three_by_two_grid() -> Grid<f64> {
    GridLayout::new(vec![0.0, 1.0, 3.0], vec![1, 2], vec![-2.0, 0.0], vec![2])
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn grid_new_accepts_consistent_element() {
    let element = Element::new([0, 1, 2, 3], 1.0, 2.0, 0);
    let grid = Grid::new(single_element_nodes(), vec![element], 1, 1).unwrap();
    assert_eq!(grid.nodes().len(), 4);
    assert_eq!(grid.elements().len(), 1);
    assert_eq!(grid.num_materials(), 1);
    assert_eq!(grid.elements()[0].bound_nodes(Bound::Right), [1, 3]);
    assert_eq!(grid.elements()[0].bound_nodes(Bound::Upper), [2, 3]);
}

#[test]
fn grid_new_rejects_invalid_input() {
    let element = || Element::new([0, 1, 2, 3], 1.0, 2.0, 0);

    // Wrong element count
    assert!(Grid::new(single_element_nodes(), vec![element()], 2, 1).is_err());

    // Negative radius
    let mut nodes = single_element_nodes();
    nodes[0].r = -1.0;
    nodes[2].r = -1.0;
    assert!(Grid::new(nodes, vec![Element::new([0, 1, 2, 3], 2.0, 2.0, 0)], 1, 1).is_err());

    // Node index out of bounds
    let out_of_bounds = Element::new([0, 1, 2, 4], 1.0, 2.0, 0);
    assert!(Grid::new(single_element_nodes(), vec![out_of_bounds], 1, 1).is_err());

    // Nodes not ordered as the corners of the rectangle
    let swapped = Element::new([1, 0, 2, 3], 1.0, 2.0, 0);
    assert!(Grid::new(single_element_nodes(), vec![swapped], 1, 1).is_err());

    // Extent inconsistent with the nodes
    let wrong_height = Element::new([0, 1, 2, 3], 1.0, 3.0, 0);
    assert!(Grid::new(single_element_nodes(), vec![wrong_height], 1, 1).is_err());

    // Non-positive extent
    let degenerate = Element::new([0, 1, 2, 3], 0.0, 2.0, 0);
    assert!(Grid::new(single_element_nodes(), vec![degenerate], 1, 1).is_err());
}

#[test]
fn grid_elements_are_ordered_by_rows() {
    let grid = three_by_two_grid();
    assert_eq!(grid.elements_along_r(), 3);
    assert_eq!(grid.elements_along_z(), 2);
    assert_eq!(grid.nodes().len(), 12);
    assert_eq!(grid.elements().len(), 6);

    let element = &grid.elements()[4];
    assert_eq!(element.nodes(), &[5, 6, 9, 10]);
    assert_eq!(element.length(), 1.0);
    assert_eq!(element.height(), 1.0);

    let (lower_left, upper_right) = grid.element_corners(4);
    assert_eq!(lower_left, Point2D::new(1.0, -1.0));
    assert_eq!(upper_right, Point2D::new(2.0, 0.0));
}

#[test]
fn grid_bounding_box() {
    let grid = three_by_two_grid();
    let (min, max) = grid.bounding_box().unwrap();
    assert_eq!(min, Point2D::new(0.0, -2.0));
    assert_eq!(max, Point2D::new(3.0, 0.0));
}

#[test]
fn grid_find_element() {
    let grid = three_by_two_grid();
    assert_eq!(grid.find_element(&Point2D::new(1.5, -0.5), 0.0), Some(4));
    assert_eq!(grid.find_element(&Point2D::new(2.5, -1.5), 0.0), Some(2));
    // On a shared edge the first element wins
    assert_eq!(grid.find_element(&Point2D::new(1.0, -0.5), 0.0), Some(3));
    assert_eq!(grid.find_element(&Point2D::new(3.5, -0.5), 0.0), None);
    // Slightly outside, but within the tolerance
    assert_eq!(grid.find_element(&Point2D::new(3.0 + 1e-14, -0.5), 1e-13), Some(5));
}

#[test]
fn grid_connectivity() {
    let grid = three_by_two_grid();
    assert_eq!(grid.num_nodes(), 12);
    assert_eq!(grid.num_elements(), 6);
    assert_eq!(grid.element_node_count(1), 4);
    let mut nodes = [0; 4];
    grid.populate_element_nodes(&mut nodes, 1);
    assert_eq!(nodes, [1, 2, 5, 6]);
}

#[test]
fn region_contains_with_tolerance() {
    let region = Region {
        material: 3,
        lower_left: Point2D::new(0.0, -1.0),
        upper_right: Point2D::new(2.0, 0.0),
    };
    assert!(region.contains(&Point2D::new(1.0, -0.5)));
    assert!(region.contains(&Point2D::new(2.0005, 0.0)));
    assert!(!region.contains(&Point2D::new(2.01, 0.0)));
    assert!(region.contains_rectangle(&Point2D::new(0.0, -1.0), &Point2D::new(1.0, 0.0)));
    assert!(!region.contains_rectangle(&Point2D::new(1.0, -1.0), &Point2D::new(3.0, 0.0)));
}
