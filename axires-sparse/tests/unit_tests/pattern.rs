use super::QuadGrid;
use axires_sparse::{ElementConnectivity, SparseError, SymmetricPattern};
use nalgebra_sparse::pattern::SparsityPattern;

#[test]
fn pattern_of_two_stacked_quads() {
    // Nodes:
    // 4 - 5
    // |   |
    // 2 - 3
    // |   |
    // 0 - 1
    let grid = QuadGrid::new(1, 2);
    let pattern = SymmetricPattern::from_connectivity(&grid).unwrap();

    assert_eq!(pattern.dim(), 6);
    assert_eq!(pattern.row_columns(0), &[] as &[usize]);
    assert_eq!(pattern.row_columns(1), &[0]);
    assert_eq!(pattern.row_columns(2), &[0, 1]);
    assert_eq!(pattern.row_columns(3), &[0, 1, 2]);
    assert_eq!(pattern.row_columns(4), &[2, 3]);
    assert_eq!(pattern.row_columns(5), &[2, 3, 4]);
    assert_eq!(pattern.nnz_lower(), 11);

    assert_eq!(pattern.column_rows(0), &[1, 2, 3]);
    assert_eq!(pattern.column_rows(2), &[3, 4, 5]);
    assert_eq!(pattern.column_rows(5), &[] as &[usize]);

    assert!(pattern.contains(0, 3));
    assert!(pattern.contains(3, 0));
    assert!(pattern.contains(4, 4));
    assert!(!pattern.contains(0, 4));
    assert!(!pattern.contains(6, 0));
}

#[test]
fn pattern_rows_are_sorted_and_strictly_lower() {
    let grid = QuadGrid::new(4, 3);
    let pattern = SymmetricPattern::from_connectivity(&grid).unwrap();
    for row in 0..pattern.dim() {
        let columns = pattern.row_columns(row);
        assert!(columns.windows(2).all(|w| w[0] < w[1]));
        assert!(columns.iter().all(|&col| col < row));
        for &col in columns {
            assert!(pattern.column_rows(col).contains(&row));
        }
    }
}

#[test]
fn pattern_rejects_out_of_bounds_nodes() {
    struct Broken;

    impl ElementConnectivity for Broken {
        fn num_nodes(&self) -> usize {
            3
        }

        fn num_elements(&self) -> usize {
            1
        }

        fn element_node_count(&self, _element_index: usize) -> usize {
            2
        }

        fn populate_element_nodes(&self, output: &mut [usize], _element_index: usize) {
            output.copy_from_slice(&[0, 3]);
        }
    }

    let err = SymmetricPattern::from_connectivity(&Broken).unwrap_err();
    assert_eq!(
        err,
        SparseError::NodeOutOfBounds {
            element: 0,
            node: 3,
            num_nodes: 3
        }
    );
}

#[test]
fn pattern_rejects_entries_on_or_above_diagonal() {
    let pattern = SparsityPattern::try_from_offsets_and_indices(2, 2, vec![0, 1, 1], vec![1]).unwrap();
    assert!(matches!(
        SymmetricPattern::from_lower_triangle(pattern),
        Err(SparseError::InvalidPattern(_))
    ));
}
