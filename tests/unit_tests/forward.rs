use crate::unit_tests::unit_square_grid;
use axires::assembly::{BoundaryCondition, ElectrodeLoad, Source};
use axires::forward::{ForwardConfig, ForwardSolver};
use axires::grid::{Bound, GridLayout, Point2D};
use axires::sparse::cg::CgSettings;
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use std::sync::Arc;

#[test]
fn two_element_column_reproduces_linear_potential() {
    // Column of two elements between z = 0 and z = 2 with u = 0 at the bottom and u = 2 at the
    // top. The exact solution u = z is bilinear, so it is reproduced exactly.
    let grid = GridLayout::new(vec![0.0, 1.0], vec![1], vec![0.0, 2.0], vec![2])
        .unwrap()
        .build()
        .unwrap();
    let conditions = vec![
        BoundaryCondition::homogeneous(0, Bound::Lower),
        BoundaryCondition::with_values(1, Bound::Upper, [2.0, 2.0]),
    ];
    let source = Source::pole(Point2D::new(0.5, 1.0), 0.0);
    let config = ForwardConfig::new(Arc::new(grid), vec![0.7], source).with_boundary_conditions(conditions);

    let mut solver = ForwardSolver::new(config).unwrap();
    let solution = solver.solve().unwrap();

    let expected = DVector::from_column_slice(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
    assert!((solution.nodal_values() - expected).abs().max() <= 1e-12);
    assert!((solution.evaluate(&Point2D::<f64>::new(0.3, 1.7)) - 1.7).abs() <= 1e-12);
    assert!(solution.l2_error(|p| p.z) <= 1e-12);
    assert!(solver.last_output().unwrap().converged);
}

#[test]
fn forward_solve_meets_residual_tolerance() {
    let grid = unit_square_grid(12, 8);
    let source = Source::dipole(Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0), 1.0);
    let mut solver = ForwardSolver::new(ForwardConfig::new(Arc::new(grid), vec![0.01], source)).unwrap();
    let solution = solver.solve().unwrap();

    let output = solver.last_output().unwrap();
    assert!(output.converged);
    assert!(output.relative_residual < 1e-30);

    let equation = solver.equation();
    let mut ax = DVector::zeros(equation.dim());
    equation
        .matrix()
        .mul_vec_into(DVectorViewMut::from(&mut ax), DVectorView::from(equation.solution()))
        .unwrap();
    let residual = (ax - equation.rhs()).norm() / equation.rhs().norm();
    assert!(residual <= 1e-12);

    // Potential is highest at the positive electrode and vanishes on the outer boundary
    assert!(solution.evaluate(&Point2D::new(0.0, 0.0)) > 0.0);
    assert!(solution.evaluate(&Point2D::new(4.0, 0.0)) < 0.0);
    assert_eq!(solution.evaluate(&Point2D::new(12.0, -3.0)), 0.0);
    assert_eq!(solution.evaluate(&Point2D::new(5.0, -8.0)), 0.0);
}

#[test]
fn potential_scales_inversely_with_conductivity() {
    let grid = Arc::new(unit_square_grid(6, 6));
    let source = Source::pole(Point2D::new(0.0, 0.0), 1.0);
    let mut solver = ForwardSolver::new(ForwardConfig::new(Arc::clone(&grid), vec![1.0], source)).unwrap();
    let reference = solver.solve().unwrap().nodal_values().clone();

    let mut solver = solver
        .reconfigure(ForwardConfig::new(grid, vec![4.0], source))
        .unwrap();
    let scaled = solver.solve().unwrap().nodal_values().clone();
    assert!((scaled * 4.0 - &reference).abs().max() <= 1e-12 * reference.abs().max());
}

#[test]
fn reconfigure_reuses_portrait_for_same_grid() {
    let grid = Arc::new(unit_square_grid(4, 3));
    let source = Source::pole(Point2D::new(0.0, 0.0), 1.0);
    let solver = ForwardSolver::new(ForwardConfig::new(Arc::clone(&grid), vec![1.0], source)).unwrap();
    let pattern = Arc::clone(solver.equation().matrix().pattern());

    let config = ForwardConfig::new(Arc::clone(&grid), vec![2.0], source)
        .with_electrode_load(ElectrodeLoad::Point)
        .with_cg_settings(CgSettings {
            epsilon: 1e-10,
            max_iterations: 100,
        });
    let solver = solver.reconfigure(config).unwrap();
    assert!(Arc::ptr_eq(&pattern, solver.equation().matrix().pattern()));

    // An equal grid behind a different pointer keeps the portrait as well
    let equal_grid = Arc::new(unit_square_grid(4, 3));
    let solver = solver
        .reconfigure(ForwardConfig::new(equal_grid, vec![2.0], source))
        .unwrap();
    assert!(Arc::ptr_eq(&pattern, solver.equation().matrix().pattern()));

    let mut solver = solver
        .reconfigure(ForwardConfig::new(Arc::new(unit_square_grid(5, 3)), vec![2.0], source))
        .unwrap();
    assert!(!Arc::ptr_eq(&pattern, solver.equation().matrix().pattern()));
    assert_eq!(solver.equation().dim(), 24);
    assert_eq!(solver.solve().unwrap().nodal_values().len(), 24);
}

#[test]
fn invalid_configurations_are_rejected() {
    let grid = Arc::new(unit_square_grid(2, 2));
    let source = Source::pole(Point2D::new(0.0, 0.0), 1.0);
    assert!(ForwardSolver::new(ForwardConfig::new(Arc::clone(&grid), vec![], source)).is_err());
    assert!(ForwardSolver::new(ForwardConfig::new(Arc::clone(&grid), vec![-1.0], source)).is_err());

    let solver = ForwardSolver::new(ForwardConfig::new(Arc::clone(&grid), vec![1.0], source)).unwrap();
    let conditions = vec![BoundaryCondition::homogeneous(9, Bound::Lower)];
    let config = ForwardConfig::new(Arc::clone(&grid), vec![1.0], source).with_boundary_conditions(conditions);
    assert!(solver.reconfigure(config).is_err());

    let outside = Source::pole(Point2D::new(5.0, 0.0), 1.0);
    let mut solver = ForwardSolver::new(ForwardConfig::new(grid, vec![1.0], outside)).unwrap();
    assert!(solver.solve().is_err());
}
