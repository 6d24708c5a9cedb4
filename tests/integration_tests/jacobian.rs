use crate::integration_tests::{homogeneous_state, surface_survey, two_layer_state};
use axires::inversion::{predict_measurements, ForwardOptions, JacobianAssembler, JacobianSettings, Parameter};
use nalgebra::{DMatrix, DMatrixViewMut};
use std::sync::Arc;
use util::{assert_scalar_eq, max_relative_difference};

fn settings(max_concurrency: usize) -> JacobianSettings<f64> {
    JacobianSettings {
        relative_step: 0.05,
        max_concurrency,
    }
}

#[test]
fn homogeneous_sensitivities_match_scaling_laws() {
    // u ∝ I / σ, so the forward differences are -U / (1.05 σ) for the conductivity and U / I for
    // the current.
    let (sigma, current) = (0.1, 2.0);
    let state = homogeneous_state(sigma, current);
    let survey = surface_survey(&[10.0, 30.0, 60.0, 120.0]);
    let options = ForwardOptions::default();
    let baseline = predict_measurements(&state, &survey, options).unwrap();

    let parameters = [Parameter::Conductivity(0), Parameter::Current];
    let mut assembler =
        JacobianAssembler::new(&state, Arc::new(survey), options, settings(2), parameters.len()).unwrap();
    assert_eq!(assembler.instances().len(), 2);

    let mut jacobian = DMatrix::zeros(3, 2);
    assembler
        .assemble(&parameters, &baseline, DMatrixViewMut::from(&mut jacobian))
        .unwrap();

    for k in 0..3 {
        assert!(jacobian[(k, 0)] < 0.0);
        assert_scalar_eq!(jacobian[(k, 0)], -baseline[k] / (1.05 * sigma), reltol = 1e-8);
        assert_scalar_eq!(jacobian[(k, 1)], baseline[k] / current, reltol = 1e-8);
    }

    // Every replica is back at the unperturbed model
    assert!(assembler.instances().iter().all(|instance| instance.state() == &state));
}

#[test]
fn jacobian_does_not_depend_on_pool_size() {
    let state = two_layer_state(0.1, 0.05);
    let survey = Arc::new(surface_survey(&[50.0, 100.0, 150.0, 250.0]));
    let options = ForwardOptions::default();
    let baseline = predict_measurements(&state, &survey, options).unwrap();
    let parameters = [
        Parameter::Conductivity(0),
        Parameter::Conductivity(1),
        Parameter::HorizontalBoundary(1),
        Parameter::Current,
    ];

    let mut jacobians = Vec::new();
    for max_concurrency in [1, 2, 8] {
        let mut assembler =
            JacobianAssembler::new(&state, Arc::clone(&survey), options, settings(max_concurrency), parameters.len())
                .unwrap();
        assert_eq!(assembler.instances().len(), max_concurrency.min(parameters.len()));
        let mut jacobian = DMatrix::zeros(3, parameters.len());
        assembler
            .assemble(&parameters, &baseline, DMatrixViewMut::from(&mut jacobian))
            .unwrap();
        jacobians.push(jacobian);
    }

    assert!(max_relative_difference(&jacobians[0], &jacobians[1]) <= 1e-12);
    assert!(max_relative_difference(&jacobians[0], &jacobians[2]) <= 1e-12);
}

#[test]
fn geometric_sensitivity_matches_rebuilt_model() {
    let state = two_layer_state(0.1, 0.05);
    let survey = surface_survey(&[50.0, 100.0, 150.0, 250.0]);
    let options = ForwardOptions::default();
    let baseline = predict_measurements(&state, &survey, options).unwrap();

    let parameter = Parameter::HorizontalBoundary(1);
    let mut assembler = JacobianAssembler::new(&state, Arc::new(survey.clone()), options, settings(1), 1).unwrap();
    let mut jacobian = DMatrix::zeros(3, 1);
    assembler
        .assemble(&[parameter], &baseline, DMatrixViewMut::from(&mut jacobian))
        .unwrap();

    // Interface at z = -50 moves up by 5 %
    let mut perturbed_state = state.clone();
    perturbed_state.set_value(parameter, -47.5).unwrap();
    let perturbed = predict_measurements(&perturbed_state, &survey, options).unwrap();
    let expected = (perturbed - &baseline) / 2.5;
    assert!(max_relative_difference(&jacobian.column(0), &expected) <= 1e-10);
    assert_eq!(assembler.instances()[0].state(), &state);
}

#[test]
fn failed_sensitivity_is_reported_and_model_restored() {
    let state = homogeneous_state(0.1, 1.0);
    let survey = surface_survey(&[10.0, 30.0]);
    let options = ForwardOptions::default();
    let baseline = predict_measurements(&state, &survey, options).unwrap();

    // Moving the breakpoint at r = 100 beyond the outer radius yields an invalid grid
    let parameters = [Parameter::Current, Parameter::VerticalBoundary(1)];
    let jacobian_settings = JacobianSettings {
        relative_step: 4.0,
        max_concurrency: 2,
    };
    let mut assembler =
        JacobianAssembler::new(&state, Arc::new(survey), options, jacobian_settings, parameters.len()).unwrap();
    let mut jacobian = DMatrix::zeros(1, 2);
    assert!(assembler
        .assemble(&parameters, &baseline, DMatrixViewMut::from(&mut jacobian))
        .is_err());
    assert!(assembler.instances().iter().all(|instance| instance.state() == &state));

    // A missing parameter is an error as well
    let mut jacobian = DMatrix::zeros(1, 1);
    assert!(assembler
        .assemble(&[Parameter::Conductivity(3)], &baseline, DMatrixViewMut::from(&mut jacobian))
        .is_err());
}
