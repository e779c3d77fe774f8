mod common;

use std::collections::BTreeSet;

use common::{solved, solver, uncapacitated_network};
use netopt::{
    create_network_optimizer, solve_network_optimization, MicroLpSolver, NetworkData,
    OptimizerOptions, ProblemParameters, SolverConfig,
};
use rstest::rstest;

fn forced_options() -> OptimizerOptions {
    OptimizerOptions::default()
        .with_force_open([3])
        .with_force_closed([4])
        .with_force_allocations([(1, 5)])
        .with_mutually_exclusive(vec![vec![2, 4]])
}

#[rstest]
fn forced_settings_shape_the_solution(uncapacitated_network: NetworkData) {
    let params = ProblemParameters::default()
        .with_num_warehouses(2)
        .with_options(forced_options());
    let solution = solved("p-median", &uncapacitated_network, params);

    assert_eq!(solution.active_warehouses, BTreeSet::from([1, 3]));
    assert!(solution.is_active(3));
    assert!(!solution.is_active(4));
    assert!(!(solution.is_active(2) && solution.is_active(4)));
    assert!((solution.flow(1, 5) - 1.0).abs() < 1e-6);
}

#[rstest]
fn unknown_references_are_skipped(uncapacitated_network: NetworkData) {
    let options = forced_options()
        .with_force_open([3, 42])
        .with_force_allocations([(1, 5), (9, 1), (1, 99)])
        .with_mutually_exclusive(vec![vec![2, 4], vec![5, 77]]);
    let params = ProblemParameters::default()
        .with_num_warehouses(2)
        .with_options(options);

    let optimizer = create_network_optimizer("p-median", &uncapacitated_network, params).unwrap();
    assert_eq!(optimizer.options().force_open, vec![3]);
    assert_eq!(optimizer.options().force_allocations, vec![(1, 5)]);
    assert_eq!(optimizer.options().mutually_exclusive, vec![vec![2, 4]]);
}

#[rstest]
fn pipeline_runs_end_to_end(uncapacitated_network: NetworkData, solver: MicroLpSolver) {
    let params = ProblemParameters::default()
        .with_num_warehouses(2)
        .with_options(forced_options());
    let outcome = solve_network_optimization(
        "p-median",
        &uncapacitated_network,
        params,
        &solver,
        &SolverConfig::default().with_time_limit(30.0),
    )
    .unwrap();

    let solution = outcome.into_solution().unwrap();
    let report = solution.report().to_string();
    assert!(report.contains("P-Median optimization results:"));
    assert!(report.contains("Open warehouses: (2 out of 5)"));
}

#[rstest]
fn model_is_discarded_after_solving(uncapacitated_network: NetworkData, solver: MicroLpSolver) {
    let params = ProblemParameters::default().with_num_warehouses(1);
    let mut optimizer = create_network_optimizer("p-median", &uncapacitated_network, params).unwrap();

    optimizer.build_model().unwrap();
    assert!(optimizer.is_built());
    optimizer.solve(&solver, &SolverConfig::default()).unwrap();
    assert!(!optimizer.is_built());
    assert!(optimizer.solve(&solver, &SolverConfig::default()).is_err());

    // a rebuild allows another run
    optimizer.build_model().unwrap();
    assert!(optimizer.solve(&solver, &SolverConfig::default()).unwrap().is_solved());
}
