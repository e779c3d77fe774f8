//! Shared fixtures: five candidate warehouses and eight customers.
#![allow(dead_code)]

use rstest::fixture;

use netopt::{
    create_network_optimizer, Customer, DistanceMap, MicroLpSolver, NetworkData,
    NetworkSolution, ProblemParameters, SolveOutcome, SolverConfig, Warehouse,
};

pub const TOLERANCE: f64 = 1e-6;

pub const DEMANDS: [f64; 8] = [100.0, 150.0, 120.0, 200.0, 180.0, 130.0, 90.0, 110.0];
pub const CAPACITIES: [f64; 5] = [300.0, 350.0, 400.0, 250.0, 300.0];
pub const FIXED_COST: f64 = 1000.0;

pub const DISTANCES: [[f64; 8]; 5] = [
    [80.0, 2700.0, 4100.0, 2400.0, 4400.0, 2700.0, 1500.0, 2500.0],
    [4500.0, 2000.0, 180.0, 2000.0, 500.0, 2000.0, 3500.0, 2000.0],
    [1100.0, 1700.0, 3000.0, 1300.0, 2900.0, 1500.0, 1500.0, 1400.0],
    [2400.0, 300.0, 2100.0, 380.0, 2700.0, 270.0, 1300.0, 400.0],
    [3600.0, 1200.0, 600.0, 1400.0, 1000.0, 1300.0, 2900.0, 1300.0],
];

const WAREHOUSE_NAMES: [(&str, &str); 5] = [
    ("New York", "NY"),
    ("Los Angeles", "CA"),
    ("Chicago", "IL"),
    ("Houston", "TX"),
    ("Phoenix", "AZ"),
];

const CUSTOMER_NAMES: [(&str, &str); 8] = [
    ("Philadelphia", "PA"),
    ("San Antonio", "TX"),
    ("San Diego", "CA"),
    ("Dallas", "TX"),
    ("San Jose", "CA"),
    ("Austin", "TX"),
    ("Jacksonville", "FL"),
    ("Fort Worth", "TX"),
];

/// Capacitated network with a fixed cost of 1000 per warehouse
#[fixture]
pub fn network() -> NetworkData {
    let warehouses = WAREHOUSE_NAMES
        .iter()
        .zip(CAPACITIES)
        .enumerate()
        .map(|(i, (&(city, state), capacity))| {
            Warehouse::new(i as u32 + 1, city, 0.0, 0.0)
                .with_location(city, state)
                .with_capacity(Some(capacity))
                .with_fixed_cost(FIXED_COST)
        });
    let customers = CUSTOMER_NAMES
        .iter()
        .zip(DEMANDS)
        .enumerate()
        .map(|(i, (&(city, state), demand))| {
            Customer::new(i as u32 + 1, city, 0.0, 0.0, demand).with_location(city, state)
        });
    let distances: DistanceMap = DISTANCES
        .iter()
        .enumerate()
        .flat_map(|(w, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, &d)| ((w as u32 + 1, c as u32 + 1), d))
        })
        .collect();
    NetworkData::new(warehouses, customers, distances)
}

/// Same network with every capacity removed
#[fixture]
pub fn uncapacitated_network(network: NetworkData) -> NetworkData {
    let mut data = network;
    data.set_all_capacities(None);
    data
}

#[fixture]
pub fn solver() -> MicroLpSolver {
    MicroLpSolver::new()
}

pub fn solve(problem_type: &str, data: &NetworkData, params: ProblemParameters) -> SolveOutcome {
    let mut optimizer = create_network_optimizer(problem_type, data, params).unwrap();
    optimizer.build_model().unwrap();
    optimizer
        .solve(&MicroLpSolver::new(), &SolverConfig::default())
        .unwrap()
}

pub fn solved(problem_type: &str, data: &NetworkData, params: ProblemParameters) -> NetworkSolution {
    match solve(problem_type, data, params) {
        SolveOutcome::Solved(solution) => *solution,
        other => panic!("{} was not solved: {}", problem_type, other.status()),
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

/// Every customer fully served, and only by open warehouses
pub fn assert_structurally_sound(solution: &NetworkSolution, data: &NetworkData) {
    for &customer in data.customers.keys() {
        assert_close(solution.customer_coverage(customer), 1.0);
    }
    for assignment in &solution.assignments {
        assert!(
            solution.is_active(assignment.warehouse_id),
            "flow from closed warehouse {}",
            assignment.warehouse_id
        );
    }
}
