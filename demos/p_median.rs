// Example: p-median and CFLP over five candidate warehouses and eight customers
//
// Runs locally with the pure-Rust microlp backend; no server needed.

use netopt::{
    create_network_optimizer, Customer, DistanceMap, DistanceRanges, Factory, MicroLpSolver,
    NetworkData, OptimizerOptions, PresentationOptions, ProblemParameters, SolveOutcome,
    SolverConfig, Warehouse,
};

const WAREHOUSES: [(u32, &str, f64, f64, f64); 5] = [
    (1, "New York", 40.71, -74.01, 300.0),
    (2, "Los Angeles", 34.05, -118.24, 350.0),
    (3, "Chicago", 41.88, -87.63, 400.0),
    (4, "Houston", 29.76, -95.37, 250.0),
    (5, "Phoenix", 33.45, -112.07, 300.0),
];

const CUSTOMERS: [(u32, &str, f64, f64, f64); 8] = [
    (1, "Philadelphia", 39.95, -75.17, 100.0),
    (2, "San Antonio", 29.42, -98.49, 150.0),
    (3, "San Diego", 32.72, -117.16, 120.0),
    (4, "Dallas", 32.78, -96.80, 200.0),
    (5, "San Jose", 37.34, -121.89, 180.0),
    (6, "Austin", 30.27, -97.74, 130.0),
    (7, "Jacksonville", 30.33, -81.66, 90.0),
    (8, "Fort Worth", 32.76, -97.33, 110.0),
];

const DISTANCES: [[f64; 8]; 5] = [
    [80.0, 2700.0, 4100.0, 2400.0, 4400.0, 2700.0, 1500.0, 2500.0],
    [4500.0, 2000.0, 180.0, 2000.0, 500.0, 2000.0, 3500.0, 2000.0],
    [1100.0, 1700.0, 3000.0, 1300.0, 2900.0, 1500.0, 1500.0, 1400.0],
    [2400.0, 300.0, 2100.0, 380.0, 2700.0, 270.0, 1300.0, 400.0],
    [3600.0, 1200.0, 600.0, 1400.0, 1000.0, 1300.0, 2900.0, 1300.0],
];

fn sample_network() -> NetworkData {
    let warehouses = WAREHOUSES.iter().map(|&(id, name, lat, lon, capacity)| {
        Warehouse::new(id, name, lat, lon)
            .with_capacity(Some(capacity))
            .with_fixed_cost(1000.0)
    });
    let customers = CUSTOMERS
        .iter()
        .map(|&(id, name, lat, lon, demand)| Customer::new(id, name, lat, lon, demand));
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
        .with_factories([Factory::new(1, "Memphis plant", 35.15, -90.05)])
}

fn run(
    problem_type: &str,
    data: &NetworkData,
    params: ProblemParameters,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut optimizer = create_network_optimizer(problem_type, data, params)?;
    optimizer.build_model()?;
    match optimizer.solve(&MicroLpSolver::new(), &SolverConfig::default())? {
        SolveOutcome::Solved(solution) => println!("{}", solution.report()),
        other => println!("{}: no solution ({})", problem_type, other.status()),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data = sample_network();
    let options = OptimizerOptions::default()
        .with_force_uncapacitated(true)
        .with_unit_transport_cost(0.12)
        .with_distance_ranges(DistanceRanges::new([500.0, 1000.0, 2000.0])?);

    println!("=== p-median, two warehouses ===\n");
    run(
        "p-median",
        &data,
        ProblemParameters::default()
            .with_num_warehouses(2)
            .with_options(options.clone())
            .with_presentation(PresentationOptions::default().with_option("map_style", "light")),
    )?;

    println!("=== capacitated FLP ===\n");
    run(
        "CFLP",
        &data,
        ProblemParameters::default().with_options(options),
    )?;

    Ok(())
}
