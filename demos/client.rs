// Example: p-cover over gRPC streaming
//
// Start the server first: cargo run --features server --bin netopt-server

use futures::stream;
use tonic::Request;

pub mod netopt {
    tonic::include_proto!("netopt");
}

use netopt::{
    network_chunk::Chunk, network_design_solver_client::NetworkDesignSolverClient,
    solver_config::SolverBackend, Customer, Distance, Empty, NetworkChunk, NetworkProblem,
    ProblemParameters, SolutionStatus, SolverConfig, Warehouse,
};

const WAREHOUSES: [(u32, &str, f64, f64); 5] = [
    (1, "New York", 40.71, -74.01),
    (2, "Los Angeles", 34.05, -118.24),
    (3, "Chicago", 41.88, -87.63),
    (4, "Houston", 29.76, -95.37),
    (5, "Phoenix", 33.45, -112.07),
];

const CUSTOMERS: [(u32, &str, f64); 8] = [
    (1, "Philadelphia", 100.0),
    (2, "San Antonio", 150.0),
    (3, "San Diego", 120.0),
    (4, "Dallas", 200.0),
    (5, "San Jose", 180.0),
    (6, "Austin", 130.0),
    (7, "Jacksonville", 90.0),
    (8, "Fort Worth", 110.0),
];

const DISTANCES: [[f64; 8]; 5] = [
    [80.0, 2700.0, 4100.0, 2400.0, 4400.0, 2700.0, 1500.0, 2500.0],
    [4500.0, 2000.0, 180.0, 2000.0, 500.0, 2000.0, 3500.0, 2000.0],
    [1100.0, 1700.0, 3000.0, 1300.0, 2900.0, 1500.0, 1500.0, 1400.0],
    [2400.0, 300.0, 2100.0, 380.0, 2700.0, 270.0, 1300.0, 400.0],
    [3600.0, 1200.0, 600.0, 1400.0, 1000.0, 1300.0, 2900.0, 1300.0],
];

fn parameters() -> ProblemParameters {
    ProblemParameters {
        problem_type: "p-cover".to_string(),
        num_warehouses: 2,
        high_service_distance: 1000.0,
        distance_ranges: vec![500.0, 1000.0, 2000.0],
        force_uncapacitated: true,
        ..Default::default()
    }
}

fn create_chunks() -> Vec<NetworkChunk> {
    let warehouses = WAREHOUSES.iter().map(|&(id, name, latitude, longitude)| {
        Chunk::Warehouse(Warehouse {
            id,
            name: name.to_string(),
            latitude,
            longitude,
            fixed_cost: "1000".to_string(),
            ..Default::default()
        })
    });
    let customers = CUSTOMERS.iter().map(|&(id, name, demand)| {
        Chunk::Customer(Customer {
            id,
            name: name.to_string(),
            demand,
            ..Default::default()
        })
    });
    let distances = DISTANCES.iter().enumerate().flat_map(|(w, row)| {
        row.iter().enumerate().map(move |(c, &distance)| {
            Chunk::Distance(Distance {
                warehouse_id: w as u32 + 1,
                customer_id: c as u32 + 1,
                distance,
            })
        })
    });
    let settings = [
        Chunk::Parameters(parameters()),
        Chunk::SolverConfig(SolverConfig {
            solver: SolverBackend::Auto.into(),
            time_limit: 60.0,
            verbose: false,
        }),
    ];

    warehouses
        .chain(customers)
        .chain(distances)
        .chain(settings)
        .map(|chunk| NetworkChunk { chunk: Some(chunk) })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut client = NetworkDesignSolverClient::connect("http://127.0.0.1:50051").await?;

    let solvers = client
        .get_available_solvers(Request::new(Empty {}))
        .await?
        .into_inner()
        .solvers;
    println!("Available solvers:");
    for solver in &solvers {
        println!("  - {} ({})", solver.name, solver.capabilities.join(", "));
    }

    // An incomplete request is reported, not solved
    let validation = client
        .validate_network(Request::new(NetworkProblem {
            parameters: Some(ProblemParameters {
                high_service_distance: 0.0,
                ..parameters()
            }),
            ..Default::default()
        }))
        .await?
        .into_inner();
    println!("\nValidation of a p-cover request without radius:");
    for error in &validation.errors {
        println!("  ✗ {}", error);
    }

    let chunks = create_chunks();
    println!("\nStreaming {} chunks...", chunks.len());
    let result = client
        .solve_network_stream(Request::new(stream::iter(chunks)))
        .await?
        .into_inner();

    match SolutionStatus::try_from(result.status) {
        Ok(SolutionStatus::Optimal) => {
            println!("{}", result.report);
            println!("Solved by {}", result.solver_used);
        }
        _ => println!("✗ No solution: {}", result.message),
    }

    Ok(())
}
