//! Kept in its own test binary: an abandoned microlp worker ends with the process.

use netopt::{
    create_network_optimizer, Customer, DistanceMap, MicroLpSolver, NetworkData,
    ProblemParameters, SolutionStatus, SolveOutcome, SolverConfig, Warehouse,
};

/// Deterministic scatter of points on a 1000 x 1000 square
fn scatter(count: u32, seed: u64) -> Vec<(f64, f64)> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64 * 1000.0
    };
    (0..count).map(|_| (next(), next())).collect()
}

fn large_network() -> NetworkData {
    let sites = scatter(25, 7);
    let towns = scatter(80, 11);
    let mut distances = DistanceMap::new();
    for (w, &(wx, wy)) in sites.iter().enumerate() {
        for (c, &(cx, cy)) in towns.iter().enumerate() {
            distances.insert(w as u32 + 1, c as u32 + 1, (wx - cx).hypot(wy - cy));
        }
    }
    let warehouses = sites
        .iter()
        .enumerate()
        .map(|(w, &(x, y))| Warehouse::new(w as u32 + 1, format!("Site {}", w + 1), x, y));
    let customers = towns.iter().enumerate().map(|(c, &(x, y))| {
        Customer::new(
            c as u32 + 1,
            format!("Town {}", c + 1),
            x,
            y,
            10.0 + (c % 7) as f64 * 15.0,
        )
    });
    NetworkData::new(warehouses, customers, distances)
}

#[test]
fn microlp_stops_at_the_time_limit() {
    let data = large_network();
    let params = ProblemParameters::default().with_num_warehouses(5);
    let mut optimizer = create_network_optimizer("p-median", &data, params).unwrap();
    optimizer.build_model().unwrap();

    let started = std::time::Instant::now();
    let outcome = optimizer
        .solve(
            &MicroLpSolver::new(),
            &SolverConfig::default().with_time_limit(0.05),
        )
        .unwrap();

    assert!(matches!(
        outcome,
        SolveOutcome::NotSolved(SolutionStatus::TimeLimit)
    ));
    assert!(outcome.solution().is_none());
    assert!(started.elapsed().as_secs_f64() < 5.0);
}
