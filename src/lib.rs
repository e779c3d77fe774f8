// Domain layer: solver-neutral linear model and the solver seam
pub mod domain;

// Network design: facility-location formulations built on the domain model
pub mod network;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Application layer: gRPC service and protobuf mappers
#[cfg(feature = "server")]
pub mod application;

// Infrastructure layer: External concerns (gRPC, server)
#[cfg(feature = "server")]
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    OptimizationProblem, Solution, SolutionStatus, SolverBackend, SolverConfig, SolverError,
    SolverService,
};

pub use network::{
    create_network_optimizer, solve_network_optimization, Customer, DistanceMap, DistanceRanges,
    Factory, NetworkData, NetworkError, NetworkOptimizer, NetworkSolution, OptimizerOptions,
    PMedianObjective, PresentationOptions, ProblemParameters, ProblemType, ProblemVariant,
    SolveOutcome, Warehouse,
};

pub use solver::{MicroLpSolver, SolverFactory};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;

#[cfg(feature = "highs")]
pub use solver::HighsSolver;

#[cfg(feature = "server")]
pub use application::GrpcNetworkService;

#[cfg(feature = "server")]
pub use infrastructure::{start_server, ServerConfig};
