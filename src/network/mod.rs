// Network design module: facility-location formulations on top of the solver seam

pub mod config;
pub mod distance;
pub mod entities;
pub mod error;
pub mod factory;
pub mod optimizer;
pub mod report;
pub mod solution;
pub mod variants;

pub use config::{DistanceRanges, OptimizerOptions, PresentationOptions};
pub use distance::DistanceMap;
pub use entities::{Customer, CustomerId, Factory, FactoryId, NetworkData, Warehouse, WarehouseId};
pub use error::NetworkError;
pub use factory::{create_network_optimizer, solve_network_optimization, ProblemParameters};
pub use optimizer::{BuiltModel, ModelContext, ModelIndex, NetworkOptimizer};
pub use report::SolutionReport;
pub use solution::{
    Assignment, CostBreakdown, DistanceStatistics, NetworkSolution, RangeShare, SolveOutcome,
    VariantSummary, WarehouseUsage,
};
pub use variants::{
    Cflp, PCover, PMedian, PMedianObjective, ProblemType, ProblemVariant, Uflp, VariantBehavior,
};
