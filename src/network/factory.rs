use tracing::{info, warn};

use crate::domain::{SolverConfig, SolverService};

use super::config::{OptimizerOptions, PresentationOptions};
use super::entities::NetworkData;
use super::error::Result;
use super::optimizer::NetworkOptimizer;
use super::solution::SolveOutcome;
use super::variants::{
    Cflp, PCover, PMedian, PMedianObjective, ProblemType, ProblemVariant, Uflp, VariantBehavior,
};

/// Caller-supplied parameters for any problem type.
///
/// Fields a formulation does not use are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProblemParameters {
    /// p-median only
    pub objective_function: PMedianObjective,
    /// Required (non-zero) for p-median and p-cover
    pub num_warehouses: usize,
    /// Required for p-cover
    pub high_service_distance: Option<f64>,
    pub avg_service_distance: Option<f64>,
    pub max_service_distance: Option<f64>,
    pub options: OptimizerOptions,
    pub presentation: PresentationOptions,
}

impl ProblemParameters {
    pub fn with_num_warehouses(mut self, num_warehouses: usize) -> Self {
        self.num_warehouses = num_warehouses;
        self
    }

    pub fn with_objective_function(mut self, objective_function: PMedianObjective) -> Self {
        self.objective_function = objective_function;
        self
    }

    pub fn with_high_service_distance(mut self, distance: f64) -> Self {
        self.high_service_distance = Some(distance);
        self
    }

    pub fn with_avg_service_distance(mut self, distance: f64) -> Self {
        self.avg_service_distance = Some(distance);
        self
    }

    pub fn with_max_service_distance(mut self, distance: f64) -> Self {
        self.max_service_distance = Some(distance);
        self
    }

    pub fn with_options(mut self, options: OptimizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_presentation(mut self, presentation: PresentationOptions) -> Self {
        self.presentation = presentation;
        self
    }
}

impl ProblemVariant {
    /// Pick and validate the formulation for `problem_type`
    pub fn from_parameters(problem_type: ProblemType, params: &ProblemParameters) -> Result<Self> {
        let variant = match problem_type {
            ProblemType::PMedian => ProblemVariant::PMedian(PMedian {
                num_warehouses: params.num_warehouses,
                objective: params.objective_function,
            }),
            ProblemType::PCover => ProblemVariant::PCover(PCover {
                num_warehouses: params.num_warehouses,
                high_service_distance: params.high_service_distance.unwrap_or(0.0),
                avg_service_distance: params.avg_service_distance,
                max_service_distance: params.max_service_distance,
            }),
            ProblemType::Uflp => ProblemVariant::Uflp(Uflp),
            ProblemType::Cflp => ProblemVariant::Cflp(Cflp),
        };
        variant.validate()?;
        Ok(variant)
    }
}

/// Build an optimizer for a problem-type tag ("p-median", "p-cover", "UFLP", "CFLP")
pub fn create_network_optimizer<'a>(
    problem_type: &str,
    data: &'a NetworkData,
    params: ProblemParameters,
) -> Result<NetworkOptimizer<'a>> {
    let problem_type: ProblemType = problem_type.parse()?;
    info!(%problem_type, "creating optimizer");

    let variant = ProblemVariant::from_parameters(problem_type, &params)?;
    NetworkOptimizer::new(data, variant, params.options, params.presentation)
}

/// Create, build and solve in one call, logging the report on success
pub fn solve_network_optimization(
    problem_type: &str,
    data: &NetworkData,
    params: ProblemParameters,
    solver: &dyn SolverService,
    config: &SolverConfig,
) -> Result<SolveOutcome> {
    let mut optimizer = create_network_optimizer(problem_type, data, params)?;
    optimizer.build_model()?;
    let outcome = optimizer.solve(solver, config)?;

    match outcome.solution() {
        Some(solution) => info!("\n{}", solution.report()),
        None => warn!(status = %outcome.status(), "no solution available"),
    }
    Ok(outcome)
}
