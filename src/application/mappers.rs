// Mappers: Convert between gRPC protobuf types and the network model
// Keeps protobuf types out of the optimizer core

use tonic::Status;

use crate::domain::{
    models::{SolverConfig, SolverStatistics},
    solver_service::SolverError,
    value_objects::{SolutionStatus, SolverBackend},
};
use crate::network::{
    Assignment, Customer, DistanceMap, DistanceRanges, DistanceStatistics, NetworkData,
    NetworkError, NetworkSolution, OptimizerOptions, PMedianObjective, PresentationOptions,
    ProblemParameters, SolveOutcome, VariantSummary, Warehouse, WarehouseUsage,
};

pub mod netopt {
    tonic::include_proto!("netopt");
}

use netopt as proto;

/// Everything needed to run one optimization, decoded from the wire
#[derive(Debug, Clone)]
pub struct SolveJob {
    pub problem_type: String,
    pub data: NetworkData,
    pub params: ProblemParameters,
    pub config: SolverConfig,
}

pub fn proto_to_warehouse(proto_w: &proto::Warehouse) -> Warehouse {
    let mut warehouse = Warehouse::new(
        proto_w.id,
        proto_w.name.clone(),
        proto_w.latitude,
        proto_w.longitude,
    )
    .with_location(proto_w.city.clone(), proto_w.state.clone())
    .with_capacity(proto_w.capacity)
    .with_fixed_cost_str(&proto_w.fixed_cost);
    if !proto_w.zipcode.is_empty() {
        warehouse = warehouse.with_zipcode(proto_w.zipcode.clone());
    }
    warehouse
}

pub fn proto_to_customer(proto_c: &proto::Customer) -> Customer {
    let mut customer = Customer::new(
        proto_c.id,
        proto_c.name.clone(),
        proto_c.latitude,
        proto_c.longitude,
        proto_c.demand,
    )
    .with_location(proto_c.city.clone(), proto_c.state.clone());
    if !proto_c.zipcode.is_empty() {
        customer = customer.with_zipcode(proto_c.zipcode.clone());
    }
    customer
}

pub fn proto_to_network_data(
    warehouses: &[proto::Warehouse],
    customers: &[proto::Customer],
    distances: &[proto::Distance],
) -> NetworkData {
    let distances: DistanceMap = distances
        .iter()
        .map(|d| ((d.warehouse_id, d.customer_id), d.distance))
        .collect();
    NetworkData::new(
        warehouses.iter().map(proto_to_warehouse),
        customers.iter().map(proto_to_customer),
        distances,
    )
}

/// Zero means "not set" for the optional distances
fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

/// Convert protobuf parameters into the problem-type tag and typed parameters
pub fn proto_to_parameters(
    proto_p: proto::ProblemParameters,
) -> std::result::Result<(String, ProblemParameters), Box<Status>> {
    let objective_function: PMedianObjective = proto_p
        .objective_function
        .parse()
        .map_err(|e: NetworkError| Box::new(Status::invalid_argument(e.to_string())))?;

    let distance_ranges = DistanceRanges::new(proto_p.distance_ranges)
        .map_err(|e| Box::new(Status::invalid_argument(e.to_string())))?;

    let defaults = OptimizerOptions::default();
    let options = OptimizerOptions {
        force_open: proto_p.force_open,
        force_closed: proto_p.force_closed,
        force_allocations: proto_p
            .force_allocations
            .iter()
            .map(|a| (a.warehouse_id, a.customer_id))
            .collect(),
        mutually_exclusive: proto_p
            .mutually_exclusive
            .into_iter()
            .map(|g| g.warehouse_ids)
            .collect(),
        single_sourcing: proto_p.single_sourcing.unwrap_or(defaults.single_sourcing),
        force_uncapacitated: proto_p.force_uncapacitated,
        ignore_fixed_cost: proto_p.ignore_fixed_cost,
        unit_transport_cost: proto_p
            .unit_transport_cost
            .unwrap_or(defaults.unit_transport_cost),
        distance_ranges,
    };

    let params = ProblemParameters {
        objective_function,
        num_warehouses: proto_p.num_warehouses as usize,
        high_service_distance: positive(proto_p.high_service_distance),
        avg_service_distance: positive(proto_p.avg_service_distance),
        max_service_distance: positive(proto_p.max_service_distance),
        options,
        presentation: PresentationOptions {
            radius: None,
            extra: proto_p.presentation.into_iter().collect(),
        },
    };

    Ok((proto_p.problem_type, params))
}

pub fn proto_to_backend(backend: i32, default_backend: SolverBackend) -> SolverBackend {
    match proto::solver_config::SolverBackend::try_from(backend) {
        Ok(proto::solver_config::SolverBackend::Auto) | Err(_) => default_backend,
        Ok(proto::solver_config::SolverBackend::CoinCbc) => SolverBackend::CoinCbc,
        Ok(proto::solver_config::SolverBackend::Highs) => SolverBackend::Highs,
        Ok(proto::solver_config::SolverBackend::Microlp) => SolverBackend::MicroLp,
    }
}

pub fn backend_to_proto(backend: SolverBackend) -> proto::solver_config::SolverBackend {
    match backend {
        SolverBackend::Auto => proto::solver_config::SolverBackend::Auto,
        SolverBackend::CoinCbc => proto::solver_config::SolverBackend::CoinCbc,
        SolverBackend::Highs => proto::solver_config::SolverBackend::Highs,
        SolverBackend::MicroLp => proto::solver_config::SolverBackend::Microlp,
    }
}

pub fn proto_to_solver_config(
    proto_cfg: Option<proto::SolverConfig>,
    default_backend: SolverBackend,
) -> SolverConfig {
    let config = SolverConfig::default().with_backend(default_backend);
    match proto_cfg {
        Some(cfg) => {
            let mut config = config
                .with_backend(proto_to_backend(cfg.solver, default_backend))
                .with_verbose(cfg.verbose);
            if cfg.time_limit > 0.0 {
                config = config.with_time_limit(cfg.time_limit);
            }
            config
        }
        None => config,
    }
}

/// Convert a full protobuf request into a solve job
pub fn proto_to_job(
    proto_prob: proto::NetworkProblem,
    default_backend: SolverBackend,
) -> std::result::Result<SolveJob, Box<Status>> {
    let parameters = proto_prob
        .parameters
        .ok_or_else(|| Box::new(Status::invalid_argument("Parameters are required")))?;
    let (problem_type, params) = proto_to_parameters(parameters)?;

    Ok(SolveJob {
        problem_type,
        data: proto_to_network_data(
            &proto_prob.warehouses,
            &proto_prob.customers,
            &proto_prob.distances,
        ),
        params,
        config: proto_to_solver_config(proto_prob.solver_config, default_backend),
    })
}

/// Map optimizer errors onto gRPC status codes
pub fn network_error_to_status(error: NetworkError) -> Status {
    match error {
        NetworkError::Solver(SolverError::SolverNotAvailable(msg)) => Status::unavailable(msg),
        NetworkError::Solver(SolverError::ExecutionFailed(msg)) => {
            Status::internal(format!("Solver error: {}", msg))
        }
        NetworkError::ModelNotBuilt => Status::internal(error.to_string()),
        other => Status::invalid_argument(other.to_string()),
    }
}

pub fn domain_to_proto_status(status: SolutionStatus) -> proto::SolutionStatus {
    match status {
        SolutionStatus::Optimal => proto::SolutionStatus::Optimal,
        SolutionStatus::Feasible => proto::SolutionStatus::Feasible,
        SolutionStatus::Infeasible => proto::SolutionStatus::Infeasible,
        SolutionStatus::Unbounded => proto::SolutionStatus::Unbounded,
        SolutionStatus::TimeLimit => proto::SolutionStatus::TimeLimit,
        SolutionStatus::NotSolved => proto::SolutionStatus::NotSolved,
        SolutionStatus::Error => proto::SolutionStatus::Error,
    }
}

fn assignment_to_proto(a: &Assignment) -> proto::Assignment {
    proto::Assignment {
        warehouse_id: a.warehouse_id,
        warehouse_name: a.warehouse_name.clone(),
        customer_id: a.customer_id,
        customer_name: a.customer_name.clone(),
        customer_demand: a.customer_demand,
        flow: a.flow,
        distance: a.distance,
        warehouse_latitude: a.warehouse_latitude,
        warehouse_longitude: a.warehouse_longitude,
        customer_latitude: a.customer_latitude,
        customer_longitude: a.customer_longitude,
    }
}

fn statistics_to_proto(stats: &DistanceStatistics) -> proto::DistanceStatistics {
    proto::DistanceStatistics {
        demand_by_range: stats
            .demand_by_range
            .iter()
            .map(|r| proto::RangeShare {
                lower: r.lower,
                upper: r.upper,
                share: r.share,
            })
            .collect(),
        most_distant_customer: stats.most_distant_customer,
        avg_weighted_distance: stats.avg_weighted_distance,
        avg_customer_distance: stats.avg_customer_distance,
    }
}

fn usage_to_proto(usage: &WarehouseUsage) -> proto::WarehouseUsage {
    proto::WarehouseUsage {
        warehouse_id: usage.warehouse_id,
        customers_served: usage.customers_served as u32,
        outflow: usage.outflow,
        capacity: usage.capacity,
        utilization: usage.utilization,
    }
}

fn solver_statistics_to_proto(stats: &SolverStatistics) -> proto::SolveStatistics {
    proto::SolveStatistics {
        solve_time_ms: stats.solve_time_ms,
        num_variables: stats.num_variables,
        num_constraints: stats.num_constraints,
        num_integer_vars: stats.num_integer_vars,
        num_binary_vars: stats.num_binary_vars,
    }
}

fn costs_to_proto(summary: &VariantSummary) -> Option<proto::CostBreakdown> {
    match summary {
        VariantSummary::PMedianCost { costs, .. }
        | VariantSummary::FacilityLocation { costs, .. } => Some(proto::CostBreakdown {
            transport: costs.transport,
            fixed: costs.fixed,
        }),
        VariantSummary::PMedianDistance { .. } | VariantSummary::PCover { .. } => None,
    }
}

fn solution_to_proto(solution: &NetworkSolution, solver_name: &str) -> proto::NetworkResult {
    proto::NetworkResult {
        status: domain_to_proto_status(solution.status).into(),
        message: "Optimal solution found".to_string(),
        problem_type: solution.problem_type.to_string(),
        objective_value: solution.objective_value,
        active_warehouses: solution.active_warehouses.iter().copied().collect(),
        assignments: solution.assignments.iter().map(assignment_to_proto).collect(),
        distance_statistics: solution.distance_statistics.as_ref().map(statistics_to_proto),
        multi_sourced_customers: solution
            .multi_sourced_customers
            .iter()
            .map(|(&c, &n)| (c, n as u32))
            .collect(),
        warehouse_usage: solution.warehouse_usage.iter().map(usage_to_proto).collect(),
        costs: costs_to_proto(&solution.summary),
        radius: solution.presentation.radius,
        report: solution.report().to_string(),
        solver_used: solver_name.to_string(),
        statistics: Some(solver_statistics_to_proto(&solution.solver_statistics)),
    }
}

/// Convert a solve outcome to the protobuf result
pub fn outcome_to_proto(
    outcome: &SolveOutcome,
    problem_type: &str,
    solver_name: &str,
) -> proto::NetworkResult {
    match outcome {
        SolveOutcome::Solved(solution) => solution_to_proto(solution, solver_name),
        SolveOutcome::Infeasible | SolveOutcome::NotSolved(_) => proto::NetworkResult {
            status: domain_to_proto_status(outcome.status()).into(),
            message: format!("No solution available ({})", outcome.status()),
            problem_type: problem_type.to_string(),
            solver_used: solver_name.to_string(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parameters(problem_type: &str) -> proto::ProblemParameters {
        proto::ProblemParameters {
            problem_type: problem_type.to_string(),
            num_warehouses: 2,
            ..Default::default()
        }
    }

    #[test]
    fn zero_means_unset_for_service_distances() {
        let mut p = parameters("p-cover");
        p.high_service_distance = 1000.0;
        let (tag, params) = proto_to_parameters(p).unwrap();

        assert_eq!(tag, "p-cover");
        assert_eq!(params.high_service_distance, Some(1000.0));
        assert_eq!(params.avg_service_distance, None);
        assert_eq!(params.max_service_distance, None);
        assert!(params.options.single_sourcing);
        assert_eq!(params.options.unit_transport_cost, 0.1);
    }

    #[test]
    fn bad_ranges_are_invalid_argument() {
        let mut p = parameters("p-median");
        p.distance_ranges = vec![800.0, 300.0];
        let status = proto_to_parameters(p).unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[test]
    fn unknown_objective_function_is_rejected() {
        let mut p = parameters("p-median");
        p.objective_function = "maxcover".to_string();
        assert!(proto_to_parameters(p).is_err());
    }

    #[test]
    fn textual_fixed_cost_is_parsed() {
        let w = proto_to_warehouse(&proto::Warehouse {
            id: 4,
            name: "Houston".to_string(),
            fixed_cost: "1000".to_string(),
            capacity: Some(250.0),
            ..Default::default()
        });
        assert_eq!(w.fixed_cost, 1000.0);
        assert_eq!(w.capacity, Some(250.0));

        let w = proto_to_warehouse(&proto::Warehouse::default());
        assert_eq!(w.fixed_cost, 0.0);
        assert_eq!(w.zipcode, None);
    }

    #[test]
    fn solver_config_defaults() {
        let config = proto_to_solver_config(None, SolverBackend::MicroLp);
        assert_eq!(config.backend, SolverBackend::MicroLp);
        assert_eq!(config.time_limit, Some(SolverConfig::DEFAULT_TIME_LIMIT));

        let config = proto_to_solver_config(
            Some(proto::SolverConfig {
                solver: proto::solver_config::SolverBackend::Highs.into(),
                time_limit: 30.0,
                verbose: true,
            }),
            SolverBackend::MicroLp,
        );
        assert_eq!(config.backend, SolverBackend::Highs);
        assert_eq!(config.time_limit, Some(30.0));
        assert!(config.verbose);
    }
}
