use tokio_stream::StreamExt;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use super::mappers::{self, netopt, SolveJob};
use crate::domain::{solver_service::SolverService, value_objects::SolverBackend};
use crate::network::{create_network_optimizer, ProblemType, VariantBehavior};
use crate::solver::SolverFactory;

/// gRPC service implementation
pub struct GrpcNetworkService {
    default_backend: SolverBackend,
}

impl GrpcNetworkService {
    pub fn new(default_backend: SolverBackend) -> Self {
        Self { default_backend }
    }
}

impl Default for GrpcNetworkService {
    fn default() -> Self {
        Self::new(SolverBackend::Auto)
    }
}

/// Build, solve and convert; runs on a blocking thread
fn run_job(job: SolveJob) -> Result<netopt::NetworkResult, Status> {
    let solver = SolverFactory::create_from_backend(job.config.backend)
        .map_err(|e| Status::unavailable(e.to_string()))?;
    info!(
        problem_type = %job.problem_type,
        warehouses = job.data.warehouses.len(),
        customers = job.data.customers.len(),
        solver = solver.name(),
        "solving network problem"
    );

    let mut optimizer = create_network_optimizer(&job.problem_type, &job.data, job.params)
        .map_err(mappers::network_error_to_status)?;
    optimizer
        .build_model()
        .map_err(mappers::network_error_to_status)?;
    let outcome = optimizer
        .solve(solver.as_ref(), &job.config)
        .map_err(mappers::network_error_to_status)?;

    info!(status = %outcome.status(), "network problem finished");
    Ok(mappers::outcome_to_proto(
        &outcome,
        &job.problem_type,
        solver.name(),
    ))
}

async fn solve_blocking(job: SolveJob) -> Result<netopt::NetworkResult, Status> {
    tokio::task::spawn_blocking(move || run_job(job))
        .await
        .map_err(|e| Status::internal(format!("Solver task failed: {}", e)))?
}

/// Construction-time checks plus a model build, without solving
fn validate_job(job: SolveJob) -> netopt::ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut result = netopt::ValidationResult::default();

    if job.data.customers.is_empty() {
        warnings.push("Problem has no customers".to_string());
    }

    match create_network_optimizer(&job.problem_type, &job.data, job.params) {
        Ok(mut optimizer) => {
            if let Some(p) = optimizer.variant().fixed_open_count() {
                if p > job.data.warehouses.len() {
                    warnings.push(format!(
                        "{} warehouses requested but only {} candidates exist; model is infeasible",
                        p,
                        job.data.warehouses.len()
                    ));
                }
            }
            if optimizer.variant().enforces_capacity(optimizer.options()) {
                let capacities: Option<f64> =
                    job.data.warehouses.values().map(|w| w.capacity).sum();
                if let Some(total) = capacities {
                    if total < job.data.total_demand() {
                        warnings.push(format!(
                            "Total capacity {} is below total demand {}",
                            total,
                            job.data.total_demand()
                        ));
                    }
                }
            }
            if optimizer.problem_type() == ProblemType::Uflp
                && job.data.warehouses.values().any(|w| w.capacity.is_some())
            {
                warnings.push("UFLP ignores warehouse capacities".to_string());
            }

            match optimizer.build_model() {
                Ok(()) => {
                    if let Some(model) = optimizer.model() {
                        let problem = &model.problem;
                        if let Err(e) = SolverFactory::default_solver().validate(problem) {
                            errors.push(e.to_string());
                        }
                        result.num_variables = problem.num_variables() as u32;
                        result.num_constraints = problem.constraints.len() as u32;
                        result.num_binary_vars = problem.num_binary_variables() as u32;
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }
        Err(e) => errors.push(e.to_string()),
    }

    result.is_valid = errors.is_empty();
    result.errors = errors;
    result.warnings = warnings;
    result
}

fn solver_info(backend: SolverBackend) -> netopt::SolverInfo {
    let (name, capabilities) = match backend {
        SolverBackend::Highs => (
            "HiGHS",
            vec!["Mixed-Integer Programming", "Primal/Dual Simplex", "Time limit", "Presolve"],
        ),
        SolverBackend::CoinCbc => (
            "COIN-OR CBC",
            vec!["Mixed-Integer Programming", "Branch and Cut", "Time limit"],
        ),
        SolverBackend::MicroLp | SolverBackend::Auto => (
            "microlp",
            vec!["Mixed-Integer Programming", "Pure Rust", "Time limit"],
        ),
    };
    netopt::SolverInfo {
        name: name.to_string(),
        backend: mappers::backend_to_proto(backend).into(),
        supports_mip: true,
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
    }
}

#[tonic::async_trait]
impl netopt::network_design_solver_server::NetworkDesignSolver for GrpcNetworkService {
    async fn solve_network(
        &self,
        request: Request<netopt::NetworkProblem>,
    ) -> Result<Response<netopt::NetworkResult>, Status> {
        let job = mappers::proto_to_job(request.into_inner(), self.default_backend)
            .map_err(|e| *e)?;
        let result = solve_blocking(job).await?;
        Ok(Response::new(result))
    }

    async fn solve_network_stream(
        &self,
        request: Request<tonic::Streaming<netopt::NetworkChunk>>,
    ) -> Result<Response<netopt::NetworkResult>, Status> {
        let mut stream = request.into_inner();

        let mut problem = netopt::NetworkProblem::default();
        let mut chunks = 0usize;

        // Collect all chunks
        while let Some(chunk) = stream.next().await {
            chunks += 1;
            match chunk?.chunk {
                Some(netopt::network_chunk::Chunk::Warehouse(w)) => problem.warehouses.push(w),
                Some(netopt::network_chunk::Chunk::Customer(c)) => problem.customers.push(c),
                Some(netopt::network_chunk::Chunk::Distance(d)) => problem.distances.push(d),
                Some(netopt::network_chunk::Chunk::Parameters(p)) => problem.parameters = Some(p),
                Some(netopt::network_chunk::Chunk::SolverConfig(sc)) => {
                    problem.solver_config = Some(sc)
                }
                None => warn!("empty chunk ignored"),
            }
        }
        info!(chunks, "network problem stream received");

        let job = mappers::proto_to_job(problem, self.default_backend).map_err(|e| *e)?;
        let result = solve_blocking(job).await?;
        Ok(Response::new(result))
    }

    async fn validate_network(
        &self,
        request: Request<netopt::NetworkProblem>,
    ) -> Result<Response<netopt::ValidationResult>, Status> {
        let result = match mappers::proto_to_job(request.into_inner(), self.default_backend) {
            Ok(job) => tokio::task::spawn_blocking(move || validate_job(job))
                .await
                .map_err(|e| Status::internal(format!("Validation task failed: {}", e)))?,
            Err(status) => netopt::ValidationResult {
                is_valid: false,
                errors: vec![status.message().to_string()],
                ..Default::default()
            },
        };
        Ok(Response::new(result))
    }

    async fn get_available_solvers(
        &self,
        _request: Request<netopt::Empty>,
    ) -> Result<Response<netopt::AvailableSolvers>, Status> {
        let solvers = SolverFactory::available_backends()
            .into_iter()
            .map(solver_info)
            .collect();
        Ok(Response::new(netopt::AvailableSolvers { solvers }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netopt::network_design_solver_server::NetworkDesignSolver;

    fn problem(problem_type: &str, num_warehouses: u32) -> netopt::NetworkProblem {
        let warehouses = vec![
            netopt::Warehouse {
                id: 1,
                name: "North".to_string(),
                fixed_cost: "100".to_string(),
                ..Default::default()
            },
            netopt::Warehouse {
                id: 2,
                name: "South".to_string(),
                fixed_cost: "100".to_string(),
                ..Default::default()
            },
        ];
        let customers = vec![
            netopt::Customer {
                id: 1,
                name: "A".to_string(),
                demand: 10.0,
                ..Default::default()
            },
            netopt::Customer {
                id: 2,
                name: "B".to_string(),
                demand: 20.0,
                ..Default::default()
            },
        ];
        let distances = [(1, 1, 10.0), (1, 2, 90.0), (2, 1, 80.0), (2, 2, 5.0)]
            .into_iter()
            .map(|(w, c, d)| netopt::Distance {
                warehouse_id: w,
                customer_id: c,
                distance: d,
            })
            .collect();
        netopt::NetworkProblem {
            warehouses,
            customers,
            distances,
            parameters: Some(netopt::ProblemParameters {
                problem_type: problem_type.to_string(),
                num_warehouses,
                ..Default::default()
            }),
            solver_config: Some(netopt::SolverConfig {
                solver: netopt::solver_config::SolverBackend::Microlp.into(),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn solves_small_p_median() {
        let service = GrpcNetworkService::new(SolverBackend::MicroLp);
        let result = service
            .solve_network(Request::new(problem("p-median", 2)))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(result.status, netopt::SolutionStatus::Optimal as i32);
        assert_eq!(result.active_warehouses, vec![1, 2]);
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.solver_used, "microlp");
        assert!(result.report.contains("P-Median optimization results"));
    }

    #[tokio::test]
    async fn unknown_problem_type_is_invalid_argument() {
        let service = GrpcNetworkService::default();
        let status = service
            .solve_network(Request::new(problem("k-center", 1)))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn infeasible_is_a_status_not_an_error() {
        let service = GrpcNetworkService::new(SolverBackend::MicroLp);
        let mut request = problem("UFLP", 0);
        if let Some(p) = request.parameters.as_mut() {
            p.force_closed = vec![1, 2];
        }
        let result = service
            .solve_network(Request::new(request))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(result.status, netopt::SolutionStatus::Infeasible as i32);
        assert!(result.assignments.is_empty());
    }

    #[tokio::test]
    async fn validation_reports_errors_and_warnings() {
        let service = GrpcNetworkService::default();

        let result = service
            .validate_network(Request::new(problem("p-median", 3)))
            .await
            .unwrap()
            .into_inner();
        assert!(result.is_valid);
        assert_eq!(result.num_variables, 6);
        assert!(result.warnings.iter().any(|w| w.contains("3 warehouses requested")));

        let result = service
            .validate_network(Request::new(problem("p-cover", 1)))
            .await
            .unwrap()
            .into_inner();
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("high_service_distance"));
    }

    #[tokio::test]
    async fn lists_compiled_solvers() {
        let service = GrpcNetworkService::default();
        let solvers = service
            .get_available_solvers(Request::new(netopt::Empty {}))
            .await
            .unwrap()
            .into_inner()
            .solvers;
        assert!(solvers.iter().any(|s| s.name == "microlp"));
    }
}
