// microlp adapter: pure Rust branch-and-bound through good_lp
// Always compiled, so the optimizer works without any native solver library.
// The solve runs on a worker thread so the configured time limit is honored.

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{conflicting_bounds_outcome, Result, SolverError, SolverService},
    value_objects::{OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use crate::solver::lp_translation::{translate, GoodLpModel};
use good_lp::{solvers::microlp::microlp, ResolutionError, Solution as _, SolverModel};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

pub struct MicroLpSolver;

impl MicroLpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicroLpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for MicroLpSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;
        if let Some(outcome) = conflicting_bounds_outcome(problem) {
            return Ok(outcome);
        }
        let time_limit = problem
            .solver_config
            .time_limit
            .map(|seconds| {
                Duration::try_from_secs_f64(seconds).map_err(|_| {
                    SolverError::InvalidProblem(format!("Invalid time limit: {}", seconds))
                })
            })
            .transpose()?;

        let start_time = Instant::now();
        let model = translate(problem);
        let direction = problem.objective.optimization_type;

        // microlp cannot be interrupted; on timeout the worker is left to finish alone
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("microlp".to_string())
            .spawn(move || {
                let _ = tx.send(run_microlp(model, direction));
            })
            .map_err(|e| SolverError::ExecutionFailed(format!("Cannot start microlp: {}", e)))?;

        let received = match time_limit {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(RecvTimeoutError::from),
        };

        let statistics =
            SolverStatistics::for_problem(problem, start_time.elapsed().as_secs_f64() * 1000.0);

        let solution = match received {
            Ok(WorkerOutcome::Values(values)) => {
                let objective_value = problem.objective.evaluate(&values);
                let mut solution = DomainSolution::optimal(objective_value, values);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                solution
            }
            Ok(WorkerOutcome::Infeasible) => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Ok(WorkerOutcome::Unbounded) => DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            Ok(WorkerOutcome::Failed(reason)) => DomainSolution::new(
                DomainSolutionStatus::NotSolved,
                format!("microlp stopped without a solution: {}", reason),
            ),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    time_limit = ?problem.solver_config.time_limit,
                    "microlp exceeded its time limit"
                );
                DomainSolution::new(
                    DomainSolutionStatus::TimeLimit,
                    "Time limit reached before microlp finished",
                )
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SolverError::ExecutionFailed(
                    "microlp worker stopped without a result".to_string(),
                ))
            }
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "microlp"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

/// Result of a microlp run, detached from good_lp types so it can cross threads
enum WorkerOutcome {
    Values(Vec<f64>),
    Infeasible,
    Unbounded,
    Failed(String),
}

fn run_microlp(model: GoodLpModel, direction: OptimizationType) -> WorkerOutcome {
    let GoodLpModel {
        vars,
        columns,
        objective,
        constraints,
    } = model;

    let unsolved = match direction {
        OptimizationType::Maximize => vars.maximise(objective),
        OptimizationType::Minimize => vars.minimise(objective),
    };
    match unsolved.using(microlp).with_all(constraints).solve() {
        Ok(sol) => WorkerOutcome::Values(columns.iter().map(|&col| sol.value(col)).collect()),
        Err(ResolutionError::Infeasible) => WorkerOutcome::Infeasible,
        Err(ResolutionError::Unbounded) => WorkerOutcome::Unbounded,
        Err(e) => WorkerOutcome::Failed(e.to_string()),
    }
}
