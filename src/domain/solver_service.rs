// Domain service interface for solving optimization problems
// The network optimizer only talks to solvers through this trait

use super::models::{OptimizationProblem, Solution, SolverStatistics};
use super::value_objects::SolutionStatus;

/// Error types for the solver service
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// Implementations translate an [`OptimizationProblem`] into their own API,
/// run it, and report the raw variable values and status. Non-optimal outcomes
/// (infeasible, time limit) are returned as a [`Solution`] status, not as errors.
pub trait SolverService: Send + Sync {
    /// Solve an optimization problem
    fn solve(&self, problem: &OptimizationProblem) -> Result<Solution>;

    /// Validate a problem without solving it
    fn validate(&self, problem: &OptimizationProblem) -> Result<()> {
        let mut errors = Vec::new();

        let num_vars = problem.num_variables();

        if num_vars == 0 {
            errors.push("Problem must have at least one variable".to_string());
        }

        if problem.variables.len() != num_vars {
            errors.push(format!(
                "Number of variables ({}) doesn't match objective coefficients ({})",
                problem.variables.len(),
                num_vars
            ));
        }

        if let Some(i) = problem
            .objective
            .coefficients
            .iter()
            .position(|c| !c.is_finite())
        {
            errors.push(format!("Objective coefficient {} is not finite", i));
        }

        for constraint in &problem.constraints {
            for &(column, coeff) in &constraint.terms {
                if column >= num_vars {
                    errors.push(format!(
                        "Constraint '{}' references column {} but problem has {} variables",
                        constraint.name, column, num_vars
                    ));
                }
                if !coeff.is_finite() {
                    errors.push(format!(
                        "Constraint '{}' has a non-finite coefficient on column {}",
                        constraint.name, column
                    ));
                }
            }
            if !constraint.bound.is_finite() {
                errors.push(format!(
                    "Constraint '{}' has a non-finite bound",
                    constraint.name
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}

/// Short-circuits problems whose variable bounds already contradict each other.
///
/// Backends disagree on how they treat `lower > upper`, so adapters call this
/// before building their native model.
pub fn conflicting_bounds_outcome(problem: &OptimizationProblem) -> Option<Solution> {
    let variable = problem.first_conflicting_bound()?;
    Some(
        Solution::new(
            SolutionStatus::Infeasible,
            format!(
                "Problem is infeasible: variable '{}' has lower bound {} above upper bound {}",
                variable.name,
                variable.lower_bound,
                variable.upper_bound.unwrap_or(f64::INFINITY)
            ),
        )
        .with_statistics(SolverStatistics::for_problem(problem, 0.0)),
    )
}
