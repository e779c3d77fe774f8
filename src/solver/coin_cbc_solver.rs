// COIN-OR CBC adapter through good_lp

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{conflicting_bounds_outcome, Result, SolverService},
    value_objects::{OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use crate::solver::lp_translation::{translate, GoodLpModel};
use good_lp::{solvers::coin_cbc::coin_cbc, ResolutionError, Solution as _, SolverModel};
use std::time::Instant;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;
        if let Some(outcome) = conflicting_bounds_outcome(problem) {
            return Ok(outcome);
        }

        let start_time = Instant::now();
        let GoodLpModel {
            vars,
            columns,
            objective,
            constraints,
        } = translate(problem);

        let unsolved = match problem.objective.optimization_type {
            OptimizationType::Maximize => vars.maximise(objective),
            OptimizationType::Minimize => vars.minimise(objective),
        };
        let mut lp_model = unsolved.using(coin_cbc);

        let config = &problem.solver_config;
        if let Some(seconds) = config.time_limit {
            lp_model.set_parameter("seconds", &seconds.to_string());
        }
        if let Some(gap) = config.gap_tolerance {
            lp_model.set_parameter("ratioGap", &gap.to_string());
        }
        lp_model.set_parameter("logLevel", if config.verbose { "1" } else { "0" });

        let solution_result = lp_model.with_all(constraints).solve();
        let statistics =
            SolverStatistics::for_problem(problem, start_time.elapsed().as_secs_f64() * 1000.0);

        let solution = match solution_result {
            Ok(sol) if sol.model().is_seconds_limit_reached() => DomainSolution::new(
                DomainSolutionStatus::TimeLimit,
                "Time limit reached before optimality was proven",
            ),
            Ok(sol) => {
                let values: Vec<f64> = columns.iter().map(|&col| sol.value(col)).collect();
                let objective_value = problem.objective.evaluate(&values);
                let mut solution = DomainSolution::optimal(objective_value, values);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                solution
            }
            Err(ResolutionError::Infeasible) => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            Err(ResolutionError::Unbounded) => DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            Err(e) => DomainSolution::new(
                DomainSolutionStatus::NotSolved,
                format!("CBC stopped without a solution: {}", e),
            ),
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
