// HiGHS Solver Adapter
// Translates the domain problem straight into a HiGHS row problem

use crate::domain::{
    models::{OptimizationProblem, Solution as DomainSolution, SolverStatistics},
    solver_service::{conflicting_bounds_outcome, Result, SolverError, SolverService},
    value_objects::{
        ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus, VariableType,
    },
};
use highs::{Col, HighsModelStatus, RowProblem, Sense};
use std::time::Instant;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, problem: &OptimizationProblem) -> Result<DomainSolution> {
        self.validate(problem)?;
        if let Some(outcome) = conflicting_bounds_outcome(problem) {
            return Ok(outcome);
        }

        let start_time = Instant::now();

        let mut pb = RowProblem::default();
        let mut cols: Vec<Col> = Vec::with_capacity(problem.variables.len());

        for (var_def, &obj_coeff) in problem
            .variables
            .iter()
            .zip(&problem.objective.coefficients)
        {
            let lower = var_def.lower_bound;
            let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

            let col = match var_def.variable_type {
                VariableType::Integer | VariableType::Binary => {
                    pb.add_integer_column(obj_coeff, lower..=upper)
                }
                VariableType::Continuous => pb.add_column(obj_coeff, lower..=upper),
            };
            cols.push(col);
        }

        for constraint in &problem.constraints {
            let terms: Vec<(Col, f64)> = constraint
                .terms
                .iter()
                .filter(|(_, coeff)| *coeff != 0.0)
                .map(|&(column, coeff)| (cols[column], coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = if problem.objective.optimization_type == OptimizationType::Maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };

        let config = &problem.solver_config;
        let mut model = pb.optimise(sense);
        model.set_option("output_flag", config.verbose);
        if let Some(seconds) = config.time_limit {
            model.set_option("time_limit", seconds);
        }
        if let Some(gap) = config.gap_tolerance {
            model.set_option("mip_rel_gap", gap);
        }

        let solved = model.solve();
        let statistics =
            SolverStatistics::for_problem(problem, start_time.elapsed().as_secs_f64() * 1000.0);

        let solution = match solved.status() {
            HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => {
                let values = solved.get_solution().columns().to_vec();
                let objective_value = problem.objective.evaluate(&values);
                let mut solution = DomainSolution::optimal(objective_value, values);
                solution.message = format!("Optimal solution found for '{}'", problem.name);
                solution
            }
            HighsModelStatus::Infeasible => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                DomainSolution::new(
                    DomainSolutionStatus::Unbounded,
                    "Problem is unbounded: objective can be improved infinitely",
                )
            }
            HighsModelStatus::ReachedTimeLimit => DomainSolution::new(
                DomainSolutionStatus::TimeLimit,
                "Time limit reached before optimality was proven",
            ),
            HighsModelStatus::ReachedIterationLimit => DomainSolution::new(
                DomainSolutionStatus::NotSolved,
                "Iteration limit reached before optimality was proven",
            ),
            status => {
                return Err(SolverError::ExecutionFailed(format!(
                    "HiGHS solver returned status: {:?}",
                    status
                )))
            }
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
