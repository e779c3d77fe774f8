// Translation of the domain problem into good_lp expressions
// Shared by every adapter that goes through good_lp

use crate::domain::{ConstraintType, OptimizationProblem, VariableType};
use good_lp::{variable, Constraint, Expression, ProblemVariables, Variable};

pub(crate) struct GoodLpModel {
    pub vars: ProblemVariables,
    pub columns: Vec<Variable>,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
}

pub(crate) fn translate(problem: &OptimizationProblem) -> GoodLpModel {
    let mut vars = ProblemVariables::new();
    let mut columns = Vec::with_capacity(problem.variables.len());

    for var_def in &problem.variables {
        let lower = var_def.lower_bound;
        let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);

        let column = match var_def.variable_type {
            VariableType::Binary | VariableType::Integer => vars.add(
                variable()
                    .integer()
                    .min(lower)
                    .max(upper)
                    .name(var_def.name.clone()),
            ),
            VariableType::Continuous => {
                vars.add(variable().min(lower).max(upper).name(var_def.name.clone()))
            }
        };
        columns.push(column);
    }

    let mut objective: Expression = 0.into();
    for (i, &coeff) in problem.objective.coefficients.iter().enumerate() {
        if coeff != 0.0 {
            objective += coeff * columns[i];
        }
    }

    let constraints = problem
        .constraints
        .iter()
        .map(|constraint| {
            let mut lhs: Expression = 0.into();
            for &(column, coeff) in &constraint.terms {
                if coeff != 0.0 {
                    lhs += coeff * columns[column];
                }
            }

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lhs.leq(constraint.bound),
                ConstraintType::Equal => lhs.eq(constraint.bound),
                ConstraintType::GreaterThanOrEqual => lhs.geq(constraint.bound),
            }
        })
        .collect();

    GoodLpModel {
        vars,
        columns,
        objective,
        constraints,
    }
}
