use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, VariableType,
};

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }

    /// True when the bounds leave no admissible value
    pub fn has_conflicting_bounds(&self) -> bool {
        matches!(self.upper_bound, Some(upper) if self.lower_bound > upper)
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub coefficients: Vec<f64>,
}

impl ObjectiveFunction {
    pub fn new(optimization_type: OptimizationType, coefficients: Vec<f64>) -> Self {
        Self {
            optimization_type,
            coefficients,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.coefficients.len()
    }

    /// Objective value of an assignment of the problem's variables
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coeff, value)| coeff * value)
            .sum()
    }
}

/// Linear constraint stored as sparse `(column, coefficient)` terms
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub terms: Vec<(usize, f64)>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    pub fn new(constraint_type: ConstraintType, terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self {
            constraint_type,
            terms,
            bound,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn coefficient(&self, column: usize) -> f64 {
        self.terms
            .iter()
            .filter(|(c, _)| *c == column)
            .map(|(_, coeff)| coeff)
            .sum()
    }
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock budget in seconds
    pub time_limit: Option<f64>,
    /// Relative optimality gap; 0 asks for a proven optimum
    pub gap_tolerance: Option<f64>,
    pub verbose: bool,
}

impl SolverConfig {
    pub const DEFAULT_TIME_LIMIT: f64 = 120.0;

    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Auto,
            time_limit: Some(Self::DEFAULT_TIME_LIMIT),
            gap_tolerance: Some(0.0),
            verbose: false,
        }
    }
}

/// Complete optimization problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub solver_config: SolverConfig,
}

impl OptimizationProblem {
    pub fn new(objective: ObjectiveFunction) -> Self {
        Self {
            name: String::new(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
            solver_config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Append a variable and return its column index
    pub fn add_variable(&mut self, variable: Variable) -> usize {
        self.variables.push(variable);
        self.objective.coefficients.push(0.0);
        self.variables.len() - 1
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn num_variables(&self) -> usize {
        self.objective.num_variables()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn num_binary_variables(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    /// First variable whose lower bound exceeds its upper bound
    pub fn first_conflicting_bound(&self) -> Option<&Variable> {
        self.variables.iter().find(|v| v.has_conflicting_bounds())
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_problem(problem: &OptimizationProblem, solve_time_ms: f64) -> Self {
        Self {
            solve_time_ms,
            num_variables: problem.num_variables() as u32,
            num_constraints: problem.constraints.len() as u32,
            num_integer_vars: (problem.num_integer_variables() - problem.num_binary_variables())
                as u32,
            num_binary_vars: problem.num_binary_variables() as u32,
        }
    }
}

/// Raw answer of a solver backend
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            optimal_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn value(&self, column: usize) -> f64 {
        self.variable_values.get(column).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_variable_grows_objective() {
        let mut problem =
            OptimizationProblem::new(ObjectiveFunction::new(OptimizationType::Minimize, vec![]));
        let x = problem.add_variable(Variable::binary("x"));
        let y = problem.add_variable(Variable::continuous("y").with_bounds(0.0, Some(1.0)));

        assert_eq!((x, y), (0, 1));
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_binary_variables(), 1);
        assert!(problem.is_mixed_integer());
    }

    #[test]
    fn conflicting_bounds_are_detected() {
        let mut problem =
            OptimizationProblem::new(ObjectiveFunction::new(OptimizationType::Minimize, vec![]));
        problem.add_variable(Variable::binary("ok"));
        problem.add_variable(Variable::binary("pinned").with_bounds(1.0, Some(0.0)));

        assert_eq!(
            problem.first_conflicting_bound().map(|v| v.name.as_str()),
            Some("pinned")
        );
    }

    #[test]
    fn constraint_coefficient_sums_repeated_terms() {
        let c = Constraint::new(ConstraintType::Equal, vec![(0, 1.0), (2, 3.0), (0, 0.5)], 1.0);
        assert_eq!(c.coefficient(0), 1.5);
        assert_eq!(c.coefficient(1), 0.0);
    }
}
