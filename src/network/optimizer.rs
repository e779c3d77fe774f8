//! Shared build, solve and extraction pipeline.
//!
//! `NetworkOptimizer` owns the decision variables and the linear model of a
//! single run. Variants only see a [`ModelContext`], which hands out column
//! indices and accepts extra rows; they never touch the model directly.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::domain::{
    Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem, Solution, SolutionStatus,
    SolverConfig, SolverService, Variable,
};

use super::config::{OptimizerOptions, PresentationOptions};
use super::entities::{CustomerId, NetworkData, WarehouseId};
use super::error::{NetworkError, Result};
use super::solution::{
    Assignment, CostBreakdown, DistanceStatistics, NetworkSolution, SolveOutcome, WarehouseUsage,
    FLOW_EPSILON,
};
use super::variants::{ProblemType, ProblemVariant, VariantBehavior};

/// Open values above this count as an open warehouse
const OPEN_THRESHOLD: f64 = 0.5;

/// Column positions of the decision variables
#[derive(Debug, Clone, Default)]
pub struct ModelIndex {
    open: BTreeMap<WarehouseId, usize>,
    flow: HashMap<(WarehouseId, CustomerId), usize>,
}

impl ModelIndex {
    pub fn open(&self, warehouse: WarehouseId) -> Option<usize> {
        self.open.get(&warehouse).copied()
    }

    pub fn flow(&self, warehouse: WarehouseId, customer: CustomerId) -> Option<usize> {
        self.flow.get(&(warehouse, customer)).copied()
    }
}

/// A built model together with its column index
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub problem: OptimizationProblem,
    pub index: ModelIndex,
}

/// View of the model under construction handed to the variant hooks.
///
/// Column lookups index by pairs taken from [`ModelContext::pairs`]; asking for
/// an id outside the input data panics.
pub struct ModelContext<'a> {
    pub options: &'a OptimizerOptions,
    data: &'a NetworkData,
    index: &'a ModelIndex,
    problem: &'a mut OptimizationProblem,
}

impl<'a> ModelContext<'a> {
    pub fn data(&self) -> &NetworkData {
        self.data
    }

    /// Every (warehouse, customer) pair, warehouse-major, in id order
    pub fn pairs<'s>(&'s self) -> impl Iterator<Item = (WarehouseId, CustomerId)> + 's {
        let data: &'s NetworkData = self.data;
        data.warehouses
            .keys()
            .flat_map(move |&w| data.customers.keys().map(move |&c| (w, c)))
    }

    pub fn open(&self, warehouse: WarehouseId) -> usize {
        self.index.open[&warehouse]
    }

    pub fn flow(&self, warehouse: WarehouseId, customer: CustomerId) -> usize {
        self.index.flow[&(warehouse, customer)]
    }

    pub fn distance(&self, warehouse: WarehouseId, customer: CustomerId) -> f64 {
        self.data.distances.get(warehouse, customer).unwrap_or(0.0)
    }

    pub fn demand(&self, customer: CustomerId) -> f64 {
        self.data.customers.get(&customer).map_or(0.0, |c| c.demand)
    }

    pub fn total_demand(&self) -> f64 {
        self.data.total_demand()
    }

    /// Total demand, or 1 when there is none to normalize by
    pub fn demand_normalizer(&self) -> f64 {
        let total = self.total_demand();
        if total > 0.0 {
            total
        } else {
            1.0
        }
    }

    /// unit cost x demand x distance on every flow column
    pub fn transport_cost_terms(&self) -> Vec<(usize, f64)> {
        let unit = self.options.unit_transport_cost;
        self.pairs()
            .map(|(w, c)| (self.flow(w, c), unit * self.demand(c) * self.distance(w, c)))
            .collect()
    }

    /// Fixed cost on every open column
    pub fn fixed_cost_terms(&self) -> Vec<(usize, f64)> {
        self.data
            .warehouses
            .values()
            .map(|w| (self.open(w.id), w.fixed_cost))
            .collect()
    }

    /// Exactly `count` warehouses open
    pub fn fix_open_count(&mut self, count: usize) {
        let terms = self.index.open.values().map(|&col| (col, 1.0)).collect();
        self.add_constraint(
            "Num_of_active_warehouses",
            ConstraintType::Equal,
            terms,
            count as f64,
        );
    }

    /// Tighten a column's upper bound to at most `value`
    pub fn lower_upper_bound(&mut self, column: usize, value: f64) {
        if let Some(variable) = self.problem.variables.get_mut(column) {
            variable.upper_bound = Some(variable.upper_bound.map_or(value, |u| u.min(value)));
        }
    }

    pub fn add_constraint(
        &mut self,
        name: &str,
        constraint_type: ConstraintType,
        terms: Vec<(usize, f64)>,
        bound: f64,
    ) {
        self.problem
            .add_constraint(Constraint::new(constraint_type, terms, bound).with_name(name));
    }

    fn add_customer_service_constraints(&mut self) {
        let customers: Vec<CustomerId> = self.data.customers.keys().copied().collect();
        for c in customers {
            let terms = self
                .data
                .warehouses
                .keys()
                .map(|&w| (self.flow(w, c), 1.0))
                .collect();
            self.add_constraint(
                &format!("Customer_{}_served", c),
                ConstraintType::Equal,
                terms,
                1.0,
            );
        }
    }

    fn add_logical_constraints(&mut self) {
        let pairs: Vec<_> = self.pairs().collect();
        for (w, c) in pairs {
            let terms = vec![(self.flow(w, c), 1.0), (self.open(w), -1.0)];
            self.add_constraint(
                &format!("Logical_customer_{}_warehouse_{}", c, w),
                ConstraintType::LessThanOrEqual,
                terms,
                0.0,
            );
        }
    }

    fn apply_forced_status(&mut self) {
        let options = self.options;
        for &w in &options.force_open {
            let col = self.open(w);
            self.problem.variables[col].lower_bound = 1.0;
        }
        for &w in &options.force_closed {
            let col = self.open(w);
            self.lower_upper_bound(col, 0.0);
        }
    }

    fn add_mutual_exclusivity_constraints(&mut self) {
        let options = self.options;
        for group in &options.mutually_exclusive {
            let terms = group.iter().map(|&w| (self.open(w), 1.0)).collect();
            let members: Vec<String> = group.iter().map(u32::to_string).collect();
            self.add_constraint(
                &format!("Mutually_exclusive_warehouses_{}", members.join("_")),
                ConstraintType::LessThanOrEqual,
                terms,
                1.0,
            );
        }
    }

    fn pin_forced_allocations(&mut self) {
        let options = self.options;
        for &(w, c) in &options.force_allocations {
            let col = self.flow(w, c);
            let variable = &mut self.problem.variables[col];
            variable.lower_bound = 1.0;
            variable.upper_bound = Some(1.0);
        }
    }

    fn add_capacity_constraints(&mut self) {
        let capacitated: Vec<(WarehouseId, f64)> = self
            .data
            .warehouses
            .values()
            .filter_map(|w| w.capacity.map(|cap| (w.id, cap)))
            .collect();
        for (w, capacity) in capacitated {
            let terms = self
                .data
                .customers
                .values()
                .map(|c| (self.flow(w, c.id), c.demand))
                .collect();
            self.add_constraint(
                &format!("Capacity_limit_warehouse_{}", w),
                ConstraintType::LessThanOrEqual,
                terms,
                capacity,
            );
        }
    }

    fn set_objective(&mut self, terms: Vec<(usize, f64)>) {
        for (col, coeff) in terms {
            if let Some(slot) = self.problem.objective.coefficients.get_mut(col) {
                *slot += coeff;
            }
        }
    }
}

/// One facility-location run over read-only input data
#[derive(Debug)]
pub struct NetworkOptimizer<'a> {
    data: &'a NetworkData,
    variant: ProblemVariant,
    options: OptimizerOptions,
    presentation: PresentationOptions,
    model: Option<BuiltModel>,
}

impl<'a> NetworkOptimizer<'a> {
    /// Validate inputs and drop references to unknown ids (with a warning)
    pub fn new(
        data: &'a NetworkData,
        variant: ProblemVariant,
        options: OptimizerOptions,
        presentation: PresentationOptions,
    ) -> Result<Self> {
        variant.validate()?;
        if !(options.unit_transport_cost.is_finite() && options.unit_transport_cost >= 0.0) {
            return Err(NetworkError::InvalidParameter(
                "unit_transport_cost",
                format!("must be non-negative, got {}", options.unit_transport_cost),
            ));
        }
        if data.warehouses.is_empty() {
            return Err(NetworkError::NoWarehouses);
        }
        data.distances.validate_for(data)?;

        let options = filter_references(data, options);

        Ok(Self {
            data,
            variant,
            options,
            presentation,
            model: None,
        })
    }

    pub fn variant(&self) -> &ProblemVariant {
        &self.variant
    }

    pub fn problem_type(&self) -> ProblemType {
        self.variant.problem_type()
    }

    /// Options after unknown references were dropped
    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    pub fn presentation(&self) -> &PresentationOptions {
        &self.presentation
    }

    /// The built model, until `solve` consumes it
    pub fn model(&self) -> Option<&BuiltModel> {
        self.model.as_ref()
    }

    pub fn is_built(&self) -> bool {
        self.model.is_some()
    }

    /// Create variables, shared constraints and the variant's rows and objective.
    /// Rebuilding replaces any previous model.
    pub fn build_model(&mut self) -> Result<()> {
        let options = &self.options;
        let data = self.data;

        info!("{}", self.variant.describe(options));

        let mut problem =
            OptimizationProblem::new(ObjectiveFunction::new(self.variant.sense(), Vec::new()))
                .with_name(self.variant.problem_type().as_str());
        let mut index = ModelIndex::default();

        for &w in data.warehouses.keys() {
            let col = problem.add_variable(Variable::binary(format!("Open_{}", w)));
            index.open.insert(w, col);
        }

        if options.single_sourcing {
            info!("single sourcing model");
        } else {
            info!("multi-sourcing model");
        }
        for &w in data.warehouses.keys() {
            for &c in data.customers.keys() {
                let name = format!("Flow_{}_{}", w, c);
                let variable = if options.single_sourcing {
                    Variable::binary(name)
                } else {
                    Variable::continuous(name).with_bounds(0.0, Some(1.0))
                };
                index.flow.insert((w, c), problem.add_variable(variable));
            }
        }

        let mut ctx = ModelContext {
            options,
            data,
            index: &index,
            problem: &mut problem,
        };
        ctx.add_customer_service_constraints();
        ctx.add_logical_constraints();
        ctx.apply_forced_status();
        ctx.add_mutual_exclusivity_constraints();
        ctx.pin_forced_allocations();

        if self.variant.enforces_capacity(options) {
            info!("capacitated model");
            ctx.add_capacity_constraints();
        } else {
            info!("uncapacitated model");
        }

        self.variant.contribute_constraints(&mut ctx);
        let objective = self.variant.contribute_objective(&ctx);
        ctx.set_objective(objective);

        debug!(
            variables = problem.num_variables(),
            constraints = problem.constraints.len(),
            binaries = problem.num_binary_variables(),
            "model built"
        );

        self.model = Some(BuiltModel { problem, index });
        Ok(())
    }

    /// Run the solver on the built model and extract the solution.
    ///
    /// The gap tolerance is always forced to 0. The model is consumed: a
    /// second solve needs a new `build_model`.
    pub fn solve(
        &mut self,
        solver: &dyn SolverService,
        config: &SolverConfig,
    ) -> Result<SolveOutcome> {
        let BuiltModel { problem, index } =
            self.model.take().ok_or(NetworkError::ModelNotBuilt)?;
        let problem = problem.with_config(SolverConfig {
            gap_tolerance: Some(0.0),
            ..config.clone()
        });

        info!(
            solver = solver.name(),
            time_limit = ?problem.solver_config.time_limit,
            "solving {} model",
            self.problem_type()
        );
        let started = Instant::now();
        let raw = solver.solve(&problem)?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %raw.status,
            "solver returned"
        );

        match raw.status {
            SolutionStatus::Optimal => {
                info!(status = %raw.status, "optimal solution found");
                let solution = self.extract(&problem, &index, raw);
                Ok(SolveOutcome::Solved(Box::new(solution)))
            }
            SolutionStatus::Infeasible => {
                warn!(message = %raw.message, "problem is infeasible");
                Ok(SolveOutcome::Infeasible)
            }
            status => {
                warn!(%status, message = %raw.message, "problem not solved");
                Ok(SolveOutcome::NotSolved(status))
            }
        }
    }

    fn extract(
        &self,
        problem: &OptimizationProblem,
        index: &ModelIndex,
        raw: Solution,
    ) -> NetworkSolution {
        let data = self.data;

        let active_warehouses: BTreeSet<WarehouseId> = index
            .open
            .iter()
            .filter(|&(_, &col)| raw.value(col) > OPEN_THRESHOLD)
            .map(|(&w, _)| w)
            .collect();
        let active_warehouse_names = active_warehouses
            .iter()
            .filter_map(|w| data.warehouses.get(w))
            .map(|w| w.name.clone())
            .collect();

        let mut assignments = Vec::new();
        for warehouse in data.warehouses.values() {
            for customer in data.customers.values() {
                let flow = index
                    .flow(warehouse.id, customer.id)
                    .map_or(0.0, |col| raw.value(col));
                if flow <= FLOW_EPSILON {
                    continue;
                }
                assignments.push(Assignment {
                    warehouse_id: warehouse.id,
                    warehouse_name: warehouse.name.clone(),
                    customer_id: customer.id,
                    customer_name: customer.name.clone(),
                    customer_demand: customer.demand,
                    flow,
                    distance: data.distances.get(warehouse.id, customer.id).unwrap_or(0.0),
                    warehouse_latitude: warehouse.latitude,
                    warehouse_longitude: warehouse.longitude,
                    customer_latitude: customer.latitude,
                    customer_longitude: customer.longitude,
                });
            }
        }

        let mut suppliers: BTreeMap<CustomerId, usize> = BTreeMap::new();
        for assignment in &assignments {
            *suppliers.entry(assignment.customer_id).or_default() += 1;
        }
        let multi_sourced_customers: BTreeMap<CustomerId, usize> = suppliers
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .collect();
        if self.options.single_sourcing && !multi_sourced_customers.is_empty() {
            warn!(
                customers = ?multi_sourced_customers.keys().collect::<Vec<_>>(),
                "customers served by several warehouses under single sourcing"
            );
        }

        let warehouse_usage = self.usage(&active_warehouses, &assignments);

        let transport = assignments
            .iter()
            .map(|a| self.options.unit_transport_cost * a.served_demand() * a.distance)
            .sum();
        let fixed = (!self.options.ignore_fixed_cost).then(|| {
            active_warehouses
                .iter()
                .filter_map(|w| data.warehouses.get(w))
                .map(|w| w.fixed_cost)
                .sum()
        });
        let objective_value = raw
            .optimal_value
            .unwrap_or_else(|| problem.objective.evaluate(&raw.variable_values));
        let summary = self
            .variant
            .summarize(objective_value, CostBreakdown { transport, fixed });

        let distance_statistics =
            DistanceStatistics::from_assignments(&assignments, &self.options.distance_ranges);
        if distance_statistics.is_none() {
            debug!("no served demand, distance statistics omitted");
        }

        let mut presentation = self.presentation.clone();
        if presentation.radius.is_none() {
            presentation.radius = self.variant.coverage_radius();
        }

        NetworkSolution {
            problem_type: self.problem_type(),
            status: raw.status,
            objective_value,
            active_warehouses,
            active_warehouse_names,
            total_warehouses: data.warehouses.len(),
            assignments,
            distance_statistics,
            multi_sourced_customers,
            warehouse_usage,
            summary,
            presentation,
            solver_statistics: raw.statistics,
        }
    }

    fn usage(
        &self,
        active: &BTreeSet<WarehouseId>,
        assignments: &[Assignment],
    ) -> Vec<WarehouseUsage> {
        let capacity_enforced = self.variant.enforces_capacity(&self.options);
        active
            .iter()
            .map(|&w| {
                let served: Vec<&Assignment> =
                    assignments.iter().filter(|a| a.warehouse_id == w).collect();
                let outflow: f64 = served.iter().map(|a| a.served_demand()).sum();
                let capacity = self.data.warehouses.get(&w).and_then(|w| w.capacity);
                let utilization = capacity.filter(|&cap| cap > 0.0).map(|cap| outflow / cap);
                if let Some(ratio) = capacity_overrun(capacity_enforced, utilization) {
                    warn!(
                        warehouse = w,
                        utilization = ratio,
                        "warehouse above capacity; check capacity constraint wiring"
                    );
                }
                WarehouseUsage {
                    warehouse_id: w,
                    customers_served: served.len(),
                    outflow,
                    capacity,
                    utilization,
                }
            })
            .collect()
    }
}

/// Utilization worth a warning: above 1 on a warehouse whose capacity was a constraint
fn capacity_overrun(capacity_enforced: bool, utilization: Option<f64>) -> Option<f64> {
    utilization.filter(|&ratio| capacity_enforced && ratio > 1.0 + FLOW_EPSILON)
}

/// Drop references to ids absent from `data`, warning once per entry
fn filter_references(data: &NetworkData, mut options: OptimizerOptions) -> OptimizerOptions {
    let known_warehouse = |w: &WarehouseId, list: &str| {
        let known = data.warehouses.contains_key(w);
        if !known {
            warn!(warehouse = *w, list, "warehouse does not exist, skipped");
        }
        known
    };

    options.force_open.retain(|w| known_warehouse(w, "force_open"));
    options.force_closed.retain(|w| known_warehouse(w, "force_closed"));
    options.force_allocations.retain(|(w, c)| {
        let known = data.warehouses.contains_key(w) && data.customers.contains_key(c);
        if !known {
            warn!(
                warehouse = *w,
                customer = *c,
                "forced allocation references an unknown id, skipped"
            );
        }
        known
    });
    options.mutually_exclusive = std::mem::take(&mut options.mutually_exclusive)
        .into_iter()
        .filter_map(|mut group| {
            group.retain(|w| known_warehouse(w, "mutually_exclusive"));
            group.sort_unstable();
            group.dedup();
            if group.len() < 2 {
                warn!(?group, "mutually exclusive group has fewer than two warehouses, skipped");
                None
            } else {
                Some(group)
            }
        })
        .collect();

    options
}
