//! The four facility-location formulations.
//!
//! Each variant is a plain parameter struct implementing [`VariantBehavior`];
//! [`ProblemVariant`] closes the set and dispatches with a `match`. The shared
//! engine in [`crate::network::optimizer`] calls the behavior after installing
//! the constraints every formulation has in common.

use std::fmt;
use std::str::FromStr;

use crate::domain::{ConstraintType, OptimizationType};

use super::config::OptimizerOptions;
use super::error::{NetworkError, Result};
use super::optimizer::ModelContext;
use super::solution::{CostBreakdown, VariantSummary};

/// Problem-type tag accepted by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemType {
    PMedian,
    PCover,
    Uflp,
    Cflp,
}

impl ProblemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::PMedian => "p-median",
            ProblemType::PCover => "p-cover",
            ProblemType::Uflp => "UFLP",
            ProblemType::Cflp => "CFLP",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "p-median" => Ok(ProblemType::PMedian),
            "p-cover" => Ok(ProblemType::PCover),
            "UFLP" => Ok(ProblemType::Uflp),
            "CFLP" => Ok(ProblemType::Cflp),
            other => Err(NetworkError::UnknownProblemType(other.to_string())),
        }
    }
}

/// What the p-median objective measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PMedianObjective {
    /// Demand-weighted average distance
    #[default]
    MinDistance,
    /// Transport cost, plus fixed cost unless ignored
    MinCost,
}

impl FromStr for PMedianObjective {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "mindistance" => Ok(PMedianObjective::MinDistance),
            "mincost" => Ok(PMedianObjective::MinCost),
            other => Err(NetworkError::UnknownObjectiveFunction(other.to_string())),
        }
    }
}

/// Hooks a formulation plugs into the shared model-building pipeline
pub trait VariantBehavior {
    fn sense(&self) -> OptimizationType;

    /// Whether capacity rows are installed for warehouses with a capacity
    fn enforces_capacity(&self, options: &OptimizerOptions) -> bool;

    /// Reject parameter sets that cannot produce a meaningful model
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Extra rows and bound changes, added after the shared constraints
    fn contribute_constraints(&self, ctx: &mut ModelContext<'_>);

    /// Sparse objective terms over the model's columns
    fn contribute_objective(&self, ctx: &ModelContext<'_>) -> Vec<(usize, f64)>;

    fn summarize(&self, objective_value: f64, costs: CostBreakdown) -> VariantSummary;

    /// Radius hint for plotting, if the formulation has one
    fn coverage_radius(&self) -> Option<f64> {
        None
    }

    fn describe(&self, options: &OptimizerOptions) -> String;
}

/// Locate exactly `num_warehouses` facilities, minimizing distance or cost
#[derive(Debug, Clone, PartialEq)]
pub struct PMedian {
    pub num_warehouses: usize,
    pub objective: PMedianObjective,
}

/// Locate exactly `num_warehouses` facilities, maximizing demand covered
/// within `high_service_distance`
#[derive(Debug, Clone, PartialEq)]
pub struct PCover {
    pub num_warehouses: usize,
    pub high_service_distance: f64,
    /// Cap on the demand-weighted average distance
    pub avg_service_distance: Option<f64>,
    /// Pairs farther than this cannot carry flow
    pub max_service_distance: Option<f64>,
}

/// Uncapacitated facility location: free number of facilities, minimum cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uflp;

/// Capacitated facility location: as UFLP with capacities enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cflp;

fn require_positive_count(count: usize, problem: &'static str) -> Result<()> {
    if count == 0 {
        return Err(NetworkError::MissingParameter("num_warehouses", problem));
    }
    Ok(())
}

fn require_positive_distance(name: &'static str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(NetworkError::InvalidParameter(
            name,
            format!("must be a positive distance, got {}", v),
        )),
        _ => Ok(()),
    }
}

fn cost_objective(ctx: &ModelContext<'_>) -> Vec<(usize, f64)> {
    let mut terms = ctx.transport_cost_terms();
    if !ctx.options.ignore_fixed_cost {
        terms.extend(ctx.fixed_cost_terms());
    }
    terms
}

fn describe_cost(options: &OptimizerOptions) -> &'static str {
    if options.ignore_fixed_cost {
        "minimize transportation cost (fixed costs ignored)"
    } else {
        "minimize total cost (fixed + transportation)"
    }
}

impl VariantBehavior for PMedian {
    fn sense(&self) -> OptimizationType {
        OptimizationType::Minimize
    }

    fn enforces_capacity(&self, options: &OptimizerOptions) -> bool {
        !options.force_uncapacitated
    }

    fn validate(&self) -> Result<()> {
        require_positive_count(self.num_warehouses, "p-median")
    }

    fn contribute_constraints(&self, ctx: &mut ModelContext<'_>) {
        ctx.fix_open_count(self.num_warehouses);
    }

    fn contribute_objective(&self, ctx: &ModelContext<'_>) -> Vec<(usize, f64)> {
        match self.objective {
            PMedianObjective::MinDistance => {
                let normalizer = ctx.demand_normalizer();
                ctx.pairs()
                    .map(|(w, c)| {
                        (
                            ctx.flow(w, c),
                            ctx.demand(c) * ctx.distance(w, c) / normalizer,
                        )
                    })
                    .collect()
            }
            PMedianObjective::MinCost => cost_objective(ctx),
        }
    }

    fn summarize(&self, objective_value: f64, costs: CostBreakdown) -> VariantSummary {
        match self.objective {
            PMedianObjective::MinDistance => VariantSummary::PMedianDistance {
                average_weighted_distance: objective_value,
            },
            PMedianObjective::MinCost => VariantSummary::PMedianCost {
                total_cost: objective_value,
                costs,
            },
        }
    }

    fn describe(&self, options: &OptimizerOptions) -> String {
        match self.objective {
            PMedianObjective::MinDistance => format!(
                "p-median with {} warehouses: minimize average weighted distance",
                self.num_warehouses
            ),
            PMedianObjective::MinCost => format!(
                "p-median with {} warehouses: {}",
                self.num_warehouses,
                describe_cost(options)
            ),
        }
    }
}

impl PCover {
    /// 0/1 indicator: is the pair within the high-service radius
    pub fn covers(&self, distance: f64) -> bool {
        distance <= self.high_service_distance
    }
}

impl VariantBehavior for PCover {
    fn sense(&self) -> OptimizationType {
        OptimizationType::Maximize
    }

    fn enforces_capacity(&self, options: &OptimizerOptions) -> bool {
        !options.force_uncapacitated
    }

    fn validate(&self) -> Result<()> {
        require_positive_count(self.num_warehouses, "p-cover")?;
        if !(self.high_service_distance.is_finite() && self.high_service_distance > 0.0) {
            return Err(NetworkError::MissingParameter(
                "high_service_distance",
                "p-cover",
            ));
        }
        require_positive_distance("avg_service_distance", self.avg_service_distance)?;
        require_positive_distance("max_service_distance", self.max_service_distance)
    }

    fn contribute_constraints(&self, ctx: &mut ModelContext<'_>) {
        ctx.fix_open_count(self.num_warehouses);

        if let Some(max_distance) = self.max_service_distance {
            let far: Vec<usize> = ctx
                .pairs()
                .filter(|&(w, c)| ctx.distance(w, c) > max_distance)
                .map(|(w, c)| ctx.flow(w, c))
                .collect();
            for column in far {
                ctx.lower_upper_bound(column, 0.0);
            }
        }

        if let Some(avg_distance) = self.avg_service_distance {
            let terms: Vec<(usize, f64)> = ctx
                .pairs()
                .map(|(w, c)| (ctx.flow(w, c), ctx.distance(w, c) * ctx.demand(c)))
                .collect();
            let bound = avg_distance * ctx.total_demand();
            ctx.add_constraint(
                "Avoid_random_allocations",
                ConstraintType::LessThanOrEqual,
                terms,
                bound,
            );
        }
    }

    fn contribute_objective(&self, ctx: &ModelContext<'_>) -> Vec<(usize, f64)> {
        let normalizer = ctx.demand_normalizer();
        ctx.pairs()
            .filter(|&(w, c)| self.covers(ctx.distance(w, c)))
            .map(|(w, c)| (ctx.flow(w, c), ctx.demand(c) / normalizer))
            .collect()
    }

    fn summarize(&self, objective_value: f64, _costs: CostBreakdown) -> VariantSummary {
        VariantSummary::PCover {
            radius: self.high_service_distance,
            covered_share: objective_value,
        }
    }

    fn coverage_radius(&self) -> Option<f64> {
        Some(self.high_service_distance)
    }

    fn describe(&self, _options: &OptimizerOptions) -> String {
        format!(
            "p-cover with {} warehouses: maximize demand within {}",
            self.num_warehouses, self.high_service_distance
        )
    }
}

impl VariantBehavior for Uflp {
    fn sense(&self) -> OptimizationType {
        OptimizationType::Minimize
    }

    fn enforces_capacity(&self, _options: &OptimizerOptions) -> bool {
        false
    }

    fn contribute_constraints(&self, _ctx: &mut ModelContext<'_>) {}

    fn contribute_objective(&self, ctx: &ModelContext<'_>) -> Vec<(usize, f64)> {
        cost_objective(ctx)
    }

    fn summarize(&self, objective_value: f64, costs: CostBreakdown) -> VariantSummary {
        VariantSummary::FacilityLocation {
            capacitated: false,
            total_cost: objective_value,
            costs,
        }
    }

    fn describe(&self, options: &OptimizerOptions) -> String {
        format!("uncapacitated FLP: {}", describe_cost(options))
    }
}

impl VariantBehavior for Cflp {
    fn sense(&self) -> OptimizationType {
        OptimizationType::Minimize
    }

    fn enforces_capacity(&self, _options: &OptimizerOptions) -> bool {
        true
    }

    fn contribute_constraints(&self, _ctx: &mut ModelContext<'_>) {}

    fn contribute_objective(&self, ctx: &ModelContext<'_>) -> Vec<(usize, f64)> {
        cost_objective(ctx)
    }

    fn summarize(&self, objective_value: f64, costs: CostBreakdown) -> VariantSummary {
        VariantSummary::FacilityLocation {
            capacitated: true,
            total_cost: objective_value,
            costs,
        }
    }

    fn describe(&self, options: &OptimizerOptions) -> String {
        format!("capacitated FLP: {}", describe_cost(options))
    }
}

/// Closed set of supported formulations
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemVariant {
    PMedian(PMedian),
    PCover(PCover),
    Uflp(Uflp),
    Cflp(Cflp),
}

impl ProblemVariant {
    pub fn problem_type(&self) -> ProblemType {
        match self {
            ProblemVariant::PMedian(_) => ProblemType::PMedian,
            ProblemVariant::PCover(_) => ProblemType::PCover,
            ProblemVariant::Uflp(_) => ProblemType::Uflp,
            ProblemVariant::Cflp(_) => ProblemType::Cflp,
        }
    }

    /// Number of open warehouses the formulation fixes, if any
    pub fn fixed_open_count(&self) -> Option<usize> {
        match self {
            ProblemVariant::PMedian(v) => Some(v.num_warehouses),
            ProblemVariant::PCover(v) => Some(v.num_warehouses),
            ProblemVariant::Uflp(_) | ProblemVariant::Cflp(_) => None,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $v:ident => $call:expr) => {
        match $self {
            ProblemVariant::PMedian($v) => $call,
            ProblemVariant::PCover($v) => $call,
            ProblemVariant::Uflp($v) => $call,
            ProblemVariant::Cflp($v) => $call,
        }
    };
}

impl VariantBehavior for ProblemVariant {
    fn sense(&self) -> OptimizationType {
        dispatch!(self, v => v.sense())
    }

    fn enforces_capacity(&self, options: &OptimizerOptions) -> bool {
        dispatch!(self, v => v.enforces_capacity(options))
    }

    fn validate(&self) -> Result<()> {
        dispatch!(self, v => v.validate())
    }

    fn contribute_constraints(&self, ctx: &mut ModelContext<'_>) {
        dispatch!(self, v => v.contribute_constraints(ctx))
    }

    fn contribute_objective(&self, ctx: &ModelContext<'_>) -> Vec<(usize, f64)> {
        dispatch!(self, v => v.contribute_objective(ctx))
    }

    fn summarize(&self, objective_value: f64, costs: CostBreakdown) -> VariantSummary {
        dispatch!(self, v => v.summarize(objective_value, costs))
    }

    fn coverage_radius(&self) -> Option<f64> {
        dispatch!(self, v => v.coverage_radius())
    }

    fn describe(&self, options: &OptimizerOptions) -> String {
        dispatch!(self, v => v.describe(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_type_tags_round_trip() {
        for tag in ["p-median", "p-cover", "UFLP", "CFLP"] {
            let parsed: ProblemType = tag.parse().unwrap();
            assert_eq!(parsed.to_string(), tag);
        }
        assert!(matches!(
            "uflp".parse::<ProblemType>(),
            Err(NetworkError::UnknownProblemType(_))
        ));
    }

    #[test]
    fn objective_function_parses() {
        assert_eq!(
            "mincost".parse::<PMedianObjective>().unwrap(),
            PMedianObjective::MinCost
        );
        assert!("maxcover".parse::<PMedianObjective>().is_err());
    }

    #[test]
    fn capacity_policy_per_variant() {
        let relaxed = OptimizerOptions::default().with_force_uncapacitated(true);
        let strict = OptimizerOptions::default();
        let p_median = ProblemVariant::PMedian(PMedian {
            num_warehouses: 2,
            objective: PMedianObjective::MinDistance,
        });

        assert!(p_median.enforces_capacity(&strict));
        assert!(!p_median.enforces_capacity(&relaxed));
        assert!(!ProblemVariant::Uflp(Uflp).enforces_capacity(&strict));
        assert!(ProblemVariant::Cflp(Cflp).enforces_capacity(&relaxed));
    }

    #[test]
    fn p_cover_requires_radius_and_count() {
        let mut p_cover = PCover {
            num_warehouses: 2,
            high_service_distance: 0.0,
            avg_service_distance: None,
            max_service_distance: None,
        };
        assert!(matches!(
            p_cover.validate(),
            Err(NetworkError::MissingParameter("high_service_distance", _))
        ));

        p_cover.high_service_distance = 500.0;
        assert!(p_cover.validate().is_ok());

        p_cover.num_warehouses = 0;
        assert!(matches!(
            p_cover.validate(),
            Err(NetworkError::MissingParameter("num_warehouses", "p-cover"))
        ));
    }

    #[test]
    fn senses_follow_formulation() {
        let p_cover = ProblemVariant::PCover(PCover {
            num_warehouses: 1,
            high_service_distance: 10.0,
            avg_service_distance: None,
            max_service_distance: None,
        });
        assert_eq!(p_cover.sense(), OptimizationType::Maximize);
        assert_eq!(ProblemVariant::Cflp(Cflp).sense(), OptimizationType::Minimize);
        assert_eq!(p_cover.coverage_radius(), Some(10.0));
    }
}
