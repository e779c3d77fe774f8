use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{SolutionStatus, SolverStatistics};

use super::config::{DistanceRanges, PresentationOptions};
use super::entities::{CustomerId, WarehouseId};
use super::report::SolutionReport;
use super::variants::ProblemType;

/// Flow values at or below this are treated as zero
pub const FLOW_EPSILON: f64 = 1e-6;

/// One served (warehouse, customer) edge
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    /// Full demand of the customer
    pub customer_demand: f64,
    /// Fraction of the customer's demand routed over this edge
    pub flow: f64,
    pub distance: f64,
    pub warehouse_latitude: f64,
    pub warehouse_longitude: f64,
    pub customer_latitude: f64,
    pub customer_longitude: f64,
}

impl Assignment {
    /// Demand volume moved over this edge
    pub fn served_demand(&self) -> f64 {
        self.customer_demand * self.flow
    }
}

/// Share of served demand falling in one distance bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeShare {
    pub lower: f64,
    pub upper: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceStatistics {
    pub demand_by_range: Vec<RangeShare>,
    pub most_distant_customer: f64,
    pub avg_weighted_distance: f64,
    pub avg_customer_distance: f64,
}

impl DistanceStatistics {
    /// Statistics over served edges; `None` when nothing carries demand
    pub fn from_assignments(assignments: &[Assignment], ranges: &DistanceRanges) -> Option<Self> {
        let total_served: f64 = assignments.iter().map(Assignment::served_demand).sum();
        if assignments.is_empty() || total_served <= 0.0 {
            return None;
        }

        let mut served_by_bucket = vec![0.0; ranges.len()];
        for assignment in assignments {
            served_by_bucket[ranges.bucket_of(assignment.distance)] += assignment.served_demand();
        }
        let demand_by_range = ranges
            .ranges()
            .zip(served_by_bucket)
            .map(|((lower, upper), served)| RangeShare {
                lower,
                upper,
                share: served / total_served,
            })
            .collect();

        let weighted: f64 = assignments
            .iter()
            .map(|a| a.distance * a.served_demand())
            .sum();
        let most_distant_customer = assignments
            .iter()
            .map(|a| a.distance)
            .fold(0.0, f64::max);
        let avg_customer_distance =
            assignments.iter().map(|a| a.distance).sum::<f64>() / assignments.len() as f64;

        Some(Self {
            demand_by_range,
            most_distant_customer,
            avg_weighted_distance: weighted / total_served,
            avg_customer_distance,
        })
    }
}

/// Load of one open warehouse
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseUsage {
    pub warehouse_id: WarehouseId,
    pub customers_served: usize,
    pub outflow: f64,
    pub capacity: Option<f64>,
    /// `outflow / capacity`; above 1.0 means capacity was not enforced
    pub utilization: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub transport: f64,
    /// `None` when fixed costs were excluded from the objective
    pub fixed: Option<f64>,
}

/// Headline figures, specific to the formulation that was solved
#[derive(Debug, Clone, PartialEq)]
pub enum VariantSummary {
    PMedianDistance {
        average_weighted_distance: f64,
    },
    PMedianCost {
        total_cost: f64,
        costs: CostBreakdown,
    },
    PCover {
        radius: f64,
        covered_share: f64,
    },
    FacilityLocation {
        capacitated: bool,
        total_cost: f64,
        costs: CostBreakdown,
    },
}

/// Structured result of a successful solve
#[derive(Debug, Clone)]
pub struct NetworkSolution {
    pub problem_type: ProblemType,
    pub status: SolutionStatus,
    pub objective_value: f64,
    pub active_warehouses: BTreeSet<WarehouseId>,
    pub active_warehouse_names: Vec<String>,
    pub total_warehouses: usize,
    pub assignments: Vec<Assignment>,
    /// Absent when no edge carries demand
    pub distance_statistics: Option<DistanceStatistics>,
    /// Customers with more than one supplier, and how many they have
    pub multi_sourced_customers: BTreeMap<CustomerId, usize>,
    pub warehouse_usage: Vec<WarehouseUsage>,
    pub summary: VariantSummary,
    pub presentation: PresentationOptions,
    pub solver_statistics: SolverStatistics,
}

impl NetworkSolution {
    pub fn is_active(&self, warehouse: WarehouseId) -> bool {
        self.active_warehouses.contains(&warehouse)
    }

    /// Flow fraction on an edge, 0 when the edge is not served
    pub fn flow(&self, warehouse: WarehouseId, customer: CustomerId) -> f64 {
        self.assignments
            .iter()
            .find(|a| a.warehouse_id == warehouse && a.customer_id == customer)
            .map_or(0.0, |a| a.flow)
    }

    /// Sum of flow fractions reaching one customer
    pub fn customer_coverage(&self, customer: CustomerId) -> f64 {
        self.assignments
            .iter()
            .filter(|a| a.customer_id == customer)
            .map(|a| a.flow)
            .sum()
    }

    pub fn usage(&self, warehouse: WarehouseId) -> Option<&WarehouseUsage> {
        self.warehouse_usage
            .iter()
            .find(|u| u.warehouse_id == warehouse)
    }

    /// Human-readable summary; presentation only
    pub fn report(&self) -> SolutionReport<'_> {
        SolutionReport::new(self)
    }
}

/// Result of [`crate::network::NetworkOptimizer::solve`]
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Solved(Box<NetworkSolution>),
    /// No assignment satisfies the constraints
    Infeasible,
    /// The solver gave up (time limit or other); nothing it produced is trusted
    NotSolved(SolutionStatus),
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&NetworkSolution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn into_solution(self) -> Option<NetworkSolution> {
        match self {
            SolveOutcome::Solved(solution) => Some(*solution),
            _ => None,
        }
    }

    pub fn status(&self) -> SolutionStatus {
        match self {
            SolveOutcome::Solved(solution) => solution.status,
            SolveOutcome::Infeasible => SolutionStatus::Infeasible,
            SolveOutcome::NotSolved(status) => *status,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(warehouse_id: WarehouseId, customer_id: CustomerId, demand: f64, flow: f64, distance: f64) -> Assignment {
        Assignment {
            warehouse_id,
            warehouse_name: format!("W{}", warehouse_id),
            customer_id,
            customer_name: format!("C{}", customer_id),
            customer_demand: demand,
            flow,
            distance,
            warehouse_latitude: 0.0,
            warehouse_longitude: 0.0,
            customer_latitude: 0.0,
            customer_longitude: 0.0,
        }
    }

    #[test]
    fn statistics_weight_by_served_demand() {
        let ranges = DistanceRanges::new([100.0, 1000.0]).unwrap();
        let assignments = vec![
            edge(1, 1, 100.0, 1.0, 50.0),
            edge(1, 2, 300.0, 1.0, 500.0),
            edge(2, 3, 100.0, 0.5, 2000.0),
            edge(1, 3, 100.0, 0.5, 100.0),
        ];

        let stats = DistanceStatistics::from_assignments(&assignments, &ranges).unwrap();

        let shares: Vec<f64> = stats.demand_by_range.iter().map(|r| r.share).collect();
        assert_eq!(shares.len(), 3);
        assert!((shares[0] - 150.0 / 500.0).abs() < 1e-12);
        assert!((shares[1] - 300.0 / 500.0).abs() < 1e-12);
        assert!((shares[2] - 50.0 / 500.0).abs() < 1e-12);
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        assert_eq!(stats.most_distant_customer, 2000.0);
        let expected_weighted = (100.0 * 50.0 + 300.0 * 500.0 + 50.0 * 2000.0 + 50.0 * 100.0) / 500.0;
        assert!((stats.avg_weighted_distance - expected_weighted).abs() < 1e-9);
        assert!((stats.avg_customer_distance - 2650.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn no_edges_means_no_statistics() {
        assert!(DistanceStatistics::from_assignments(&[], &DistanceRanges::default()).is_none());
        let zero_demand = vec![edge(1, 1, 0.0, 1.0, 10.0)];
        assert!(DistanceStatistics::from_assignments(&zero_demand, &DistanceRanges::default()).is_none());
    }

    #[test]
    fn outcome_accessors() {
        let outcome = SolveOutcome::NotSolved(SolutionStatus::TimeLimit);
        assert!(!outcome.is_solved());
        assert!(outcome.solution().is_none());
        assert_eq!(outcome.status(), SolutionStatus::TimeLimit);
        assert_eq!(SolveOutcome::Infeasible.status(), SolutionStatus::Infeasible);
    }
}
