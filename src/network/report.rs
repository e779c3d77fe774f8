//! Plain-text rendering of a [`NetworkSolution`]. Nothing here feeds back
//! into the optimizer.

use std::fmt;

use super::solution::{CostBreakdown, NetworkSolution, VariantSummary};

const RULE: &str = "========================================";

/// `Display` adapter returned by [`NetworkSolution::report`]
pub struct SolutionReport<'a> {
    solution: &'a NetworkSolution,
}

impl<'a> SolutionReport<'a> {
    pub fn new(solution: &'a NetworkSolution) -> Self {
        Self { solution }
    }

    fn write_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.solution.summary {
            VariantSummary::PMedianDistance {
                average_weighted_distance,
            } => {
                writeln!(f, "P-Median optimization results:")?;
                writeln!(f, "Average weighted distance: {:.0} km", average_weighted_distance)
            }
            VariantSummary::PMedianCost { total_cost, costs } => {
                writeln!(f, "P-Median optimization results:")?;
                let scope = if costs.fixed.is_some() {
                    "fixed + transportation"
                } else {
                    "transportation only"
                };
                writeln!(f, "Minimum total cost ({}): {:.0}", scope, total_cost)?;
                write_costs(f, costs)
            }
            VariantSummary::PCover {
                radius,
                covered_share,
            } => {
                writeln!(f, "P-Cover optimization results:")?;
                writeln!(
                    f,
                    "% covered demand within {} distance: {:.1}%",
                    radius,
                    covered_share * 100.0
                )
            }
            VariantSummary::FacilityLocation {
                capacitated,
                total_cost,
                costs,
            } => {
                let label = if *capacitated {
                    "Capacitated"
                } else {
                    "Uncapacitated"
                };
                writeln!(f, "{} FLP optimization results:", label)?;
                writeln!(f, "Total cost: {:.0}", total_cost)?;
                write_costs(f, costs)
            }
        }
    }
}

fn write_costs(f: &mut fmt::Formatter<'_>, costs: &CostBreakdown) -> fmt::Result {
    writeln!(f, "- Transportation cost: {:.0}", costs.transport)?;
    match costs.fixed {
        Some(fixed) => writeln!(f, "- Yearly fixed cost: {:.0}", fixed),
        None => writeln!(f, "Forced ignoring fixed cost"),
    }
}

impl fmt::Display for SolutionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solution = self.solution;

        writeln!(f, "{}", RULE)?;
        self.write_summary(f)?;
        writeln!(f, "{}", RULE)?;

        writeln!(
            f,
            "Open warehouses: ({} out of {})",
            solution.active_warehouses.len(),
            solution.total_warehouses
        )?;
        for (usage, name) in solution
            .warehouse_usage
            .iter()
            .zip(&solution.active_warehouse_names)
        {
            writeln!(
                f,
                "ID: {:3} Name: {:24} Num. customers: {:3}  Outflow: {:11.0} units",
                usage.warehouse_id, name, usage.customers_served, usage.outflow
            )?;
        }
        let total_outflow: f64 = solution.warehouse_usage.iter().map(|u| u.outflow).sum();
        writeln!(f, "\nTotal outflow: {:.0} units", total_outflow)?;

        let capacitated: Vec<_> = solution
            .warehouse_usage
            .iter()
            .filter_map(|u| Some((u, u.capacity?, u.utilization?)))
            .collect();
        if !capacitated.is_empty() {
            writeln!(f, "\nWarehouse capacity utilization:")?;
            for (usage, capacity, utilization) in capacitated {
                writeln!(
                    f,
                    "Warehouse {}: {:.1}% ({:.0}/{})",
                    usage.warehouse_id,
                    utilization * 100.0,
                    usage.outflow,
                    capacity
                )?;
            }
        }

        if let Some(stats) = &solution.distance_statistics {
            writeln!(f, "\nDemand coverage by distance:")?;
            for range in &stats.demand_by_range {
                writeln!(
                    f,
                    "% of demand in range {:>5} - {:>5}: {:5.1}%",
                    range.lower,
                    range.upper,
                    range.share * 100.0
                )?;
            }
            writeln!(
                f,
                "\nMost distant customer is at {:.1} km",
                stats.most_distant_customer
            )?;
            writeln!(
                f,
                "Average customers distance (no weights): {:.1} km",
                stats.avg_customer_distance
            )?;
            writeln!(
                f,
                "Average weighted distance: {:.1} km",
                stats.avg_weighted_distance
            )?;
        }

        if !solution.multi_sourced_customers.is_empty() {
            writeln!(f, "\nCustomers served by more than one warehouse")?;
            for (customer, count) in &solution.multi_sourced_customers {
                writeln!(f, "- Customer {} is served by {} warehouses", customer, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::domain::{SolutionStatus, SolverStatistics};
    use crate::network::config::PresentationOptions;
    use crate::network::solution::WarehouseUsage;
    use crate::network::variants::ProblemType;

    fn solution(summary: VariantSummary) -> NetworkSolution {
        NetworkSolution {
            problem_type: ProblemType::Cflp,
            status: SolutionStatus::Optimal,
            objective_value: 2450.0,
            active_warehouses: BTreeSet::from([3]),
            active_warehouse_names: vec!["Chicago".to_string()],
            total_warehouses: 5,
            assignments: Vec::new(),
            distance_statistics: None,
            multi_sourced_customers: BTreeMap::from([(7, 2)]),
            warehouse_usage: vec![WarehouseUsage {
                warehouse_id: 3,
                customers_served: 4,
                outflow: 320.0,
                capacity: Some(400.0),
                utilization: Some(0.8),
            }],
            summary,
            presentation: PresentationOptions::default(),
            solver_statistics: SolverStatistics::default(),
        }
    }

    #[test]
    fn facility_location_report_lists_costs_and_usage() {
        let text = solution(VariantSummary::FacilityLocation {
            capacitated: true,
            total_cost: 2450.0,
            costs: CostBreakdown {
                transport: 1450.0,
                fixed: None,
            },
        })
        .report()
        .to_string();

        assert!(text.contains("Capacitated FLP optimization results:"));
        assert!(text.contains("Total cost: 2450"));
        assert!(text.contains("Forced ignoring fixed cost"));
        assert!(text.contains("Open warehouses: (1 out of 5)"));
        assert!(text.contains("Warehouse 3: 80.0% (320/400)"));
        assert!(text.contains("- Customer 7 is served by 2 warehouses"));
        assert!(!text.contains("Demand coverage by distance"));
    }

    #[test]
    fn p_cover_report_shows_percentage() {
        let text = solution(VariantSummary::PCover {
            radius: 1000.0,
            covered_share: 0.875,
        })
        .report()
        .to_string();

        assert!(text.contains("% covered demand within 1000 distance: 87.5%"));
    }
}
