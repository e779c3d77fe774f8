use std::collections::BTreeMap;

use super::entities::{CustomerId, WarehouseId};
use super::error::{NetworkError, Result};

/// Breakpoints used to bucket served demand by distance.
///
/// Always starts at 0 and ends at `f64::INFINITY`; buckets are `[b0, b1]`,
/// `(b1, b2]`, ... so every non-negative distance lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRanges {
    breakpoints: Vec<f64>,
}

impl DistanceRanges {
    pub const NO_UPPER_BOUND: f64 = f64::INFINITY;

    pub fn new(breakpoints: impl IntoIterator<Item = f64>) -> Result<Self> {
        let mut breakpoints: Vec<f64> = breakpoints.into_iter().collect();

        if breakpoints.iter().any(|b| b.is_nan()) {
            return Err(NetworkError::InvalidDistanceRanges(
                "breakpoints must be numbers".to_string(),
            ));
        }
        if breakpoints.first() != Some(&0.0) {
            breakpoints.insert(0, 0.0);
        }
        if breakpoints.last() != Some(&Self::NO_UPPER_BOUND) {
            breakpoints.push(Self::NO_UPPER_BOUND);
        }
        if let Some(pair) = breakpoints.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(NetworkError::InvalidDistanceRanges(format!(
                "values must be in strictly ascending order ({} is followed by {})",
                pair[0], pair[1]
            )));
        }

        Ok(Self { breakpoints })
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(lower, upper)` limits of every bucket, in order
    pub fn ranges(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.breakpoints.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Index of the bucket holding `distance`
    pub fn bucket_of(&self, distance: f64) -> usize {
        self.breakpoints[1..]
            .iter()
            .position(|&upper| distance <= upper)
            .unwrap_or(self.len() - 1)
    }
}

impl Default for DistanceRanges {
    fn default() -> Self {
        Self {
            breakpoints: vec![0.0, Self::NO_UPPER_BOUND],
        }
    }
}

/// Options shared by every problem variant
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    pub force_open: Vec<WarehouseId>,
    pub force_closed: Vec<WarehouseId>,
    pub force_allocations: Vec<(WarehouseId, CustomerId)>,
    /// Groups of warehouses of which at most one may be open
    pub mutually_exclusive: Vec<Vec<WarehouseId>>,
    /// Integral assignment: every customer served by exactly one warehouse
    pub single_sourcing: bool,
    /// Ignore capacities (p-median and p-cover only; CFLP always enforces them)
    pub force_uncapacitated: bool,
    pub ignore_fixed_cost: bool,
    /// Cost per unit of demand per unit of distance
    pub unit_transport_cost: f64,
    pub distance_ranges: DistanceRanges,
}

impl OptimizerOptions {
    pub const DEFAULT_UNIT_TRANSPORT_COST: f64 = 0.1;

    pub fn with_force_open(mut self, ids: impl IntoIterator<Item = WarehouseId>) -> Self {
        self.force_open = ids.into_iter().collect();
        self
    }

    pub fn with_force_closed(mut self, ids: impl IntoIterator<Item = WarehouseId>) -> Self {
        self.force_closed = ids.into_iter().collect();
        self
    }

    pub fn with_force_allocations(
        mut self,
        pairs: impl IntoIterator<Item = (WarehouseId, CustomerId)>,
    ) -> Self {
        self.force_allocations = pairs.into_iter().collect();
        self
    }

    pub fn with_mutually_exclusive(mut self, groups: Vec<Vec<WarehouseId>>) -> Self {
        self.mutually_exclusive = groups;
        self
    }

    pub fn with_single_sourcing(mut self, single_sourcing: bool) -> Self {
        self.single_sourcing = single_sourcing;
        self
    }

    pub fn with_force_uncapacitated(mut self, force_uncapacitated: bool) -> Self {
        self.force_uncapacitated = force_uncapacitated;
        self
    }

    pub fn with_ignore_fixed_cost(mut self, ignore_fixed_cost: bool) -> Self {
        self.ignore_fixed_cost = ignore_fixed_cost;
        self
    }

    pub fn with_unit_transport_cost(mut self, unit_transport_cost: f64) -> Self {
        self.unit_transport_cost = unit_transport_cost;
        self
    }

    pub fn with_distance_ranges(mut self, distance_ranges: DistanceRanges) -> Self {
        self.distance_ranges = distance_ranges;
        self
    }
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            force_open: Vec::new(),
            force_closed: Vec::new(),
            force_allocations: Vec::new(),
            mutually_exclusive: Vec::new(),
            single_sourcing: true,
            force_uncapacitated: false,
            ignore_fixed_cost: false,
            unit_transport_cost: Self::DEFAULT_UNIT_TRANSPORT_COST,
            distance_ranges: DistanceRanges::default(),
        }
    }
}

/// Rendering hints for downstream plotting. The optimizer never reads `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationOptions {
    /// Coverage radius drawn around open warehouses
    pub radius: Option<f64>,
    pub extra: BTreeMap<String, String>,
}

impl PresentationOptions {
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_normalized() {
        let ranges = DistanceRanges::new([300.0, 800.0]).unwrap();
        assert_eq!(ranges.breakpoints(), &[0.0, 300.0, 800.0, f64::INFINITY]);
        assert_eq!(ranges.len(), 3);

        let ranges = DistanceRanges::new([0.0, 100.0, f64::INFINITY]).unwrap();
        assert_eq!(ranges.breakpoints(), &[0.0, 100.0, f64::INFINITY]);

        let ranges = DistanceRanges::new([]).unwrap();
        assert_eq!(ranges, DistanceRanges::default());
    }

    #[test]
    fn unordered_ranges_are_rejected() {
        assert!(matches!(
            DistanceRanges::new([500.0, 200.0]),
            Err(NetworkError::InvalidDistanceRanges(_))
        ));
        assert!(DistanceRanges::new([100.0, 100.0]).is_err());
        assert!(DistanceRanges::new([f64::NAN]).is_err());
    }

    #[test]
    fn buckets_are_right_closed() {
        let ranges = DistanceRanges::new([100.0, 500.0]).unwrap();
        assert_eq!(ranges.bucket_of(0.0), 0);
        assert_eq!(ranges.bucket_of(100.0), 0);
        assert_eq!(ranges.bucket_of(100.5), 1);
        assert_eq!(ranges.bucket_of(500.0), 1);
        assert_eq!(ranges.bucket_of(12_000.0), 2);
    }

    #[test]
    fn default_options_match_documented_values() {
        let options = OptimizerOptions::default();
        assert!(options.single_sourcing);
        assert!(!options.force_uncapacitated);
        assert!(!options.ignore_fixed_cost);
        assert_eq!(options.unit_transport_cost, 0.1);
    }
}
