use std::collections::HashMap;

use super::entities::{CustomerId, NetworkData, WarehouseId};
use super::error::{NetworkError, Result};

/// Precomputed distances keyed by `(warehouse_id, customer_id)`.
///
/// Units are whatever the producer used (kilometers for haversine output);
/// the optimizer never converts them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceMap {
    entries: HashMap<(WarehouseId, CustomerId), f64>,
}

impl DistanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, warehouse: WarehouseId, customer: CustomerId, distance: f64) {
        self.entries.insert((warehouse, customer), distance);
    }

    pub fn get(&self, warehouse: WarehouseId, customer: CustomerId) -> Option<f64> {
        self.entries.get(&(warehouse, customer)).copied()
    }

    /// Distance of a pair that must exist
    pub fn require(&self, warehouse: WarehouseId, customer: CustomerId) -> Result<f64> {
        self.get(warehouse, customer)
            .ok_or(NetworkError::MissingDistance { warehouse, customer })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fails on the first warehouse/customer pair that is missing or negative
    pub fn validate_for(&self, data: &NetworkData) -> Result<()> {
        for &warehouse in data.warehouses.keys() {
            for &customer in data.customers.keys() {
                let distance = self.require(warehouse, customer)?;
                if !distance.is_finite() || distance < 0.0 {
                    return Err(NetworkError::InvalidDistance {
                        warehouse,
                        customer,
                        distance,
                    });
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<((WarehouseId, CustomerId), f64)> for DistanceMap {
    fn from_iter<I: IntoIterator<Item = ((WarehouseId, CustomerId), f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::entities::{Customer, Warehouse};

    fn data_with(distances: DistanceMap) -> NetworkData {
        NetworkData::new(
            vec![Warehouse::new(1, "W1", 0.0, 0.0), Warehouse::new(2, "W2", 0.0, 0.0)],
            vec![Customer::new(7, "C7", 0.0, 0.0, 1.0)],
            distances,
        )
    }

    #[test]
    fn complete_map_validates() {
        let distances: DistanceMap = [((1, 7), 10.0), ((2, 7), 0.0)].into_iter().collect();
        let data = data_with(distances.clone());
        assert!(distances.validate_for(&data).is_ok());
    }

    #[test]
    fn missing_pair_fails_fast() {
        let distances: DistanceMap = [((1, 7), 10.0)].into_iter().collect();
        let data = data_with(distances.clone());
        assert!(matches!(
            distances.validate_for(&data),
            Err(NetworkError::MissingDistance {
                warehouse: 2,
                customer: 7
            })
        ));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let distances: DistanceMap = [((1, 7), 10.0), ((2, 7), -1.0)].into_iter().collect();
        let data = data_with(distances.clone());
        assert!(matches!(
            distances.validate_for(&data),
            Err(NetworkError::InvalidDistance { warehouse: 2, .. })
        ));
    }
}
