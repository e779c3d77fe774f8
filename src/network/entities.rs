//! Warehouse, customer and factory records plus the container that groups
//! them with the distance map.
//!
//! Records are immutable values. "Updating" one (new capacity, scaled demand)
//! builds a replacement record and swaps it into the map.

use std::collections::BTreeMap;

use tracing::warn;

use super::distance::DistanceMap;

pub type WarehouseId = u32;
pub type CustomerId = u32;
pub type FactoryId = u32;

/// Candidate facility location
#[derive(Debug, Clone, PartialEq)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub city: String,
    pub state: String,
    pub zipcode: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// `None` means uncapacitated
    pub capacity: Option<f64>,
    /// Yearly fixed cost of keeping the warehouse open
    pub fixed_cost: f64,
}

impl Warehouse {
    pub fn new(id: WarehouseId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            city: String::new(),
            state: String::new(),
            zipcode: None,
            latitude,
            longitude,
            capacity: None,
            fixed_cost: 0.0,
        }
    }

    pub fn with_location(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = city.into();
        self.state = state.into();
        self
    }

    pub fn with_zipcode(mut self, zipcode: impl Into<String>) -> Self {
        self.zipcode = Some(zipcode.into());
        self
    }

    pub fn with_capacity(mut self, capacity: Option<f64>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Negative or non-finite costs fall back to 0 with a warning
    pub fn with_fixed_cost(mut self, fixed_cost: f64) -> Self {
        self.fixed_cost = sanitize_fixed_cost(self.id, fixed_cost);
        self
    }

    /// Parse a textual fixed cost; anything unparseable becomes 0
    pub fn with_fixed_cost_str(self, raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(value) => self.with_fixed_cost(value),
            Err(_) => {
                warn!(
                    warehouse = self.id,
                    raw, "unparseable fixed cost, defaulting to 0"
                );
                Self {
                    fixed_cost: 0.0,
                    ..self
                }
            }
        }
    }
}

fn sanitize_fixed_cost(id: WarehouseId, fixed_cost: f64) -> f64 {
    if fixed_cost.is_finite() && fixed_cost >= 0.0 {
        fixed_cost
    } else {
        warn!(warehouse = id, fixed_cost, "invalid fixed cost, defaulting to 0");
        0.0
    }
}

/// Demand point
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub city: String,
    pub state: String,
    pub zipcode: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub demand: f64,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        demand: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            city: String::new(),
            state: String::new(),
            zipcode: None,
            latitude,
            longitude,
            demand,
        }
    }

    pub fn with_location(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = city.into();
        self.state = state.into();
        self
    }

    pub fn with_zipcode(mut self, zipcode: impl Into<String>) -> Self {
        self.zipcode = Some(zipcode.into());
        self
    }

    pub fn with_demand(mut self, demand: f64) -> Self {
        self.demand = demand;
        self
    }
}

/// Upstream production site. Carried through unchanged; no constraint reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Factory {
    pub id: FactoryId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub capacity: Option<f64>,
}

impl Factory {
    pub fn new(id: FactoryId, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            name: name.into(),
            latitude,
            longitude,
            capacity: None,
        }
    }
}

/// Read-only input of an optimization run
#[derive(Debug, Clone, Default)]
pub struct NetworkData {
    pub warehouses: BTreeMap<WarehouseId, Warehouse>,
    pub customers: BTreeMap<CustomerId, Customer>,
    pub factories: BTreeMap<FactoryId, Factory>,
    pub distances: DistanceMap,
}

impl NetworkData {
    pub fn new(
        warehouses: impl IntoIterator<Item = Warehouse>,
        customers: impl IntoIterator<Item = Customer>,
        distances: DistanceMap,
    ) -> Self {
        Self {
            warehouses: warehouses.into_iter().map(|w| (w.id, w)).collect(),
            customers: customers.into_iter().map(|c| (c.id, c)).collect(),
            factories: BTreeMap::new(),
            distances,
        }
    }

    pub fn with_factories(mut self, factories: impl IntoIterator<Item = Factory>) -> Self {
        self.factories = factories.into_iter().map(|f| (f.id, f)).collect();
        self
    }

    pub fn total_demand(&self) -> f64 {
        self.customers.values().map(|c| c.demand).sum()
    }

    /// Replace one warehouse with a copy carrying the new capacity.
    /// Returns false when the id is unknown.
    pub fn set_capacity(&mut self, id: WarehouseId, capacity: Option<f64>) -> bool {
        match self.warehouses.get(&id) {
            Some(current) => {
                let replacement = current.clone().with_capacity(capacity);
                self.warehouses.insert(id, replacement);
                true
            }
            None => false,
        }
    }

    pub fn set_all_capacities(&mut self, capacity: Option<f64>) {
        let ids: Vec<WarehouseId> = self.warehouses.keys().copied().collect();
        for id in ids {
            self.set_capacity(id, capacity);
        }
    }

    /// Replace every customer with a copy whose demand is multiplied by `factor`
    pub fn scale_demand(&mut self, factor: f64) {
        self.customers = std::mem::take(&mut self.customers)
            .into_iter()
            .map(|(id, customer)| {
                let demand = customer.demand * factor;
                (id, customer.with_demand(demand))
            })
            .collect();
    }
}
