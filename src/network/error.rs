use super::entities::{CustomerId, WarehouseId};
use crate::domain::SolverError;

/// Errors raised while constructing or running a network optimizer
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Invalid distance ranges: {0}")]
    InvalidDistanceRanges(String),

    #[error("{0} must be specified for {1} optimization")]
    MissingParameter(&'static str, &'static str),

    #[error("Invalid parameter {0}: {1}")]
    InvalidParameter(&'static str, String),

    #[error("Unknown problem type: {0}. Must be one of: 'p-median', 'p-cover', 'UFLP', 'CFLP'")]
    UnknownProblemType(String),

    #[error("Unknown objective function: {0}. Must be 'mindistance' or 'mincost'")]
    UnknownObjectiveFunction(String),

    #[error("Missing distance between warehouse {warehouse} and customer {customer}")]
    MissingDistance {
        warehouse: WarehouseId,
        customer: CustomerId,
    },

    #[error("Invalid distance {distance} between warehouse {warehouse} and customer {customer}")]
    InvalidDistance {
        warehouse: WarehouseId,
        customer: CustomerId,
        distance: f64,
    },

    #[error("Network has no candidate warehouses")]
    NoWarehouses,

    #[error("Model has not been built; call build_model first")]
    ModelNotBuilt,

    #[error(transparent)]
    Solver(#[from] SolverError),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
