use crate::domain::{
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};
use crate::solver::MicroLpSolver;
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto => Ok(Self::default_solver()),
            SolverBackend::MicroLp => Ok(Arc::new(MicroLpSolver::new())),
            SolverBackend::CoinCbc => Self::coin_cbc(),
            SolverBackend::Highs => Self::highs(),
        }
    }

    /// Best backend compiled into this build: HiGHS, then CBC, then microlp
    pub fn default_solver() -> Arc<dyn SolverService> {
        Self::highs()
            .or_else(|_| Self::coin_cbc())
            .unwrap_or_else(|_| Arc::new(MicroLpSolver::new()))
    }

    /// Backends compiled into this build
    pub fn available_backends() -> Vec<SolverBackend> {
        [SolverBackend::Highs, SolverBackend::CoinCbc, SolverBackend::MicroLp]
            .into_iter()
            .filter(|&backend| Self::create_from_backend(backend).is_ok())
            .collect()
    }

    #[cfg(feature = "highs")]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(crate::solver::HighsSolver::new()))
    }

    #[cfg(not(feature = "highs"))]
    fn highs() -> Result<Arc<dyn SolverService>> {
        Err(SolverError::SolverNotAvailable(
            "HiGHS support was not compiled in (enable the `highs` feature)".to_string(),
        ))
    }

    #[cfg(feature = "coin_cbc")]
    fn coin_cbc() -> Result<Arc<dyn SolverService>> {
        Ok(Arc::new(crate::solver::CoinCbcSolver::new()))
    }

    #[cfg(not(feature = "coin_cbc"))]
    fn coin_cbc() -> Result<Arc<dyn SolverService>> {
        Err(SolverError::SolverNotAvailable(
            "COIN-OR CBC support was not compiled in (enable the `coin_cbc` feature)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn microlp_is_always_available() {
        let solver = SolverFactory::create_from_backend(SolverBackend::MicroLp).unwrap();
        assert_eq!(solver.name(), "microlp");
        assert!(SolverFactory::available_backends().contains(&SolverBackend::MicroLp));
    }

    #[cfg(not(feature = "highs"))]
    #[test]
    fn missing_backend_is_reported() {
        let err = SolverFactory::create_from_backend(SolverBackend::Highs)
            .err()
            .expect("highs is compiled out");
        assert!(matches!(err, SolverError::SolverNotAvailable(_)));
    }
}
