// Infrastructure: Server setup and configuration

use std::net::SocketAddr;

use tonic::transport::Server;
use tracing::info;

use crate::application::mappers::netopt::network_design_solver_server::NetworkDesignSolverServer;
use crate::application::GrpcNetworkService;
use crate::domain::value_objects::SolverBackend;
use crate::solver::SolverFactory;

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:50051";
pub const ADDRESS_ENV: &str = "NETOPT_ADDR";
pub const SOLVER_ENV: &str = "NETOPT_SOLVER";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    /// Backend used when a request asks for AUTO
    pub default_backend: SolverBackend,
}

impl ServerConfig {
    pub fn new(address: SocketAddr, default_backend: SolverBackend) -> Self {
        Self {
            address,
            default_backend,
        }
    }

    /// Read `NETOPT_ADDR` and `NETOPT_SOLVER`, falling back to defaults when unset
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let address = lookup(ADDRESS_ENV)
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string())
            .parse()?;
        let default_backend = match lookup(SOLVER_ENV) {
            Some(raw) => raw.parse()?,
            None => SolverBackend::Auto,
        };
        Ok(Self::new(address, default_backend))
    }
}

pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Fail at startup rather than on the first request
    let solver = SolverFactory::create_from_backend(config.default_backend)?;
    let service = GrpcNetworkService::new(config.default_backend);

    info!(
        address = %config.address,
        solver = solver.name(),
        backends = ?SolverFactory::available_backends(),
        "netopt network design server listening"
    );

    Server::builder()
        .add_service(NetworkDesignSolverServer::new(service))
        .serve(config.address)
        .await?;

    Ok(())
}
