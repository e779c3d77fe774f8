// Application layer: gRPC surface over the network optimizer

pub mod grpc_service;
pub mod mappers;

pub use grpc_service::GrpcNetworkService;
