pub mod grpc;

pub use grpc::FaissServiceImpl;
