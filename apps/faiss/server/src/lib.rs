//! Vector Query gRPC Service
//!
//! Serves nearest-neighbor queries against a pre-built index via gRPC.
//!
//! ## Architecture
//!
//! ```text
//! Client (faiss-cli / any gRPC client)
//!   ↓ (gRPC with Zstd compression)
//! FaissServiceImpl (domain_search::handlers)
//!   ↓ (blocking pool, max_workers threads)
//! QueryService (validation, normalization)
//!   ↓
//! IndexAdapter (IvfFlatIndex | FaissIndex)
//! ```
//!
//! ## Modules
//!
//! - `config`: Server configuration from environment
//! - `server`: Server initialization and lifecycle

pub mod config;
pub mod server;

// Re-export for convenience
pub use config::ServerConfig;
pub use server::{run, run_with_listener, serve};
