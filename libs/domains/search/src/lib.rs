//! Search Domain Library
//!
//! Serves approximate-nearest-neighbor queries against a pre-built vector
//! index over the `faiss.v1.FaissService` gRPC contract.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ FaissServiceImpl │  ← tonic handler, proto ↔ domain, blocking pool
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │   QueryService   │  ← validation, normalization, result shaping
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  IndexAdapter    │
//! │    (trait)       │
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  IvfFlatIndex    │
//! │  FaissIndex      │  (feature "faiss")
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_search::{FaissServiceImpl, IvfFlatIndex, QueryService, ServiceConfig};
//! use core_config::FromEnv;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = IvfFlatIndex::load("index.json")?;
//! let config = ServiceConfig::from_env()?;
//!
//! let service = QueryService::new(index, config);
//! let handler = FaissServiceImpl::new(service);
//! # let _ = handler;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversions;
pub mod error;
pub mod handlers;
pub mod index;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use error::{SearchError, SearchResult};
pub use handlers::FaissServiceImpl;
#[cfg(feature = "faiss")]
pub use index::FaissIndex;
pub use index::{IndexAdapter, IvfFlatIndex, IvfFlatParams, MetricType, SyntheticDataset};
pub use models::{Neighbor, SearchByIdHits, SearchHits};
pub use service::QueryService;
