//! Observability utilities for the vector query service.
//!
//! This crate provides:
//! - Prometheus exporter setup
//! - Custom metrics for search requests
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics_with_listener, SearchMetrics};
//!
//! // Serve /metrics on port 9090
//! init_metrics_with_listener(([0, 0, 0, 0], 9090).into())?;
//!
//! // Record a search request
//! let timer = SearchMetrics::start("search");
//! timer.finish_ok(10);
//! ```

pub mod search;

pub use search::{SearchMetrics, SearchTimer};

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

/// Install the Prometheus recorder together with an HTTP listener serving
/// the metrics text.
///
/// Must be called from within a tokio runtime, at most once per process.
pub fn init_metrics_with_listener(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    info!(%addr, "Prometheus exporter listening");
    register_metric_descriptions();

    Ok(())
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_histogram;

    describe_counter!(
        "search_requests_total",
        "Total search RPCs by method and outcome"
    );
    describe_histogram!(
        "search_request_duration_seconds",
        "Search RPC duration in seconds"
    );
    describe_histogram!(
        "search_neighbors_returned",
        "Neighbors returned per successful search RPC"
    );
}
