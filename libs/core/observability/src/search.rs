//! Search-specific metrics for the vector query RPCs.

use metrics::{counter, histogram};
use std::time::Instant;

/// Request outcome label values
pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_INVALID: &str = "invalid_argument";
pub const OUTCOME_INTERNAL: &str = "internal";

/// Search metrics recorder
pub struct SearchMetrics;

impl SearchMetrics {
    /// Start timing one RPC
    pub fn start(method: &'static str) -> SearchTimer {
        SearchTimer {
            method,
            started: Instant::now(),
        }
    }

    /// Record a finished RPC
    pub fn record_request(method: &'static str, outcome: &'static str, duration_secs: f64) {
        counter!("search_requests_total", "method" => method, "outcome" => outcome).increment(1);
        histogram!("search_request_duration_seconds", "method" => method, "outcome" => outcome)
            .record(duration_secs);
    }

    /// Record how many neighbors a successful RPC returned
    pub fn record_neighbors(method: &'static str, count: usize) {
        histogram!("search_neighbors_returned", "method" => method).record(count as f64);
    }
}

/// Measures one RPC from creation until `finish_*`.
#[must_use = "call finish_ok or finish_err to record the request"]
pub struct SearchTimer {
    method: &'static str,
    started: Instant,
}

impl SearchTimer {
    pub fn finish_ok(self, neighbors: usize) {
        let elapsed = self.started.elapsed().as_secs_f64();
        SearchMetrics::record_request(self.method, OUTCOME_OK, elapsed);
        SearchMetrics::record_neighbors(self.method, neighbors);

        tracing::debug!(
            method = self.method,
            neighbors = neighbors,
            duration_ms = elapsed * 1000.0,
            "Search request completed"
        );
    }

    pub fn finish_err(self, outcome: &'static str) {
        let elapsed = self.started.elapsed().as_secs_f64();
        SearchMetrics::record_request(self.method, outcome, elapsed);
    }
}
