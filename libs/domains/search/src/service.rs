use std::sync::Arc;

use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::{SearchError, SearchResult};
use crate::index::IndexAdapter;
use crate::models::{MISSING_ID, Neighbor, SearchByIdHits};

pub const HEARTBEAT_MESSAGE: &str = "OK";

/// Request-serving logic on top of an index adapter.
///
/// Validates and normalizes queries, calls the index, and shapes results.
/// All methods are synchronous and meant to run on a blocking thread.
pub struct QueryService<I: IndexAdapter> {
    index: Arc<I>,
    config: ServiceConfig,
}

impl<I: IndexAdapter> Clone for QueryService<I> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            config: self.config.clone(),
        }
    }
}

impl<I: IndexAdapter> QueryService<I> {
    /// Takes ownership of the index, applies the configured probe count, and
    /// freezes it. The index is read-only from here on.
    pub fn new(mut index: I, config: ServiceConfig) -> Self {
        // A probe count of 0 means "keep the index default".
        if let Some(probe_count) = config.probe_count.filter(|&n| n > 0) {
            index.set_probe_count(probe_count);
        }

        debug!(
            dimension = index.dimension(),
            total = index.total_count(),
            probe_count = index.probe_count(),
            normalize_query = config.normalize_query,
            "Query service ready"
        );

        Self {
            index: Arc::new(index),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// k nearest neighbors of a client-supplied vector, best first.
    pub fn search(&self, mut query: Vec<f32>, k: usize) -> SearchResult<Vec<Neighbor>> {
        let expected = self.index.dimension();
        if query.len() != expected {
            return Err(SearchError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        if self.config.normalize_query {
            normalize_l2(&mut query)?;
        }

        let hits = self.index.search(&query, k)?;
        Ok(hits.into_neighbors())
    }

    /// Neighbors of the stored vector `id`, excluding `id` itself.
    ///
    /// Searches for `k + 1` so that dropping the vector itself still leaves `k`.
    /// When the index returns fewer usable hits the shorter list is returned.
    pub fn search_by_id(&self, id: i64, k: usize) -> SearchResult<SearchByIdHits> {
        let total = i64::try_from(self.index.total_count()).unwrap_or(i64::MAX);
        if id < 0 || id >= total {
            return Err(SearchError::IdOutOfRange { max_id: total - 1 });
        }

        let vector = self.index.reconstruct(id)?;
        let hits = self.index.search(&vector, k.saturating_add(1))?;

        let neighbors = hits
            .iter()
            .filter(|n| n.id != MISSING_ID && n.id != id)
            .collect();

        Ok(SearchByIdHits {
            request_id: id,
            neighbors,
        })
    }

    pub fn heartbeat(&self) -> &'static str {
        HEARTBEAT_MESSAGE
    }
}

/// Scales `vector` in place to unit L2 norm.
///
/// The norm is accumulated in `f64` so very large or very small finite
/// components neither overflow nor underflow.
pub fn normalize_l2(vector: &mut [f32]) -> SearchResult<()> {
    let norm = vector
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(SearchError::ZeroNorm);
    }
    for v in vector.iter_mut() {
        *v = (f64::from(*v) / norm) as f32;
    }
    Ok(())
}
