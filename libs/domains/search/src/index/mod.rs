//! Vector index adapters.
//!
//! The query service only talks to [`IndexAdapter`]. [`IvfFlatIndex`] is the
//! in-process default; [`FaissIndex`] wraps a native faiss index when the
//! `faiss` feature is enabled.

pub mod dataset;
#[cfg(feature = "faiss")]
pub mod faiss;
pub mod ivf_flat;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::models::SearchHits;

#[cfg(feature = "faiss")]
pub use self::faiss::FaissIndex;
pub use dataset::SyntheticDataset;
pub use ivf_flat::{IvfFlatIndex, IvfFlatParams};

/// Capability set the query service needs from an ANN index.
///
/// Vectors are passed flattened in row-major order; any batch length must be a
/// multiple of [`dimension`](IndexAdapter::dimension).
#[cfg_attr(test, mockall::automock)]
pub trait IndexAdapter: Send + Sync {
    /// Length of every stored and query vector
    fn dimension(&self) -> usize;

    /// Number of stored vectors
    fn total_count(&self) -> u64;

    /// Inverted lists visited per search
    fn probe_count(&self) -> u32;

    fn set_probe_count(&mut self, probe_count: u32);

    /// Learn the coarse quantizer from a training batch
    fn train(&mut self, vectors: &[f32]) -> SearchResult<()>;

    /// Append vectors; ids are assigned sequentially from `total_count()`
    fn add(&mut self, vectors: &[f32]) -> SearchResult<()>;

    /// Nearest neighbors of a single query, best first.
    ///
    /// Slots that could not be filled carry id `-1`.
    fn search(&self, query: &[f32], k: usize) -> SearchResult<SearchHits>;

    /// Exact stored vector for `id`
    fn reconstruct(&self, id: i64) -> SearchResult<Vec<f32>>;
}

/// Distance used to compare vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Squared euclidean distance, smaller is closer
    #[default]
    L2,
    /// Dot product, larger is closer
    InnerProduct,
}

impl MetricType {
    /// Distance between two vectors under this metric
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            MetricType::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum(),
            MetricType::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }

    /// True when `a` ranks ahead of `b`
    pub fn is_better(&self, a: f32, b: f32) -> bool {
        match self {
            MetricType::L2 => a < b,
            MetricType::InnerProduct => a > b,
        }
    }

    /// Distance reported for an unfilled result slot
    pub fn worst(&self) -> f32 {
        match self {
            MetricType::L2 => f32::INFINITY,
            MetricType::InnerProduct => f32::NEG_INFINITY,
        }
    }

    /// Orders two distances best first
    pub fn compare(&self, a: f32, b: f32) -> std::cmp::Ordering {
        match self {
            MetricType::L2 => a.total_cmp(&b),
            MetricType::InnerProduct => b.total_cmp(&a),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::L2 => write!(f, "l2"),
            MetricType::InnerProduct => write!(f, "inner_product"),
        }
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Ok(MetricType::L2),
            "ip" | "inner_product" | "dot" | "cosine" => Ok(MetricType::InnerProduct),
            other => Err(format!("unknown metric '{}', expected l2 or ip", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_from_str_aliases() {
        assert_eq!("L2".parse::<MetricType>().unwrap(), MetricType::L2);
        assert_eq!("euclidean".parse::<MetricType>().unwrap(), MetricType::L2);
        assert_eq!("ip".parse::<MetricType>().unwrap(), MetricType::InnerProduct);
        assert_eq!(
            "cosine".parse::<MetricType>().unwrap(),
            MetricType::InnerProduct
        );
        assert!("manhattan".parse::<MetricType>().is_err());
    }

    #[test]
    fn l2_distance_is_squared() {
        let d = MetricType::L2.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert_eq!(d, 25.0);
    }

    #[test]
    fn ordering_follows_metric_direction() {
        assert!(MetricType::L2.is_better(1.0, 2.0));
        assert!(MetricType::InnerProduct.is_better(2.0, 1.0));
        assert!(MetricType::L2.is_better(1.0, MetricType::L2.worst()));
        assert!(MetricType::InnerProduct.is_better(-1e30, MetricType::InnerProduct.worst()));
    }
}
