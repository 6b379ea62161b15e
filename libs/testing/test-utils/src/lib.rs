//! Shared test utilities for search testing
//!
//! This crate provides reusable test infrastructure for the search crates:
//! - `TestDataBuilder`: Deterministic query vectors and datasets
//! - `TestIndex`: A seeded IVF-Flat index built once per test binary
//! - `assertions`: Custom assertion helpers for neighbor lists
//!
//! Use it from `tests/` directories only; unit tests inside `domain_search`
//! would see a second copy of its types.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_search::IndexAdapter;
//! use test_utils::{TestDataBuilder, TestIndex};
//!
//! let fixture = TestIndex::shared();
//! let index = fixture.index();
//!
//! let builder = TestDataBuilder::from_test_name("my_test");
//! let query = builder.query_vector(index.dimension());
//! let hits = index.search(&query, 10).unwrap();
//! ```

mod fixture;

pub use fixture::{TEST_DIMENSION, TEST_NLIST, TEST_ROWS, TEST_SEED, TestIndex};

use domain_search::SyntheticDataset;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_search_by_id");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform `[0, 1)` vector of length `dimension`
    pub fn query_vector(&self, dimension: usize) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..dimension).map(|_| rng.random()).collect()
    }

    /// Synthetic dataset with the same layout the CLI writes
    pub fn dataset(&self, dimension: usize, rows: usize) -> SyntheticDataset {
        SyntheticDataset::generate(dimension, rows, self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    use domain_search::Neighbor;

    /// Assert that no neighbor carries the `-1` sentinel
    pub fn assert_no_sentinels(neighbors: &[Neighbor], context: &str) {
        assert!(
            neighbors.iter().all(|n| n.id != -1),
            "{}: sentinel id in {:?}",
            context,
            neighbors
        );
    }

    /// Assert that scores never decrease (L2 order, best first)
    pub fn assert_ascending_scores(neighbors: &[Neighbor], context: &str) {
        for pair in neighbors.windows(2) {
            assert!(
                pair[0].score <= pair[1].score,
                "{}: scores out of order {:?}",
                context,
                pair
            );
        }
    }

    /// Ids of a neighbor list, in order
    pub fn ids(neighbors: &[Neighbor]) -> Vec<i64> {
        neighbors.iter().map(|n| n.id).collect()
    }
}
