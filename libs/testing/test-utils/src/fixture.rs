use std::sync::OnceLock;

use domain_search::{IvfFlatIndex, IvfFlatParams, MetricType, SyntheticDataset};

pub const TEST_DIMENSION: usize = 64;
pub const TEST_ROWS: usize = 10_000;
pub const TEST_NLIST: usize = 50;
pub const TEST_SEED: u64 = 1234;

/// Seeded dataset plus the IVF-Flat index trained and filled from it.
///
/// Building takes a moment, so one instance is shared per test binary via
/// [`TestIndex::shared`]; tests that need to reconfigure the index clone it.
pub struct TestIndex {
    dataset: SyntheticDataset,
    index: IvfFlatIndex,
}

static SHARED: OnceLock<TestIndex> = OnceLock::new();

impl TestIndex {
    pub fn build(dimension: usize, rows: usize, nlist: usize, seed: u64) -> Self {
        let dataset = SyntheticDataset::generate(dimension, rows, seed);
        let params = IvfFlatParams::new(nlist)
            .with_metric(MetricType::L2)
            .with_seed(seed);
        let index = IvfFlatIndex::build(dimension, params, dataset.as_slice())
            .expect("failed to build test index");

        Self { dataset, index }
    }

    pub fn shared() -> &'static TestIndex {
        SHARED.get_or_init(|| Self::build(TEST_DIMENSION, TEST_ROWS, TEST_NLIST, TEST_SEED))
    }

    pub fn dataset(&self) -> &SyntheticDataset {
        &self.dataset
    }

    pub fn index(&self) -> &IvfFlatIndex {
        &self.index
    }

    /// Independent copy of the index, free to reconfigure
    pub fn fresh_index(&self) -> IvfFlatIndex {
        self.index.clone()
    }
}
