use std::path::Path;
use std::time::Instant;

use domain_search::{IndexAdapter, IvfFlatIndex, IvfFlatParams, MetricType, SyntheticDataset};
use eyre::{Result, WrapErr};
use tracing::info;

/// Shape of the demo index to build
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub dimension: usize,
    pub size: usize,
    pub nlist: usize,
    pub seed: u64,
    pub metric: MetricType,
    pub iterations: usize,
}

/// Generate the seeded dataset, train and fill an IVF-Flat index from it.
pub fn build(spec: &IndexSpec) -> Result<IvfFlatIndex> {
    let started = Instant::now();
    let dataset = SyntheticDataset::generate(spec.dimension, spec.size, spec.seed);
    info!(
        dimension = spec.dimension,
        size = spec.size,
        seed = spec.seed,
        "Generated dataset"
    );

    let params = IvfFlatParams::new(spec.nlist)
        .with_metric(spec.metric)
        .with_seed(spec.seed)
        .with_train_iterations(spec.iterations);

    let index = IvfFlatIndex::build(spec.dimension, params, dataset.as_slice())
        .wrap_err("Failed to build index")?;

    info!(
        total = index.total_count(),
        nlist = spec.nlist,
        metric = %spec.metric,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Index built"
    );
    Ok(index)
}

pub fn run(spec: &IndexSpec, output: &Path) -> Result<()> {
    let index = build(spec)?;
    index
        .save(output)
        .wrap_err_with(|| format!("Failed to write index to {}", output.display()))?;
    println!(
        "wrote {} vectors (dim {}, nlist {}) to {}",
        index.total_count(),
        spec.dimension,
        spec.nlist,
        output.display()
    );
    Ok(())
}
