//! Inverted-file index with exact (flat) storage inside each list.
//!
//! Training runs a seeded k-means over the input to obtain `nlist` centroids.
//! Every added vector is assigned to its nearest centroid; a search visits the
//! `probe_count` closest lists and scans them exhaustively.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{IndexAdapter, MetricType};
use crate::error::{SearchError, SearchResult};
use crate::models::{MISSING_ID, SearchHits};

/// At most this many points per list are used for k-means
const MAX_POINTS_PER_CENTROID: usize = 256;

/// Construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvfFlatParams {
    pub nlist: usize,
    pub metric: MetricType,
    pub train_iterations: usize,
    pub seed: u64,
}

impl IvfFlatParams {
    pub fn new(nlist: usize) -> Self {
        Self {
            nlist,
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: MetricType) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_train_iterations(mut self, iterations: usize) -> Self {
        self.train_iterations = iterations;
        self
    }
}

impl Default for IvfFlatParams {
    fn default() -> Self {
        Self {
            nlist: 100,
            metric: MetricType::L2,
            train_iterations: 10,
            seed: 1234,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfFlatIndex {
    dimension: usize,
    params: IvfFlatParams,
    probe_count: u32,
    /// `nlist * dimension` once trained, empty before
    centroids: Vec<f32>,
    /// Ids per inverted list, in insertion order
    lists: Vec<Vec<i64>>,
    /// All stored vectors, indexed by id
    vectors: Vec<f32>,
}

impl IvfFlatIndex {
    pub fn new(dimension: usize, params: IvfFlatParams) -> SearchResult<Self> {
        if dimension == 0 {
            return Err(SearchError::Index("dimension must be positive".to_string()));
        }
        if params.nlist == 0 {
            return Err(SearchError::Index("nlist must be positive".to_string()));
        }

        Ok(Self {
            dimension,
            lists: vec![Vec::new(); params.nlist],
            params,
            probe_count: 1,
            centroids: Vec::new(),
            vectors: Vec::new(),
        })
    }

    /// Trains on `vectors` and then adds them.
    pub fn build(dimension: usize, params: IvfFlatParams, vectors: &[f32]) -> SearchResult<Self> {
        let mut index = Self::new(dimension, params)?;
        index.train(vectors)?;
        index.add(vectors)?;
        Ok(index)
    }

    pub fn nlist(&self) -> usize {
        self.params.nlist
    }

    pub fn metric(&self) -> MetricType {
        self.params.metric
    }

    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SearchResult<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!(
            path = %path.display(),
            total = self.total_count(),
            nlist = self.nlist(),
            "Saved IVF-Flat index"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> SearchResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let index: Self = serde_json::from_reader(reader)?;
        index.check_consistency()?;
        info!(
            path = %path.display(),
            dimension = index.dimension,
            total = index.total_count(),
            nlist = index.nlist(),
            metric = %index.metric(),
            "Loaded IVF-Flat index"
        );
        Ok(index)
    }

    fn check_consistency(&self) -> SearchResult<()> {
        let corrupt = |what: &str| Err(SearchError::Index(format!("corrupt index file: {}", what)));

        if self.dimension == 0 || self.params.nlist == 0 {
            return corrupt("zero dimension or nlist");
        }
        let Some(centroid_values) = self.params.nlist.checked_mul(self.dimension) else {
            return corrupt("nlist * dimension overflows");
        };
        if !self.centroids.is_empty() && self.centroids.len() != centroid_values {
            return corrupt("centroid table size");
        }
        if self.lists.len() != self.params.nlist {
            return corrupt("inverted list count");
        }
        if self.vectors.len() % self.dimension != 0 {
            return corrupt("vector storage size");
        }
        let count = self.vectors.len() / self.dimension;
        if count > 0 && self.centroids.is_empty() {
            return corrupt("vectors stored in an untrained index");
        }

        // Every stored row appears in exactly one list.
        let mut seen = vec![false; count];
        for &id in self.lists.iter().flatten() {
            let Some(slot) = usize::try_from(id).ok().and_then(|i| seen.get_mut(i)) else {
                return corrupt("inverted list id out of range");
            };
            if std::mem::replace(slot, true) {
                return corrupt("duplicate inverted list id");
            }
        }
        if seen.iter().any(|&listed| !listed) {
            return corrupt("row missing from inverted lists");
        }
        Ok(())
    }

    fn rows(&self, vectors: &[f32]) -> SearchResult<usize> {
        if vectors.len() % self.dimension != 0 {
            return Err(SearchError::Index(format!(
                "batch of {} values is not a multiple of dimension {}",
                vectors.len(),
                self.dimension
            )));
        }
        Ok(vectors.len() / self.dimension)
    }

    fn centroid(&self, list: usize) -> &[f32] {
        &self.centroids[list * self.dimension..(list + 1) * self.dimension]
    }

    /// Nearest centroid under L2; the coarse quantizer is always euclidean.
    fn assign(&self, vector: &[f32]) -> usize {
        nearest(&self.centroids, self.dimension, vector)
    }

    /// The `count` lists whose centroids are closest to `query`
    fn probe_lists(&self, query: &[f32], count: usize) -> Vec<usize> {
        let mut ranked: Vec<(f32, usize)> = (0..self.nlist())
            .map(|list| (MetricType::L2.distance(query, self.centroid(list)), list))
            .collect();
        ranked.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked.into_iter().take(count).map(|(_, list)| list).collect()
    }

    fn stored(&self, id: i64) -> &[f32] {
        let start = id as usize * self.dimension;
        &self.vectors[start..start + self.dimension]
    }
}

impl IndexAdapter for IvfFlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn total_count(&self) -> u64 {
        (self.vectors.len() / self.dimension) as u64
    }

    fn probe_count(&self) -> u32 {
        self.probe_count
    }

    fn set_probe_count(&mut self, probe_count: u32) {
        debug!(probe_count, nlist = self.nlist(), "Setting probe count");
        self.probe_count = probe_count;
    }

    fn train(&mut self, vectors: &[f32]) -> SearchResult<()> {
        let rows = self.rows(vectors)?;
        let nlist = self.nlist();
        if rows < nlist {
            return Err(SearchError::Index(format!(
                "need at least {} training vectors for {} lists, got {}",
                nlist, nlist, rows
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let dim = self.dimension;

        let max_points = nlist.saturating_mul(MAX_POINTS_PER_CENTROID);
        let sample: Vec<usize> = if rows > max_points {
            rand::seq::index::sample(&mut rng, rows, max_points).into_vec()
        } else {
            (0..rows).collect()
        };
        let point = |i: usize| &vectors[sample[i] * dim..(sample[i] + 1) * dim];

        let mut centroids = Vec::with_capacity(nlist * dim);
        for i in rand::seq::index::sample(&mut rng, sample.len(), nlist).into_vec() {
            centroids.extend_from_slice(point(i));
        }

        let mut assignment = vec![0usize; sample.len()];
        for iteration in 0..self.params.train_iterations {
            for (i, slot) in assignment.iter_mut().enumerate() {
                *slot = nearest(&centroids, dim, point(i));
            }

            let mut sums = vec![0f32; nlist * dim];
            let mut counts = vec![0usize; nlist];
            for (i, &list) in assignment.iter().enumerate() {
                counts[list] += 1;
                for (acc, v) in sums[list * dim..(list + 1) * dim].iter_mut().zip(point(i)) {
                    *acc += v;
                }
            }

            let mut empty = 0;
            for list in 0..nlist {
                let target = &mut centroids[list * dim..(list + 1) * dim];
                if counts[list] == 0 {
                    // Reseed an empty cluster on a random training point
                    empty += 1;
                    let pick = rng.random_range(0..sample.len());
                    target.copy_from_slice(point(pick));
                } else {
                    let n = counts[list] as f32;
                    for (c, s) in target.iter_mut().zip(&sums[list * dim..(list + 1) * dim]) {
                        *c = s / n;
                    }
                }
            }
            debug!(iteration, empty, "k-means iteration");
        }

        self.centroids = centroids;
        info!(
            points = sample.len(),
            nlist,
            iterations = self.params.train_iterations,
            "Trained coarse quantizer"
        );
        Ok(())
    }

    fn add(&mut self, vectors: &[f32]) -> SearchResult<()> {
        if !self.is_trained() {
            return Err(SearchError::Index("index is not trained".to_string()));
        }
        let rows = self.rows(vectors)?;
        let first_id = self.total_count() as i64;

        for (offset, vector) in vectors.chunks_exact(self.dimension).enumerate() {
            let list = self.assign(vector);
            self.lists[list].push(first_id + offset as i64);
        }
        self.vectors.extend_from_slice(vectors);

        debug!(added = rows, total = self.total_count(), "Added vectors");
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> SearchResult<SearchHits> {
        if query.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if !self.is_trained() {
            return Err(SearchError::Index("index is not trained".to_string()));
        }

        let metric = self.metric();
        let slots = k.min(self.total_count() as usize);
        if slots == 0 {
            return Ok(SearchHits::default());
        }

        let probes = (self.probe_count as usize).clamp(1, self.nlist());
        let mut candidates: Vec<(f32, i64)> = self
            .probe_lists(query, probes)
            .into_iter()
            .flat_map(|list| self.lists[list].iter())
            .map(|&id| (metric.distance(query, self.stored(id)), id))
            .collect();

        let by_rank = |a: &(f32, i64), b: &(f32, i64)| metric.compare(a.0, b.0).then(a.1.cmp(&b.1));
        if candidates.len() > slots {
            candidates.select_nth_unstable_by(slots - 1, by_rank);
            candidates.truncate(slots);
        }
        candidates.sort_unstable_by(by_rank);

        let mut hits = SearchHits {
            distances: Vec::with_capacity(slots),
            labels: Vec::with_capacity(slots),
        };
        for (distance, id) in candidates {
            hits.distances.push(distance);
            hits.labels.push(id);
        }
        hits.distances.resize(slots, metric.worst());
        hits.labels.resize(slots, MISSING_ID);

        Ok(hits)
    }

    fn reconstruct(&self, id: i64) -> SearchResult<Vec<f32>> {
        let total = self.total_count() as i64;
        if id < 0 || id >= total {
            return Err(SearchError::IdOutOfRange { max_id: total - 1 });
        }
        Ok(self.stored(id).to_vec())
    }
}

/// Index of the centroid closest to `vector` in a flat centroid table
fn nearest(centroids: &[f32], dim: usize, vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (list, centroid) in centroids.chunks_exact(dim).enumerate() {
        let distance = MetricType::L2.distance(vector, centroid);
        if distance < best_distance {
            best = list;
            best_distance = distance;
        }
    }
    best
}
