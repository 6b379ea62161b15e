use serde::{Deserialize, Serialize};

/// Sentinel id the index uses for "no neighbor in this slot".
pub const MISSING_ID: i64 = -1;

/// A single search hit: stored vector id plus its distance (or similarity) to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: i64,
    pub score: f32,
}

impl Neighbor {
    pub fn new(id: i64, score: f32) -> Self {
        Self { id, score }
    }
}

/// Raw result of one index search.
///
/// `labels` and `distances` are parallel arrays in best-first order.
/// Slots the index could not fill carry [`MISSING_ID`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    pub distances: Vec<f32>,
    pub labels: Vec<i64>,
}

impl SearchHits {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Pairs every label with its distance, keeping index order.
    pub fn iter(&self) -> impl Iterator<Item = Neighbor> + '_ {
        self.labels
            .iter()
            .zip(self.distances.iter())
            .map(|(&id, &score)| Neighbor::new(id, score))
    }

    /// Neighbors with the sentinel slots dropped.
    pub fn into_neighbors(self) -> Vec<Neighbor> {
        self.iter().filter(|n| n.id != MISSING_ID).collect()
    }
}

/// Neighbors of a stored vector, excluding the vector itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchByIdHits {
    pub request_id: i64,
    pub neighbors: Vec<Neighbor>,
}
