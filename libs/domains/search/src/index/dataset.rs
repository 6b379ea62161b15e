use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded synthetic vectors used for demo indexes and tests.
///
/// Components are uniform in `[0, 1)` and row `i` has `i / 1000` added to its
/// first component, so ids are loosely ordered along the first axis.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    dimension: usize,
    data: Vec<f32>,
}

impl SyntheticDataset {
    pub fn generate(dimension: usize, rows: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Vec::with_capacity(dimension * rows);

        for i in 0..rows {
            for j in 0..dimension {
                let mut value: f32 = rng.random();
                if j == 0 {
                    value += i as f32 / 1000.0;
                }
                data.push(value);
            }
        }

        Self { dimension, data }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened row-major storage
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dimension..(i + 1) * self.dimension]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_data() {
        let a = SyntheticDataset::generate(8, 100, 42);
        let b = SyntheticDataset::generate(8, 100, 42);
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn first_component_carries_row_offset() {
        let data = SyntheticDataset::generate(4, 3000, 7);
        let row = data.row(2500);
        assert!(row[0] >= 2.5 && row[0] < 3.5);
        assert!(row[1..].iter().all(|v| (0.0..1.0).contains(v)));
    }
}
