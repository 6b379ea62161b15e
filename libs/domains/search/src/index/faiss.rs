//! Adapter over a native faiss index read from disk.
//!
//! The faiss bindings take `&mut self` for search, so every call goes through
//! a mutex. Probe count and reconstruction go straight to the C API because
//! the safe wrapper does not expose them for arbitrary index types.

use std::path::Path;

use faiss::index::NativeIndex;
use faiss::{Index, IndexImpl};
use parking_lot::Mutex;
use tracing::{info, warn};

use super::IndexAdapter;
use crate::error::{SearchError, SearchResult};
use crate::models::SearchHits;

pub struct FaissIndex {
    inner: Mutex<IndexImpl>,
    dimension: usize,
}

impl FaissIndex {
    /// Reads an index written with `faiss::write_index`.
    ///
    /// IVF indexes get a direct map so stored vectors can be reconstructed.
    pub fn load(path: impl AsRef<Path>) -> SearchResult<Self> {
        let path = path.as_ref();
        let name = path
            .to_str()
            .ok_or_else(|| SearchError::Index(format!("non UTF-8 index path: {}", path.display())))?;

        let index = faiss::read_index(name)?;
        let dimension = index.d() as usize;

        let ivf = unsafe { faiss_sys::faiss_IndexIVF_cast(index.inner_ptr()) };
        if !ivf.is_null() {
            check(unsafe { faiss_sys::faiss_IndexIVF_make_direct_map(ivf, 1) })?;
        }

        info!(
            path = %path.display(),
            dimension,
            total = index.ntotal(),
            ivf = !ivf.is_null(),
            "Loaded faiss index"
        );

        Ok(Self {
            inner: Mutex::new(index),
            dimension,
        })
    }
}

fn check(code: std::os::raw::c_int) -> SearchResult<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(SearchError::Index(format!("faiss call failed with code {}", code)))
    }
}

impl IndexAdapter for FaissIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn total_count(&self) -> u64 {
        self.inner.lock().ntotal()
    }

    fn probe_count(&self) -> u32 {
        let index = self.inner.lock();
        let ivf = unsafe { faiss_sys::faiss_IndexIVF_cast(index.inner_ptr()) };
        if ivf.is_null() {
            1
        } else {
            unsafe { faiss_sys::faiss_IndexIVF_nprobe(ivf) as u32 }
        }
    }

    fn set_probe_count(&mut self, probe_count: u32) {
        let index = self.inner.get_mut();
        let ivf = unsafe { faiss_sys::faiss_IndexIVF_cast(index.inner_ptr()) };
        if ivf.is_null() {
            warn!(probe_count, "Index is not IVF, ignoring probe count");
            return;
        }
        unsafe { faiss_sys::faiss_IndexIVF_set_nprobe(ivf, probe_count as usize) };
    }

    fn train(&mut self, vectors: &[f32]) -> SearchResult<()> {
        self.inner.get_mut().train(vectors)?;
        Ok(())
    }

    fn add(&mut self, vectors: &[f32]) -> SearchResult<()> {
        self.inner.get_mut().add(vectors)?;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> SearchResult<SearchHits> {
        if query.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut index = self.inner.lock();
        let slots = k.min(index.ntotal() as usize);
        if slots == 0 {
            return Ok(SearchHits::default());
        }

        let result = index.search(query, slots)?;
        Ok(SearchHits {
            distances: result.distances,
            labels: result.labels.into_iter().map(|idx| idx.to_native()).collect(),
        })
    }

    fn reconstruct(&self, id: i64) -> SearchResult<Vec<f32>> {
        let index = self.inner.lock();
        let total = index.ntotal() as i64;
        if id < 0 || id >= total {
            return Err(SearchError::IdOutOfRange { max_id: total - 1 });
        }

        let mut vector = vec![0f32; self.dimension];
        check(unsafe {
            faiss_sys::faiss_Index_reconstruct(index.inner_ptr(), id, vector.as_mut_ptr())
        })?;
        Ok(vector)
    }
}
