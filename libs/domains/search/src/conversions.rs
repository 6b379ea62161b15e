use rpc::faiss::{
    Neighbor as ProtoNeighbor, SearchByIdResponse, SearchResponse, Vector as ProtoVector,
};

use crate::models::{Neighbor, SearchByIdHits};

// ===== Neighbors =====

impl From<Neighbor> for ProtoNeighbor {
    fn from(n: Neighbor) -> Self {
        ProtoNeighbor {
            id: n.id,
            score: n.score,
        }
    }
}

impl From<ProtoNeighbor> for Neighbor {
    fn from(proto: ProtoNeighbor) -> Self {
        Neighbor::new(proto.id, proto.score)
    }
}

// ===== Responses =====

pub fn neighbors_to_response(neighbors: Vec<Neighbor>) -> SearchResponse {
    SearchResponse {
        neighbors: neighbors.into_iter().map(Into::into).collect(),
    }
}

impl From<SearchByIdHits> for SearchByIdResponse {
    fn from(hits: SearchByIdHits) -> Self {
        SearchByIdResponse {
            request_id: hits.request_id,
            neighbors: hits.neighbors.into_iter().map(Into::into).collect(),
        }
    }
}

// ===== Requests =====

/// A missing query message reads as an empty vector, which then fails the
/// dimension check like any other wrong-length query.
pub fn query_from_proto(query: Option<ProtoVector>) -> Vec<f32> {
    query.map(|v| v.val).unwrap_or_default()
}

/// `k` arrives as u64; anything past the platform word size saturates.
pub fn k_from_proto(k: u64) -> usize {
    usize::try_from(k).unwrap_or(usize::MAX)
}
