use eyre::{Result, WrapErr};
use rpc::faiss::faiss_service_client::FaissServiceClient;
use rpc::faiss::{Neighbor, SearchByIdRequest, SearchRequest, Vector};
use tonic::transport::Channel;
use tracing::debug;

/// Thin wrapper over the generated client that renders responses as lines
pub struct QueryClient {
    inner: FaissServiceClient<Channel>,
}

impl QueryClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        debug!(addr, "Connecting");
        let inner = FaissServiceClient::connect(addr.to_string())
            .await
            .wrap_err_with(|| format!("Failed to connect to {}", addr))?;
        Ok(Self { inner })
    }

    pub async fn heartbeat(&mut self) -> Result<String> {
        let response = self.inner.heartbeat(()).await?.into_inner();
        Ok(format!("message {}", response.message))
    }

    pub async fn search(&mut self, query: Vec<f32>, k: u64) -> Result<Vec<String>> {
        let request = SearchRequest {
            query: Some(Vector { val: query }),
            k,
        };
        let response = self.inner.search(request).await?.into_inner();
        Ok(neighbor_lines(&response.neighbors))
    }

    pub async fn search_by_id(&mut self, id: i64, k: u64) -> Result<Vec<String>> {
        let response = self
            .inner
            .search_by_id(SearchByIdRequest { id, k })
            .await?
            .into_inner();

        let mut lines = vec![format!("requested id {}", response.request_id)];
        lines.extend(neighbor_lines(&response.neighbors));
        Ok(lines)
    }
}

fn neighbor_lines(neighbors: &[Neighbor]) -> Vec<String> {
    neighbors
        .iter()
        .enumerate()
        .map(|(i, n)| format!("#{}, id: {}, score: {}", i, n.id, n.score))
        .collect()
}
