//! tonic service implementation for `faiss.v1.FaissService`.
//!
//! Each RPC moves its query-service work onto tokio's blocking pool, so the
//! pool size bounds how many index calls run at once.

use observability::search::{OUTCOME_INTERNAL, OUTCOME_INVALID};
use observability::{SearchMetrics, SearchTimer};
use rpc::faiss::faiss_service_server::FaissService as FaissServiceTrait;
use rpc::faiss::{
    HeartbeatResponse, SearchByIdRequest, SearchByIdResponse, SearchRequest, SearchResponse,
};
use tonic::{Request, Response, Status};
use tracing::{error, instrument, warn};

use crate::conversions::{k_from_proto, neighbors_to_response, query_from_proto};
use crate::error::{INTERNAL_INDEX_MESSAGE, SearchError, SearchResult};
use crate::index::IndexAdapter;
use crate::service::QueryService;

/// gRPC service implementation for vector queries
///
/// Wraps the domain QueryService and handles proto ↔ domain conversions.
/// Generic over the index type for testability.
pub struct FaissServiceImpl<I>
where
    I: IndexAdapter + 'static,
{
    service: QueryService<I>,
}

impl<I> FaissServiceImpl<I>
where
    I: IndexAdapter + 'static,
{
    pub fn new(service: QueryService<I>) -> Self {
        Self { service }
    }

    /// Runs `f` on the blocking pool and maps any failure to a status.
    async fn run_blocking<T, F>(&self, timer: SearchTimer, f: F) -> Result<(T, SearchTimer), Status>
    where
        T: Send + 'static,
        F: FnOnce(&QueryService<I>) -> SearchResult<T> + Send + 'static,
    {
        let service = self.service.clone();

        match tokio::task::spawn_blocking(move || f(&service)).await {
            Ok(Ok(value)) => Ok((value, timer)),
            Ok(Err(err)) => Err(failure_status(timer, err)),
            Err(join_err) => {
                error!(error = %join_err, "Query task failed");
                timer.finish_err(OUTCOME_INTERNAL);
                Err(Status::internal(INTERNAL_INDEX_MESSAGE))
            }
        }
    }
}

fn failure_status(timer: SearchTimer, err: SearchError) -> Status {
    if err.is_validation() {
        warn!(error = %err, "Rejected request");
        timer.finish_err(OUTCOME_INVALID);
    } else {
        error!(error = %err, "Index operation failed");
        timer.finish_err(OUTCOME_INTERNAL);
    }
    Status::from(err)
}

#[tonic::async_trait]
impl<I> FaissServiceTrait for FaissServiceImpl<I>
where
    I: IndexAdapter + 'static,
{
    #[instrument(skip_all, fields(k = request.get_ref().k))]
    async fn search(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<Response<SearchResponse>, Status> {
        let req = request.into_inner();
        let query = query_from_proto(req.query);
        let k = k_from_proto(req.k);

        let timer = SearchMetrics::start("search");
        let (neighbors, timer) = self
            .run_blocking(timer, move |service| service.search(query, k))
            .await?;

        timer.finish_ok(neighbors.len());
        Ok(Response::new(neighbors_to_response(neighbors)))
    }

    #[instrument(skip_all, fields(id = request.get_ref().id, k = request.get_ref().k))]
    async fn search_by_id(
        &self,
        request: Request<SearchByIdRequest>,
    ) -> Result<Response<SearchByIdResponse>, Status> {
        let req = request.into_inner();
        let id = req.id;
        let k = k_from_proto(req.k);

        let timer = SearchMetrics::start("search_by_id");
        let (hits, timer) = self
            .run_blocking(timer, move |service| service.search_by_id(id, k))
            .await?;

        timer.finish_ok(hits.neighbors.len());
        Ok(Response::new(hits.into()))
    }

    async fn heartbeat(&self, _request: Request<()>) -> Result<Response<HeartbeatResponse>, Status> {
        Ok(Response::new(HeartbeatResponse {
            message: self.service.heartbeat().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::index::MockIndexAdapter;
    use crate::models::SearchHits;
    use rpc::faiss::Vector;

    fn handler(index: MockIndexAdapter) -> FaissServiceImpl<MockIndexAdapter> {
        FaissServiceImpl::new(QueryService::new(index, ServiceConfig::default()))
    }

    fn mock_index(dimension: usize, total: u64) -> MockIndexAdapter {
        let mut index = MockIndexAdapter::new();
        index.expect_dimension().return_const(dimension);
        index.expect_total_count().return_const(total);
        index.expect_probe_count().return_const(1u32);
        index
    }

    #[tokio::test]
    async fn heartbeat_returns_ok() {
        let response = handler(mock_index(2, 0))
            .heartbeat(Request::new(()))
            .await
            .unwrap();
        assert_eq!(response.into_inner().message, "OK");
    }

    #[tokio::test]
    async fn missing_query_is_a_dimension_mismatch() {
        let status = handler(mock_index(64, 10))
            .search(Request::new(SearchRequest { query: None, k: 5 }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(
            status.message(),
            "query vector dimension mismatch expected 64 but passed 0"
        );
    }

    #[tokio::test]
    async fn zero_query_under_normalization_is_invalid_argument() {
        // No search expectation: the index must not be reached.
        let handler = FaissServiceImpl::new(QueryService::new(
            mock_index(3, 10),
            ServiceConfig::new().with_normalize_query(true),
        ));

        let status = handler
            .search(Request::new(SearchRequest {
                query: Some(Vector { val: vec![0.0; 3] }),
                k: 5,
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(
            status.message(),
            "query vector must have a non-zero L2 norm to be normalized"
        );
    }

    #[tokio::test]
    async fn search_maps_hits_to_proto_neighbors() {
        let mut index = mock_index(2, 10);
        index.expect_search().returning(|_, _| {
            Ok(SearchHits {
                distances: vec![0.5, f32::INFINITY],
                labels: vec![3, -1],
            })
        });

        let response = handler(index)
            .search(Request::new(SearchRequest {
                query: Some(Vector { val: vec![1.0, 0.0] }),
                k: 2,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.neighbors.len(), 1);
        assert_eq!(response.neighbors[0].id, 3);
        assert_eq!(response.neighbors[0].score, 0.5);
    }

    #[tokio::test]
    async fn index_error_is_internal_with_generic_message() {
        let mut index = mock_index(2, 10);
        index
            .expect_search()
            .returning(|_, _| Err(SearchError::Index("inverted list 3 unreadable".to_string())));

        let status = handler(index)
            .search(Request::new(SearchRequest {
                query: Some(Vector { val: vec![1.0, 0.0] }),
                k: 2,
            }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), INTERNAL_INDEX_MESSAGE);
    }

    struct PanickingIndex;

    impl IndexAdapter for PanickingIndex {
        fn dimension(&self) -> usize {
            2
        }
        fn total_count(&self) -> u64 {
            10
        }
        fn probe_count(&self) -> u32 {
            1
        }
        fn set_probe_count(&mut self, _probe_count: u32) {}
        fn train(&mut self, _vectors: &[f32]) -> SearchResult<()> {
            Ok(())
        }
        fn add(&mut self, _vectors: &[f32]) -> SearchResult<()> {
            Ok(())
        }
        fn search(&self, _query: &[f32], _k: usize) -> SearchResult<SearchHits> {
            panic!("index blew up")
        }
        fn reconstruct(&self, _id: i64) -> SearchResult<Vec<f32>> {
            Ok(vec![0.0, 0.0])
        }
    }

    #[tokio::test]
    async fn panicking_index_is_internal_and_service_keeps_working() {
        let handler = FaissServiceImpl::new(QueryService::new(PanickingIndex, ServiceConfig::default()));

        for _ in 0..2 {
            let status = handler
                .search(Request::new(SearchRequest {
                    query: Some(Vector { val: vec![1.0, 0.0] }),
                    k: 2,
                }))
                .await
                .unwrap_err();
            assert_eq!(status.code(), tonic::Code::Internal);
            assert_eq!(status.message(), INTERNAL_INDEX_MESSAGE);
        }

        let response = handler.heartbeat(Request::new(())).await.unwrap();
        assert_eq!(response.into_inner().message, "OK");
    }

    #[tokio::test]
    async fn search_by_id_out_of_range_is_invalid_argument() {
        let status = handler(mock_index(2, 100_000))
            .search_by_id(Request::new(SearchByIdRequest { id: 100_000, k: 5 }))
            .await
            .unwrap_err();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "request id must be 0 <= id <= 99999");
    }

    #[tokio::test]
    async fn search_by_id_echoes_request_id() {
        let mut index = mock_index(2, 10);
        index.expect_reconstruct().returning(|_| Ok(vec![0.0, 1.0]));
        index.expect_search().returning(|_, _| {
            Ok(SearchHits {
                distances: vec![0.0, 0.2],
                labels: vec![6, 2],
            })
        });

        let response = handler(index)
            .search_by_id(Request::new(SearchByIdRequest { id: 6, k: 1 }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.request_id, 6);
        assert_eq!(response.neighbors.len(), 1);
        assert_eq!(response.neighbors[0].id, 2);
    }
}
