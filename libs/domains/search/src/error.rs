use thiserror::Error;

/// Generic message returned to clients when the index itself fails.
/// The underlying diagnostic is logged, never sent over the wire.
pub const INTERNAL_INDEX_MESSAGE: &str = "index operation failed";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query vector dimension mismatch expected {expected} but passed {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("request id must be 0 <= id <= {max_id}")]
    IdOutOfRange { max_id: i64 },

    #[error("query vector must have a non-zero L2 norm to be normalized")]
    ZeroNorm,

    #[error("Index error: {0}")]
    Index(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SearchResult<T> = Result<T, SearchError>;

impl SearchError {
    /// Client-caused failures, reported as `InvalidArgument`.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::DimensionMismatch { .. } | SearchError::IdOutOfRange { .. } | SearchError::ZeroNorm
        )
    }
}

#[cfg(feature = "faiss")]
impl From<faiss::error::Error> for SearchError {
    fn from(err: faiss::error::Error) -> Self {
        SearchError::Index(err.to_string())
    }
}

impl From<SearchError> for tonic::Status {
    fn from(err: SearchError) -> Self {
        if err.is_validation() {
            tonic::Status::invalid_argument(err.to_string())
        } else {
            tonic::Status::internal(INTERNAL_INDEX_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_maps_to_invalid_argument_with_verbatim_message() {
        let status: tonic::Status = SearchError::DimensionMismatch {
            expected: 64,
            actual: 128,
        }
        .into();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(
            status.message(),
            "query vector dimension mismatch expected 64 but passed 128"
        );
    }

    #[test]
    fn id_out_of_range_maps_to_invalid_argument() {
        let status: tonic::Status = SearchError::IdOutOfRange { max_id: 99999 }.into();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "request id must be 0 <= id <= 99999");
    }

    #[test]
    fn zero_norm_maps_to_invalid_argument() {
        let status: tonic::Status = SearchError::ZeroNorm.into();

        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(
            status.message(),
            "query vector must have a non-zero L2 norm to be normalized"
        );
    }

    #[test]
    fn index_errors_do_not_leak_details() {
        let status: tonic::Status =
            SearchError::Index("corrupt inverted list 17 at offset 0xdead".to_string()).into();

        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), INTERNAL_INDEX_MESSAGE);
        assert!(!status.message().contains("0xdead"));
    }
}
