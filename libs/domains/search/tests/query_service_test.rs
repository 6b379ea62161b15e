//! Query service tests against a real seeded IVF-Flat index
//!
//! These tests verify the request-serving behavior end to end below the
//! transport:
//! - Probe count is applied before serving
//! - Query normalization
//! - Validation messages
//! - Search-by-id self exclusion and over-fetch
//! - Determinism and concurrent reads

use domain_search::*;
use test_utils::assertions::{assert_ascending_scores, assert_no_sentinels, ids};
use test_utils::{TEST_DIMENSION, TEST_NLIST, TEST_ROWS, TestDataBuilder, TestIndex};

fn service(config: ServiceConfig) -> QueryService<IvfFlatIndex> {
    QueryService::new(TestIndex::shared().fresh_index(), config)
}

#[test]
fn test_probe_count_is_applied_at_construction() {
    let service = service(ServiceConfig::new().with_probe_count(10));
    assert_eq!(service.index().probe_count(), 10);

    let default_service = self::service(ServiceConfig::default());
    assert_eq!(default_service.index().probe_count(), 1);
}

#[test]
fn test_search_matches_direct_index_search_with_same_probe_count() {
    let builder = TestDataBuilder::from_test_name("probe_count_matches");
    let query = builder.query_vector(TEST_DIMENSION);

    let service = service(ServiceConfig::new().with_probe_count(10));
    let via_service = service.search(query.clone(), 100).unwrap();

    let mut direct = TestIndex::shared().fresh_index();
    direct.set_probe_count(10);
    let expected = direct.search(&query, 100).unwrap().into_neighbors();

    assert_eq!(via_service, expected);
    assert_eq!(via_service.len(), 100);
    assert_no_sentinels(&via_service, "probe 10");
    assert_ascending_scores(&via_service, "probe 10");
}

#[test]
fn test_more_probes_change_results() {
    let builder = TestDataBuilder::from_test_name("probe_count_differs");
    let query = builder.query_vector(TEST_DIMENSION);

    let wide = service(ServiceConfig::new().with_probe_count(10))
        .search(query.clone(), 100)
        .unwrap();
    let narrow = service(ServiceConfig::new().with_probe_count(1))
        .search(query, 100)
        .unwrap();

    assert_ne!(ids(&wide), ids(&narrow));
    // Probing more lists can only find closer neighbors
    assert!(wide[0].score <= narrow[0].score);
}

#[test]
fn test_normalized_queries_ignore_scale() {
    let builder = TestDataBuilder::from_test_name("normalize_scale");
    let v = builder.query_vector(TEST_DIMENSION);
    let doubled: Vec<f32> = v.iter().map(|x| x * 2.0).collect();

    let service = service(
        ServiceConfig::new()
            .with_probe_count(10)
            .with_normalize_query(true),
    );

    let from_v = service.search(v, 20).unwrap();
    let from_2v = service.search(doubled, 20).unwrap();

    assert_eq!(ids(&from_v), ids(&from_2v));
}

#[test]
fn test_unnormalized_queries_depend_on_scale() {
    let builder = TestDataBuilder::from_test_name("normalize_scale");
    let v = builder.query_vector(TEST_DIMENSION);
    let doubled: Vec<f32> = v.iter().map(|x| x * 2.0).collect();

    let service = service(ServiceConfig::new().with_probe_count(10));

    let from_v = service.search(v, 20).unwrap();
    let from_2v = service.search(doubled, 20).unwrap();

    assert_ne!(from_v, from_2v);
}

#[test]
fn test_normalized_query_matches_direct_search_with_unit_vector() {
    let builder = TestDataBuilder::from_test_name("normalize_direct");
    let v = builder.query_vector(TEST_DIMENSION);

    let service = service(
        ServiceConfig::new()
            .with_probe_count(10)
            .with_normalize_query(true),
    );
    let via_service = service.search(v.clone(), 20).unwrap();

    let mut unit = v;
    domain_search::service::normalize_l2(&mut unit).unwrap();
    let mut direct = TestIndex::shared().fresh_index();
    direct.set_probe_count(10);
    let expected = direct.search(&unit, 20).unwrap().into_neighbors();

    assert_eq!(via_service, expected);
}

#[test]
fn test_dimension_mismatch_message() {
    let service = service(ServiceConfig::default());

    let err = service.search(vec![0.1; 128], 10).unwrap_err();
    assert_eq!(
        err.to_string(),
        "query vector dimension mismatch expected 64 but passed 128"
    );

    let status: tonic::Status = err.into();
    assert_eq!(status.code(), tonic::Code::InvalidArgument);
}

#[test]
fn test_search_by_id_out_of_range_reports_max_id() {
    let service = service(ServiceConfig::default());
    let expected = format!("request id must be 0 <= id <= {}", TEST_ROWS - 1);

    for id in [-1, TEST_ROWS as i64, TEST_ROWS as i64 + 1000] {
        let err = service.search_by_id(id, 10).unwrap_err();
        assert_eq!(err.to_string(), expected, "id {}", id);
    }
}

#[test]
fn test_search_by_id_excludes_self_and_fills_k() {
    let service = service(ServiceConfig::new().with_probe_count(TEST_NLIST as u32));

    for id in [0_i64, 4321, TEST_ROWS as i64 - 1] {
        let result = service.search_by_id(id, 10).unwrap();

        assert_eq!(result.request_id, id);
        assert_eq!(result.neighbors.len(), 10, "id {}", id);
        assert!(!ids(&result.neighbors).contains(&id));
        assert_no_sentinels(&result.neighbors, "search_by_id");
        assert_ascending_scores(&result.neighbors, "search_by_id");
    }
}

#[test]
fn test_search_by_id_neighbors_match_search_on_stored_vector() {
    let fixture = TestIndex::shared();
    let service = service(ServiceConfig::new().with_probe_count(10));
    let id = 777;

    let by_id = service.search_by_id(id, 5).unwrap();
    let by_vector = service
        .search(fixture.dataset().row(id as usize).to_vec(), 6)
        .unwrap();

    let expected: Vec<i64> = ids(&by_vector).into_iter().filter(|&n| n != id).collect();
    assert_eq!(ids(&by_id.neighbors), expected);
}

#[test]
fn test_search_by_id_returns_short_result_when_lists_run_out() {
    // A single probed list holds far fewer than TEST_ROWS vectors.
    let service = service(ServiceConfig::new().with_probe_count(1));
    let k = TEST_ROWS;

    let result = service.search_by_id(42, k).unwrap();

    assert!(result.neighbors.len() < k);
    assert!(!result.neighbors.is_empty());
    assert!(!ids(&result.neighbors).contains(&42));
    assert_no_sentinels(&result.neighbors, "short result");
}

#[test]
fn test_zero_k_returns_nothing() {
    let service = service(ServiceConfig::default());
    let builder = TestDataBuilder::from_test_name("zero_k");

    assert!(
        service
            .search(builder.query_vector(TEST_DIMENSION), 0)
            .unwrap()
            .is_empty()
    );
    assert!(service.search_by_id(3, 0).unwrap().neighbors.is_empty());
}

#[test]
fn test_repeated_calls_are_deterministic() {
    let builder = TestDataBuilder::from_test_name("determinism");
    let query = builder.query_vector(TEST_DIMENSION);
    let service = service(ServiceConfig::new().with_probe_count(5));

    let first = service.search(query.clone(), 50).unwrap();
    for _ in 0..5 {
        assert_eq!(service.search(query.clone(), 50).unwrap(), first);
    }

    let by_id = service.search_by_id(100, 20).unwrap();
    assert_eq!(service.search_by_id(100, 20).unwrap(), by_id);
}

#[test]
fn test_concurrent_searches_agree() {
    let builder = TestDataBuilder::from_test_name("concurrent");
    let query = builder.query_vector(TEST_DIMENSION);
    let service = service(ServiceConfig::new().with_probe_count(10));
    let expected = service.search(query.clone(), 25).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let query = query.clone();
                scope.spawn(move || service.search(query, 25).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_heartbeat() {
    assert_eq!(service(ServiceConfig::default()).heartbeat(), "OK");
}
