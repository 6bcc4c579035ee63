//! Archive client tests against a mock OpenRS2 server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::{
    ArchiveApi, CacheSnapshot, ClientConfig, OpenRs2Client, ProtocolError, RetryPolicy,
};
use pretty_assertions::assert_eq;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, retry_policy: RetryPolicy) -> OpenRs2Client {
    let config = ClientConfig::default()
        .with_base_url(server.uri())
        .with_retry_policy(retry_policy);
    OpenRs2Client::new(&config).expect("client should build")
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

#[tokio::test]
async fn test_list_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/caches.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id": 1812, "scope": "runescape", "game": "oldschool",
                 "environment": "live", "timestamp": "2024-03-13T11:05:12Z",
                 "builds": [{"major": 221, "minor": 1}]}]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let caches = client_for(&server, RetryPolicy::none())
        .list_caches()
        .await
        .unwrap();
    assert_eq!(caches.len(), 1);
    assert_eq!(caches[0].id, 1812);
    assert_eq!(caches[0].builds[0].to_string(), "221.1");
}

#[tokio::test]
async fn test_group_found_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/caches/runescape/1812/archives/2/groups/10.dat"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0, 0, 0, 0, 1, 9]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/caches/runescape/1812/archives/2/groups/11.dat"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server, RetryPolicy::none());
    let snapshot = CacheSnapshot::osrs(1812);

    let found = client
        .group(&snapshot, IndexId(2), ArchiveId(10))
        .await
        .unwrap();
    assert_eq!(found.unwrap().as_ref(), &[0, 0, 0, 0, 1, 9]);

    let missing = client
        .group(&snapshot, IndexId(2), ArchiveId(11))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_server_error_carries_status_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/caches/runescape/5/keys.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server, RetryPolicy::none())
        .keys(&CacheSnapshot::osrs(5))
        .await
        .unwrap_err();
    match err {
        ProtocolError::HttpStatus { status, reason, url } => {
            assert_eq!(status, 500);
            assert_eq!(reason, "Internal Server Error");
            assert!(url.ends_with("/caches/runescape/5/keys.json"));
        }
        other => unreachable!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_flat_export_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/caches/runescape/5/flat.tar.gz"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server, RetryPolicy::none())
        .flat_export(&CacheSnapshot::osrs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/caches/runescape/5/keys.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/caches/runescape/5/keys.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let keys = client_for(&server, fast_retries())
        .keys(&CacheSnapshot::osrs(5))
        .await
        .unwrap();
    assert_eq!(keys.as_ref(), b"[]");
}
