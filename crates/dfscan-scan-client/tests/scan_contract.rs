//! HTTP contract tests for the scanning service client.

use std::path::PathBuf;
use std::time::Duration;

use dfscan_scan_client::{ScanClient, ScanClientConfig, ScanError};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn client_for(server: &MockServer) -> ScanClient {
    let config = ScanClientConfig::default()
        .with_endpoint(format!("{}/v1/scan", server.uri()))
        .with_api_key(API_KEY)
        .with_timeout(Duration::from_secs(5));
    ScanClient::new(config).unwrap()
}

fn write_video(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("dfscan-abc123.mp4");
    std::fs::write(&path, b"fake mp4 payload").unwrap();
    path
}

#[tokio::test]
async fn test_submit_sends_multipart_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scan"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"holiday.mp4\""))
        .and(body_string_contains("fake mp4 payload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": {"label": "FAKE", "confidence": 0.93}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let report = client_for(&server).submit(&video, "holiday.mp4").await.unwrap();
    assert!(report.is_fake());
    assert_eq!(report.raw["result"]["confidence"], 0.93);
}

#[tokio::test]
async fn test_submit_negative_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"label": "REAL"}})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let report = client_for(&server).submit(&video, "clip.mp4").await.unwrap();
    assert!(!report.is_fake());
    assert_eq!(report.label.as_deref(), Some("REAL"));
}

#[tokio::test]
async fn test_missing_result_is_distinct_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let err = client_for(&server).submit(&video, "clip.mp4").await.unwrap_err();
    assert!(matches!(err, ScanError::MissingResult { .. }), "got {:?}", err);
    assert!(err.is_malformed_response());
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let err = client_for(&server).submit(&video, "clip.mp4").await.unwrap_err();
    assert!(matches!(err, ScanError::InvalidResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let err = client_for(&server).submit(&video, "clip.mp4").await.unwrap_err();
    match err {
        ScanError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let err = client_for(&server).submit(&video, "clip.mp4").await.unwrap_err();
    assert!(err.is_retryable());
    // `expect(1)` is verified when the server drops
}

#[tokio::test]
async fn test_timeout_is_distinct_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": {"label": "REAL"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let config = ScanClientConfig::default()
        .with_endpoint(format!("{}/v1/scan", server.uri()))
        .with_api_key(API_KEY)
        .with_timeout(Duration::from_millis(200));
    let client = ScanClient::new(config).unwrap();

    let err = client.submit(&video, "clip.mp4").await.unwrap_err();
    assert!(matches!(err, ScanError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop a listener so the port is closed
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let config = ScanClientConfig::default()
        .with_endpoint(format!("{}/v1/scan", uri))
        .with_api_key(API_KEY)
        .with_timeout(Duration::from_secs(5));
    let client = ScanClient::new(config).unwrap();

    let dir = TempDir::new().unwrap();
    let video = write_video(&dir);

    let err = client.submit(&video, "clip.mp4").await.unwrap_err();
    assert!(matches!(err, ScanError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_file_fails_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(std::path::Path::new("/no/such/video.mp4"), "video.mp4")
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::ReadFile { .. }), "got {:?}", err);
}
