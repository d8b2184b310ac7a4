//! Full invocations against a mocked scanning service and, when available,
//! real ffmpeg decoding.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use dfscan_detector::{
    channel, Detector, DetectorConfig, DetectorError, PipelineState, ProgressEvent, ProgressSender,
    ScoringBackend,
};
use dfscan_media::Frame;
use dfscan_models::{BackendKind, Score, VerdictLabel};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "e2e-key";

fn remote_config(server: &MockServer, work_dir: &Path) -> DetectorConfig {
    let mut config = DetectorConfig::default()
        .with_backend(BackendKind::Remote)
        .with_api_key(API_KEY)
        .with_work_dir(work_dir);
    config.api_endpoint = format!("{}/v1/scan", server.uri());
    config.remote_timeout = Duration::from_secs(5);
    config
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|e| e.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_remote_upload_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scan"))
        .and(header("authorization", "Bearer e2e-key"))
        .and(body_string_contains("filename=\"press-briefing.mp4\""))
        .and(body_string_contains("uploaded video bytes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": {"label": "FAKE"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let work_dir = dir.path().join("uploads");
    let detector = Detector::new(remote_config(&server, &work_dir)).unwrap();
    let (progress, mut events) = channel();

    let report = detector
        .analyze_upload("press-briefing.mp4", b"uploaded video bytes", &progress)
        .await
        .unwrap();

    assert_eq!(report.verdict.label, VerdictLabel::LikelyFake);
    assert_eq!(report.remote_response.unwrap()["result"]["label"], "FAKE");
    assert_eq!(entries(&work_dir), 0);

    let events = events.drain();
    assert!(events.contains(&ProgressEvent::StateChanged {
        state: PipelineState::Submitting
    }));
}

#[tokio::test]
async fn test_remote_failure_still_removes_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("scanner crashed"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let work_dir = dir.path().join("uploads");
    let detector = Detector::new(remote_config(&server, &work_dir)).unwrap();

    let err = detector
        .analyze_upload("clip.avi", b"uploaded video bytes", &ProgressSender::noop())
        .await
        .unwrap_err();

    match err {
        DetectorError::Remote(e) => assert!(e.is_retryable()),
        other => panic!("expected remote error, got {other:?}"),
    }
    assert_eq!(entries(&work_dir), 0);
}

#[tokio::test]
async fn test_remote_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let detector = Detector::new(remote_config(&server, dir.path())).unwrap();

    let err = detector
        .analyze_upload("clip.mov", b"uploaded video bytes", &ProgressSender::noop())
        .await
        .unwrap_err();

    match err {
        DetectorError::Remote(e) => assert!(e.is_malformed_response()),
        other => panic!("expected remote error, got {other:?}"),
    }
}

/// Render a synthetic clip of `frames` frames at 15 fps.
fn render_test_clip(dir: &TempDir, frames: u32) -> PathBuf {
    let path = dir.path().join("synthetic.mp4");
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg("testsrc=size=64x48:rate=15")
        .args(["-frames:v", &frames.to_string(), "-pix_fmt", "yuv420p"])
        .arg(&path)
        .status()
        .expect("ffmpeg should be runnable");
    assert!(status.success());
    path
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_local_pipeline_on_real_video() {
    let input_dir = TempDir::new().unwrap();
    let clip = render_test_clip(&input_dir, 45);
    let bytes = std::fs::read(&clip).unwrap();

    let work = TempDir::new().unwrap();
    let config = DetectorConfig::default().with_work_dir(work.path());
    let scorer = |frame: &Frame| Score::clamped(if frame.width() == 64 { 0.75 } else { 0.0 });
    let detector = Detector::with_backend(config, ScoringBackend::local(scorer)).unwrap();

    let report = detector
        .analyze_upload("synthetic.mp4", &bytes, &ProgressSender::noop())
        .await
        .unwrap();

    let frames = report.frames.unwrap();
    assert_eq!(frames.decoded, 45);
    assert_eq!(frames.scored, 3);
    assert_eq!(report.verdict.label, VerdictLabel::LikelyFake);
    assert_eq!(entries(work.path()), 0);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_corrupt_upload_fails_to_open() {
    let work = TempDir::new().unwrap();
    let config = DetectorConfig::default().with_work_dir(work.path());
    let detector = Detector::new(config).unwrap();

    let err = detector
        .analyze_upload("broken.mp4", b"definitely not an mp4", &ProgressSender::noop())
        .await
        .unwrap_err();

    assert!(matches!(err, DetectorError::SourceOpen(_)));
    assert_eq!(entries(work.path()), 0);
}
