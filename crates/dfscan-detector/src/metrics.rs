//! Detector metrics.
//!
//! Recorded through the `metrics` facade; the host decides whether and where
//! to export them.

use dfscan_models::BackendKind;
use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Finished invocations by backend and outcome.
    pub const INVOCATIONS_TOTAL: &str = "dfscan_invocations_total";

    /// Invocation wall time in seconds by backend.
    pub const INVOCATION_SECONDS: &str = "dfscan_invocation_seconds";

    /// Frames pulled from the decoder.
    pub const FRAMES_DECODED_TOTAL: &str = "dfscan_frames_decoded_total";

    /// Frames forwarded to the frame scorer.
    pub const FRAMES_SCORED_TOTAL: &str = "dfscan_frames_scored_total";

    /// Remote scan requests by outcome.
    pub const REMOTE_REQUESTS_TOTAL: &str = "dfscan_remote_requests_total";

    /// Remote scan latency in seconds.
    pub const REMOTE_LATENCY_SECONDS: &str = "dfscan_remote_latency_seconds";
}

/// Outcome label for successful operations.
pub const OUTCOME_OK: &str = "ok";

/// Record a finished invocation. `outcome` is `ok` or an error kind.
pub fn record_invocation(backend: BackendKind, outcome: &str, elapsed_secs: f64) {
    counter!(
        names::INVOCATIONS_TOTAL,
        "backend" => backend.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::INVOCATION_SECONDS,
        "backend" => backend.as_str()
    )
    .record(elapsed_secs);
}

/// Record frame counters of one sampling pass.
pub fn record_frames(decoded: u64, scored: u64) {
    counter!(names::FRAMES_DECODED_TOTAL).increment(decoded);
    counter!(names::FRAMES_SCORED_TOTAL).increment(scored);
}

/// Record one remote scan request.
pub fn record_remote_request(outcome: &str, elapsed_secs: f64) {
    counter!(
        names::REMOTE_REQUESTS_TOTAL,
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(names::REMOTE_LATENCY_SECONDS).record(elapsed_secs);
}
