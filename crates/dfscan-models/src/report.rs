//! Detection report returned to the presentation layer.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::backend::BackendKind;
use crate::verdict::Verdict;

/// Unique identifier of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct InvocationId(pub String);

impl InvocationId {
    /// Generate a new random invocation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame counters for a local-path invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameStats {
    /// Frame count declared by the container, if any
    pub declared: Option<u64>,
    /// Frames actually decoded
    pub decoded: u64,
    /// Frames forwarded to the scorer
    pub scored: u64,
    /// Whether decoding stopped on an error rather than a clean end of stream
    pub truncated: bool,
}

/// Terminal output of one successful invocation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectionReport {
    pub invocation_id: InvocationId,
    pub backend: BackendKind,
    pub verdict: Verdict,
    /// Per-frame scores in sampling order (local path only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frame_scores: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<FrameStats>,
    /// Raw response of the scanning service (remote path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_response: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DetectionReport {
    /// Mean frame score for the local path, label-derived score for the remote path.
    pub fn score(&self) -> f64 {
        self.verdict.score
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
