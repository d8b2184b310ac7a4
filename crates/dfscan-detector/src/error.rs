//! Error types for the detection pipeline.

use dfscan_media::MediaError;
use dfscan_scan_client::ScanError;
use std::time::Duration;
use thiserror::Error;

use crate::state::PipelineState;

pub type DetectorResult<T> = Result<T, DetectorError>;

/// Terminal failure of one invocation.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to open video source: {0}")]
    SourceOpen(#[source] MediaError),

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] MediaError),

    #[error("No frames were sampled, cannot compute a verdict")]
    EmptySeries,

    #[error("Remote scoring failed: {0}")]
    Remote(#[from] ScanError),

    #[error("Invocation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invocation cancelled")]
    Cancelled,

    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

impl DetectorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Map a staging failure, surfacing caller mistakes as input errors.
    pub fn from_staging(err: MediaError) -> Self {
        if err.is_input_error() {
            Self::InvalidInput(err.to_string())
        } else {
            Self::Staging(err)
        }
    }

    /// Stable tag for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::SourceOpen(_) => "source_open",
            Self::Staging(_) => "staging",
            Self::EmptySeries => "empty_series",
            Self::Remote(_) => "remote",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
            Self::InvalidTransition { .. } => "invalid_transition",
        }
    }

    /// True for both the invocation deadline and a remote request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Remote(ScanError::Timeout(_)))
    }

    /// True when the caller supplied something unusable.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_staging_input_errors_become_invalid_input() {
        let err = DetectorError::from_staging(MediaError::EmptyUpload("clip.mp4".into()));
        assert!(matches!(err, DetectorError::InvalidInput(_)));
        assert!(err.is_client_error());

        let err = DetectorError::from_staging(MediaError::FileNotFound(PathBuf::from("/nope")));
        assert!(matches!(err, DetectorError::Staging(_)));
        assert_eq!(err.kind(), "staging");
    }

    #[test]
    fn test_timeouts_recognized_on_both_paths() {
        assert!(DetectorError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(DetectorError::Remote(ScanError::Timeout(Duration::from_secs(1))).is_timeout());
        assert!(!DetectorError::Cancelled.is_timeout());
        assert!(!DetectorError::EmptySeries.is_timeout());
    }

    #[test]
    fn test_transition_error_message() {
        let err = DetectorError::InvalidTransition {
            from: PipelineState::Idle,
            to: PipelineState::Done,
        };
        assert_eq!(err.to_string(), "Invalid pipeline transition from idle to done");
    }
}
