//! Scan client error types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No API key configured for the scanning service")]
    MissingCredential,

    #[error("Invalid scan endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to read video {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Scan request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Scanning service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Response has no `result` field")]
    MissingResult { body: serde_json::Value },

    #[error("Malformed `result` field: {0}")]
    MalformedResult(String),
}

impl ScanError {
    /// Stable tag for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::MissingCredential => "missing_credential",
            ScanError::InvalidEndpoint(_) => "invalid_endpoint",
            ScanError::ReadFile { .. } => "read_file",
            ScanError::Network(_) => "network",
            ScanError::Timeout(_) => "timeout",
            ScanError::Status { .. } => "status",
            ScanError::InvalidResponse(_) => "invalid_response",
            ScanError::MissingResult { .. } => "missing_result",
            ScanError::MalformedResult(_) => "malformed_result",
        }
    }

    /// The service answered, but not with a usable scan result.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidResponse(_)
                | ScanError::MissingResult { .. }
                | ScanError::MalformedResult(_)
        )
    }

    /// Whether a caller-level retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScanError::Network(_) | ScanError::Timeout(_) => true,
            ScanError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this is a configuration problem detectable before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ScanError::MissingCredential | ScanError::InvalidEndpoint(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = ScanError::MissingResult {
            body: serde_json::json!({}),
        };
        assert!(missing.is_malformed_response());
        assert!(!missing.is_retryable());
        assert_eq!(missing.kind(), "missing_result");

        let unavailable = ScanError::Status {
            status: 503,
            body: String::new(),
        };
        assert!(unavailable.is_retryable());
        assert!(!unavailable.is_malformed_response());

        let forbidden = ScanError::Status {
            status: 403,
            body: String::new(),
        };
        assert!(!forbidden.is_retryable());

        assert!(ScanError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ScanError::MissingCredential.is_configuration());
    }
}
