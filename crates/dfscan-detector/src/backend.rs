//! Scoring backend selection.

use dfscan_models::BackendKind;
use dfscan_scan_client::ScanClient;
use std::fmt;
use std::sync::Arc;

use crate::config::DetectorConfig;
use crate::error::{DetectorError, DetectorResult};
use crate::remote::RemoteScorer;
use crate::scorer::{FrameScorer, RandomScorer};

/// The scoring strategy used by one detector.
#[derive(Clone)]
pub enum ScoringBackend {
    /// Sample frames and score each one in-process.
    Local(Arc<dyn FrameScorer>),
    /// Send the whole file to the scanning service.
    Remote(Arc<dyn RemoteScorer>),
}

impl ScoringBackend {
    pub fn local(scorer: impl FrameScorer + 'static) -> Self {
        Self::Local(Arc::new(scorer))
    }

    pub fn remote(scorer: impl RemoteScorer + 'static) -> Self {
        Self::Remote(Arc::new(scorer))
    }

    /// Build the backend selected by `config.backend`.
    ///
    /// The local backend uses the placeholder [`RandomScorer`]; the remote
    /// backend needs a credential and a valid endpoint.
    pub fn from_config(config: &DetectorConfig) -> DetectorResult<Self> {
        match config.backend {
            BackendKind::Local => Ok(Self::local(RandomScorer::new())),
            BackendKind::Remote => {
                let client = ScanClient::new(config.scan_client_config())
                    .map_err(|e| DetectorError::config(e.to_string()))?;
                Ok(Self::remote(client))
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local(_) => BackendKind::Local,
            Self::Remote(_) => BackendKind::Remote,
        }
    }
}

impl fmt::Debug for ScoringBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(scorer) => f.debug_tuple("Local").field(&scorer.name()).finish(),
            Self::Remote(_) => f.write_str("Remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_from_config() {
        let backend = ScoringBackend::from_config(&DetectorConfig::default()).unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
        assert_eq!(format!("{:?}", backend), "Local(\"random_placeholder\")");
    }

    #[test]
    fn test_remote_requires_credential() {
        let config = DetectorConfig::default().with_backend(BackendKind::Remote);
        let err = ScoringBackend::from_config(&config).unwrap_err();
        assert!(matches!(err, DetectorError::Config(_)));
    }

    #[test]
    fn test_remote_from_config() {
        let config = DetectorConfig::default()
            .with_backend(BackendKind::Remote)
            .with_api_key("secret");
        let backend = ScoringBackend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), BackendKind::Remote);
    }
}
