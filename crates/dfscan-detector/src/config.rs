//! Detector configuration.
//!
//! Every knob has a default; `from_env` overrides from `DFSCAN_*` variables.
//! Unlike the lenient client config, values that are present but unparseable
//! are rejected so a typo never silently falls back to a default.

use dfscan_media::{FrameSampler, DEFAULT_SAMPLE_STRIDE};
use dfscan_models::BackendKind;
use dfscan_scan_client::{ScanClientConfig, DEFAULT_SCAN_ENDPOINT};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::aggregate::DEFAULT_THRESHOLD;
use crate::error::{DetectorError, DetectorResult};

pub const ENV_BACKEND: &str = "DFSCAN_BACKEND";
pub const ENV_SAMPLE_STRIDE: &str = "DFSCAN_SAMPLE_STRIDE";
pub const ENV_THRESHOLD: &str = "DFSCAN_THRESHOLD";
pub const ENV_API_KEY: &str = "DFSCAN_API_KEY";
pub const ENV_API_ENDPOINT: &str = "DFSCAN_API_ENDPOINT";
pub const ENV_API_TIMEOUT_SECS: &str = "DFSCAN_API_TIMEOUT_SECS";
pub const ENV_INVOCATION_TIMEOUT_SECS: &str = "DFSCAN_INVOCATION_TIMEOUT_SECS";
pub const ENV_WORK_DIR: &str = "DFSCAN_WORK_DIR";

/// Configuration for one [`Detector`](crate::Detector).
#[derive(Clone)]
pub struct DetectorConfig {
    /// Which scoring backend to build
    pub backend: BackendKind,
    /// Score every Nth decoded frame (must be positive)
    pub sample_stride: i64,
    /// Mean score above which a video is LIKELY_FAKE
    pub threshold: f64,
    /// Credential for the remote backend
    pub api_key: Option<String>,
    /// Remote scan endpoint
    pub api_endpoint: String,
    /// Timeout for the single remote request
    pub remote_timeout: Duration,
    /// Deadline for a whole invocation, unbounded when `None`
    pub invocation_timeout: Option<Duration>,
    /// Directory for staged uploads
    pub work_dir: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            sample_stride: DEFAULT_SAMPLE_STRIDE as i64,
            threshold: DEFAULT_THRESHOLD,
            api_key: None,
            api_endpoint: DEFAULT_SCAN_ENDPOINT.to_string(),
            remote_timeout: Duration::from_secs(300),
            invocation_timeout: None,
            work_dir: std::env::temp_dir().join("dfscan"),
        }
    }
}

impl fmt::Debug for DetectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorConfig")
            .field("backend", &self.backend)
            .field("sample_stride", &self.sample_stride)
            .field("threshold", &self.threshold)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_endpoint", &self.api_endpoint)
            .field("remote_timeout", &self.remote_timeout)
            .field("invocation_timeout", &self.invocation_timeout)
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl DetectorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DetectorResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> DetectorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(ENV_BACKEND) {
            config.backend = value
                .parse::<BackendKind>()
                .map_err(|e| DetectorError::config(format!("{}: {}", ENV_BACKEND, e)))?;
        }
        if let Some(value) = get(ENV_SAMPLE_STRIDE) {
            config.sample_stride = parse_var(ENV_SAMPLE_STRIDE, &value)?;
        }
        if let Some(value) = get(ENV_THRESHOLD) {
            config.threshold = parse_var(ENV_THRESHOLD, &value)?;
        }
        if let Some(value) = get(ENV_API_KEY) {
            config.api_key = Some(value);
        }
        if let Some(value) = get(ENV_API_ENDPOINT) {
            config.api_endpoint = value;
        }
        if let Some(value) = get(ENV_API_TIMEOUT_SECS) {
            config.remote_timeout = Duration::from_secs(parse_var(ENV_API_TIMEOUT_SECS, &value)?);
        }
        if let Some(value) = get(ENV_INVOCATION_TIMEOUT_SECS) {
            let secs: u64 = parse_var(ENV_INVOCATION_TIMEOUT_SECS, &value)?;
            config.invocation_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(value) = get(ENV_WORK_DIR) {
            config.work_dir = PathBuf::from(value);
        }

        Ok(config)
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_sample_stride(mut self, stride: i64) -> Self {
        self.sample_stride = stride;
        self
    }

    pub fn with_invocation_timeout(mut self, timeout: Duration) -> Self {
        self.invocation_timeout = Some(timeout);
        self
    }

    /// Check everything the selected backend needs.
    pub fn validate(&self) -> DetectorResult<()> {
        self.validate_pipeline()?;

        if self.backend.requires_credential() {
            let has_key = self
                .api_key
                .as_deref()
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false);
            if !has_key {
                return Err(DetectorError::config(format!(
                    "{} is required for the {} backend",
                    ENV_API_KEY, self.backend
                )));
            }

            let url = Url::parse(&self.api_endpoint).map_err(|e| {
                DetectorError::config(format!("invalid {}: {}", ENV_API_ENDPOINT, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(DetectorError::config(format!(
                    "{} must be an http(s) URL, got {}",
                    ENV_API_ENDPOINT, self.api_endpoint
                )));
            }
        }

        Ok(())
    }

    /// Check the settings shared by every backend.
    pub fn validate_pipeline(&self) -> DetectorResult<()> {
        FrameSampler::new(self.sample_stride).map_err(|e| DetectorError::config(e.to_string()))?;

        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold >= 1.0 {
            return Err(DetectorError::config(format!(
                "threshold must be between 0 and 1 (exclusive), got {}",
                self.threshold
            )));
        }
        if self.remote_timeout.is_zero() {
            return Err(DetectorError::config("remote timeout must be positive"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(DetectorError::config("work directory must not be empty"));
        }

        Ok(())
    }

    /// Client settings for the remote backend.
    pub fn scan_client_config(&self) -> ScanClientConfig {
        let mut config = ScanClientConfig::default()
            .with_endpoint(self.api_endpoint.clone())
            .with_timeout(self.remote_timeout);
        config.api_key = self.api_key.clone();
        config
    }
}

fn parse_var<T>(name: &str, value: &str) -> DetectorResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| DetectorError::config(format!("invalid {} {:?}: {}", name, value, e)))
}
