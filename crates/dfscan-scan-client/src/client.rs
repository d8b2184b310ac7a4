//! Scanning service HTTP client.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tokio::fs;
use tracing::{debug, warn};

use dfscan_models::VideoContainer;

use crate::error::{ScanError, ScanResult};
use crate::types::ScanReport;

/// Default scan endpoint.
pub const DEFAULT_SCAN_ENDPOINT: &str = "https://api.deepware.ai/v1/scan";

/// Multipart field carrying the video bytes.
const FILE_FIELD: &str = "file";

/// Longest response body kept in error messages.
const MAX_ERROR_BODY: usize = 2048;

/// Configuration for the scan client.
#[derive(Clone)]
pub struct ScanClientConfig {
    /// Full URL of the scan endpoint
    pub endpoint: String,
    /// Bearer credential
    pub api_key: Option<String>,
    /// Whole-request timeout (upload + scan + response)
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
}

impl Default for ScanClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SCAN_ENDPOINT.to_string(),
            api_key: None,
            timeout: Duration::from_secs(300), // uploads plus server-side analysis
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// Hand-written so the credential never reaches logs.
impl fmt::Debug for ScanClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ScanClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("DFSCAN_API_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_SCAN_ENDPOINT.to_string()),
            api_key: std::env::var("DFSCAN_API_KEY").ok(),
            timeout: Duration::from_secs(
                std::env::var("DFSCAN_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the remote scanning service.
pub struct ScanClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl ScanClient {
    /// Create a new scan client.
    ///
    /// Fails without any I/O when the credential is missing or the endpoint is
    /// not an absolute http(s) URL.
    pub fn new(config: ScanClientConfig) -> ScanResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ScanError::MissingCredential)?
            .to_string();

        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ScanError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ScanError::InvalidEndpoint(format!(
                "{}: unsupported scheme {}",
                config.endpoint,
                endpoint.scheme()
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ScanError::Network)?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            timeout: config.timeout,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ScanResult<Self> {
        Self::new(ScanClientConfig::from_env())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Upload a video and return the parsed scan result.
    ///
    /// Reads the file once, fully, and performs exactly one POST. `file_name`
    /// is sent as the multipart filename (the uploader's original name rather
    /// than the staged temp name).
    pub async fn submit(&self, video_path: &Path, file_name: &str) -> ScanResult<ScanReport> {
        let bytes = fs::read(video_path)
            .await
            .map_err(|source| ScanError::ReadFile {
                path: video_path.to_path_buf(),
                source,
            })?;
        let size = bytes.len();

        let mime = VideoContainer::from_path(file_name)
            .map(|c| c.mime_type())
            .unwrap_or("application/octet-stream");

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(ScanError::Network)?;
        let form = Form::new().part(FILE_FIELD, part);

        debug!(
            endpoint = %self.endpoint,
            file_name,
            bytes = size,
            "Submitting video to scanning service"
        );

        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scanning service responded"
        );

        if !status.is_success() {
            warn!("Scanning service returned {}", status);
            return Err(ScanError::Status {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ScanError::InvalidResponse(format!("body is not JSON ({}): {}", e, truncate(&body)))
        })?;

        ScanReport::from_value(value)
    }

    fn classify(&self, error: reqwest::Error) -> ScanError {
        if error.is_timeout() {
            ScanError::Timeout(self.timeout)
        } else {
            ScanError::Network(error)
        }
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ScanClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_SCAN_ENDPOINT);
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ScanClientConfig::default().with_api_key("super-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_new_requires_credential() {
        assert!(matches!(
            ScanClient::new(ScanClientConfig::default()),
            Err(ScanError::MissingCredential)
        ));
        assert!(matches!(
            ScanClient::new(ScanClientConfig::default().with_api_key("   ")),
            Err(ScanError::MissingCredential)
        ));
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let config = ScanClientConfig::default()
            .with_api_key("k")
            .with_endpoint("not a url");
        assert!(matches!(
            ScanClient::new(config),
            Err(ScanError::InvalidEndpoint(_))
        ));

        let config = ScanClientConfig::default()
            .with_api_key("k")
            .with_endpoint("ftp://example.com/scan");
        assert!(matches!(
            ScanClient::new(config),
            Err(ScanError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "é".repeat(MAX_ERROR_BODY);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= MAX_ERROR_BODY + 3);
    }
}
