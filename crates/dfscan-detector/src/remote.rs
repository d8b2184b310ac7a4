//! Remote scoring seam.

use async_trait::async_trait;
use dfscan_scan_client::{ScanClient, ScanReport, ScanResult};
use std::path::Path;

/// Submits a whole video to an external scanning service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteScorer: Send + Sync {
    /// One request per call. `file_name` is the name the service sees.
    async fn submit(&self, video_path: &Path, file_name: &str) -> ScanResult<ScanReport>;
}

#[async_trait]
impl RemoteScorer for ScanClient {
    async fn submit(&self, video_path: &Path, file_name: &str) -> ScanResult<ScanReport> {
        ScanClient::submit(self, video_path, file_name).await
    }
}
