//! Client for the remote deepfake scanning service.
//!
//! The service accepts a whole video as a multipart upload and answers with a
//! JSON document whose `result.label` is `"FAKE"` for a positive detection.
//! One `submit` call is exactly one HTTP request; there are no retries.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ScanClient, ScanClientConfig, DEFAULT_SCAN_ENDPOINT};
pub use error::{ScanError, ScanResult};
pub use types::{ScanReport, FAKE_LABEL};
