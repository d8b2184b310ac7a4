//! Shared data models for the dfscan deepfake scanner.
//!
//! This crate provides Serde-serializable types for:
//! - Backend selection (local frame model vs. remote scanning service)
//! - Per-frame scores and score series
//! - Verdicts and the final detection report
//! - Accepted video container types

pub mod backend;
pub mod container;
pub mod report;
pub mod score;
pub mod verdict;

// Re-export common types
pub use backend::{BackendKind, BackendKindParseError};
pub use container::{UnsupportedContainer, VideoContainer};
pub use report::{DetectionReport, FrameStats, InvocationId};
pub use score::{Score, ScoreError, ScoreSeries};
pub use verdict::{Verdict, VerdictBasis, VerdictLabel};
