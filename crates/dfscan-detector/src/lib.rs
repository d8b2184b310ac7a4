//! Deepfake detection pipeline.
//!
//! A [`Detector`] takes an uploaded or on-disk video through one of two
//! scoring backends:
//!
//! - **local**: decode frames sequentially, score every Nth frame with a
//!   [`FrameScorer`], and label the video LIKELY_FAKE when the mean score
//!   exceeds the threshold;
//! - **remote**: submit the whole file to the scanning service and map its
//!   label.
//!
//! Progress is reported through a [`ProgressSender`]; staged uploads never
//! outlive the call that created them.

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod scorer;
pub mod state;

pub use aggregate::{remote_verdict, Aggregator, DEFAULT_THRESHOLD};
pub use backend::ScoringBackend;
pub use config::DetectorConfig;
pub use error::{DetectorError, DetectorResult};
pub use logging::{init_tracing, InvocationLogger};
pub use pipeline::Detector;
pub use progress::{channel, ProgressEvent, ProgressReceiver, ProgressSender, ProgressTracker};
pub use remote::RemoteScorer;
pub use scorer::{FrameScorer, RandomScorer};
pub use state::PipelineState;
