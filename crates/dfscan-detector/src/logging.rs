//! Structured logging for detection invocations.
//!
//! [`InvocationLogger`] tracks the pipeline stage of one invocation and
//! stamps every line with the invocation ID, backend and current stage, so
//! interleaved invocations can be told apart and a failure shows where it
//! happened. [`init_tracing`] installs the global subscriber for hosts that
//! do not bring their own.

use std::time::Duration;

use dfscan_models::{BackendKind, InvocationId, Verdict};
use tracing::{debug, error, info, warn, Span};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::DetectorError;
use crate::state::PipelineState;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "dfscan=info";

/// Logger bound to a single invocation and its current stage.
#[derive(Debug, Clone)]
pub struct InvocationLogger {
    invocation_id: String,
    backend: BackendKind,
    stage: PipelineState,
}

impl InvocationLogger {
    pub fn new(invocation_id: &InvocationId, backend: BackendKind) -> Self {
        Self {
            invocation_id: invocation_id.to_string(),
            backend,
            stage: PipelineState::Idle,
        }
    }

    pub fn stage(&self) -> PipelineState {
        self.stage
    }

    /// Record a transition. Legality is checked by the caller.
    pub fn enter(&mut self, next: PipelineState) {
        debug!(
            invocation_id = %self.invocation_id,
            backend = %self.backend,
            from = %self.stage,
            stage = %next,
            "Stage changed"
        );
        self.stage = next;
    }

    pub fn log_start(&self, input: &str) {
        info!(
            invocation_id = %self.invocation_id,
            backend = %self.backend,
            stage = %self.stage,
            "Invocation started: {}", input
        );
    }

    /// Frame accounting at the end of a local sampling pass.
    pub fn log_frames(&self, decoded: u64, scored: u64, truncated: bool) {
        info!(
            invocation_id = %self.invocation_id,
            backend = %self.backend,
            stage = %self.stage,
            decoded,
            scored,
            truncated,
            "Sampling pass finished"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            invocation_id = %self.invocation_id,
            backend = %self.backend,
            stage = %self.stage,
            "Invocation warning: {}", message
        );
    }

    /// Log a failure at the stage it happened in. Call before moving to FAILED.
    pub fn log_failure(&self, err: &DetectorError) {
        error!(
            invocation_id = %self.invocation_id,
            backend = %self.backend,
            stage = %self.stage,
            error_kind = err.kind(),
            "Invocation failed: {}", err
        );
    }

    pub fn log_completion(&self, verdict: &Verdict, elapsed: Duration) {
        info!(
            invocation_id = %self.invocation_id,
            backend = %self.backend,
            label = %verdict.label,
            score = verdict.score,
            elapsed_ms = elapsed.as_millis() as u64,
            "Invocation completed"
        );
    }

    /// Span wrapping all work of this invocation.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "invocation",
            invocation_id = %self.invocation_id,
            backend = %self.backend
        )
    }
}

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` selects JSON lines, otherwise human-readable colored
/// output. `RUST_LOG` overrides the default filter. Returns an error instead
/// of panicking when a subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_logger_tracks_stage() {
        let id = InvocationId::new();
        let mut logger = InvocationLogger::new(&id, BackendKind::Local);
        assert_eq!(logger.stage(), PipelineState::Idle);

        logger.enter(PipelineState::SourceOpened);
        logger.enter(PipelineState::Sampling);
        assert_eq!(logger.stage(), PipelineState::Sampling);

        // Logging without a subscriber installed is a no-op
        logger.log_frames(30, 2, false);
        logger.log_failure(&DetectorError::Cancelled);
        assert_eq!(logger.stage(), PipelineState::Sampling);
    }

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        let _ = init_tracing();
        assert!(init_tracing().is_err());
    }
}
