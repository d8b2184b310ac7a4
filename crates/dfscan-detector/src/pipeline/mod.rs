//! Detection orchestrator.
//!
//! One [`Detector`] call runs one invocation through
//! IDLE -> SOURCE_OPENED -> (SAMPLING | SUBMITTING) -> AGGREGATING -> DONE,
//! or to FAILED from any live state. Staged uploads are removed and frame
//! sources closed on every exit path, including timeout and cancellation.

use chrono::{DateTime, Utc};
use dfscan_media::{
    FfmpegSourceOpener, FrameSampler, FrameSource, MediaError, SourceOpener, StagedUpload,
};
use dfscan_models::{
    BackendKind, DetectionReport, FrameStats, InvocationId, ScoreSeries, VideoContainer,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, Instrument};

use crate::aggregate::{remote_verdict, Aggregator};
use crate::backend::ScoringBackend;
use crate::config::DetectorConfig;
use crate::error::{DetectorError, DetectorResult};
use crate::logging::InvocationLogger;
use crate::metrics;
use crate::progress::{ProgressSender, ProgressTracker};
use crate::remote::RemoteScorer;
use crate::scorer::FrameScorer;
use crate::state::PipelineState;


/// Upper bound on pre-allocated score slots, whatever the container claims.
const MAX_PREALLOCATED_SCORES: u64 = 4096;

/// Runs detection invocations against one scoring backend.
pub struct Detector {
    config: DetectorConfig,
    sampler: FrameSampler,
    aggregator: Aggregator,
    backend: ScoringBackend,
    opener: Arc<dyn SourceOpener>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Detector {
    /// Validate `config` and build the backend it selects.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        let backend = ScoringBackend::from_config(&config)?;
        Self::with_backend(config, backend)
    }

    /// Build from environment variables.
    pub fn from_env() -> DetectorResult<Self> {
        Self::new(DetectorConfig::from_env()?)
    }

    /// Use an explicit backend. `config.backend` is ignored.
    pub fn with_backend(config: DetectorConfig, backend: ScoringBackend) -> DetectorResult<Self> {
        config.validate_pipeline()?;
        let sampler = FrameSampler::new(config.sample_stride)
            .map_err(|e| DetectorError::config(e.to_string()))?;
        let aggregator = Aggregator::new(config.threshold)?;

        Ok(Self {
            config,
            sampler,
            aggregator,
            backend,
            opener: Arc::new(FfmpegSourceOpener),
            cancel_rx: None,
        })
    }

    /// Replace the ffmpeg-backed frame source.
    pub fn with_source_opener(mut self, opener: impl SourceOpener + 'static) -> Self {
        self.opener = Arc::new(opener);
        self
    }

    /// Abort invocations once the watched value becomes `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn sampler(&self) -> FrameSampler {
        self.sampler
    }

    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    /// Stage uploaded bytes under the work directory and analyze them.
    ///
    /// The staged copy is removed before this returns, whatever the outcome.
    pub async fn analyze_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &ProgressSender,
    ) -> DetectorResult<DetectionReport> {
        let mut invocation = Invocation::start(self.backend.kind(), progress);
        invocation
            .logger
            .log_start(&format!("upload {} ({} bytes)", file_name, bytes.len()));

        let staged = match StagedUpload::from_bytes(&self.config.work_dir, file_name, bytes).await {
            Ok(staged) => staged,
            Err(e) => return Err(invocation.fail(DetectorError::from_staging(e))),
        };

        let result = self
            .run(&mut invocation, staged.path(), staged.original_name())
            .await;

        if let Err(e) = staged.cleanup() {
            invocation
                .logger
                .log_warning(&format!("staged upload not removed: {}", e));
        }

        result
    }

    /// Analyze a video already on disk. The file is left in place.
    pub async fn analyze_file(
        &self,
        path: &Path,
        progress: &ProgressSender,
    ) -> DetectorResult<DetectionReport> {
        let mut invocation = Invocation::start(self.backend.kind(), progress);
        invocation
            .logger
            .log_start(&format!("file {}", path.display()));

        if let Err(e) = validate_input_file(path).await {
            return Err(invocation.fail(e));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.run(&mut invocation, path, &file_name).await
    }

    /// Drive one invocation to DONE or FAILED.
    async fn run(
        &self,
        invocation: &mut Invocation<'_>,
        path: &Path,
        file_name: &str,
    ) -> DetectorResult<DetectionReport> {
        let span = invocation.logger.create_span();
        let limit = self.config.invocation_timeout;

        let outcome = async {
            match limit {
                Some(limit) => {
                    match tokio::time::timeout(limit, self.execute(invocation, path, file_name))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(DetectorError::Timeout(limit)),
                    }
                }
                None => self.execute(invocation, path, file_name).await,
            }
        }
        .instrument(span)
        .await;

        match outcome {
            Ok(report) => invocation.finish(report),
            Err(e) => Err(invocation.fail(e)),
        }
    }

    async fn execute(
        &self,
        invocation: &mut Invocation<'_>,
        path: &Path,
        file_name: &str,
    ) -> DetectorResult<DetectionReport> {
        self.check_cancelled()?;

        match &self.backend {
            ScoringBackend::Local(scorer) => self.run_local(invocation, scorer.as_ref(), path).await,
            ScoringBackend::Remote(scorer) => {
                self.run_remote(invocation, scorer.as_ref(), path, file_name)
                    .await
            }
        }
    }

    async fn run_local(
        &self,
        invocation: &mut Invocation<'_>,
        scorer: &dyn FrameScorer,
        path: &Path,
    ) -> DetectorResult<DetectionReport> {
        let mut source = self
            .opener
            .open(path)
            .await
            .map_err(DetectorError::SourceOpen)?;

        let declared = source.declared_frame_count();
        debug!(
            "Opened {} source for {} (declared frames: {:?})",
            source.name(),
            path.display(),
            declared
        );

        let pass = self
            .sample_source(invocation, source.as_mut(), scorer, declared)
            .await;

        if let Err(e) = source.close().await {
            invocation
                .logger
                .log_warning(&format!("frame source not released cleanly: {}", e));
        }

        let pass = pass?;
        metrics::record_frames(pass.stats.decoded, pass.stats.scored);
        invocation
            .logger
            .log_frames(pass.stats.decoded, pass.stats.scored, pass.stats.truncated);

        invocation.advance(PipelineState::Aggregating)?;
        let verdict = self.aggregator.reduce(&pass.series)?;

        Ok(DetectionReport {
            invocation_id: invocation.id.clone(),
            backend: BackendKind::Local,
            verdict,
            frame_scores: pass.series.values(),
            frames: Some(pass.stats),
            remote_response: None,
            started_at: invocation.started_at,
            finished_at: Utc::now(),
        })
    }

    /// One sequential pass over the source. Decode errors end the pass early
    /// and keep the scores gathered so far.
    async fn sample_source(
        &self,
        invocation: &mut Invocation<'_>,
        source: &mut dyn FrameSource,
        scorer: &dyn FrameScorer,
        declared: Option<u64>,
    ) -> DetectorResult<SamplingPass> {
        invocation.advance(PipelineState::SourceOpened)?;
        invocation.progress.source_opened(declared);
        invocation.advance(PipelineState::Sampling)?;

        let capacity = declared
            .map(|d| self.sampler.expected_samples(d).min(MAX_PREALLOCATED_SCORES))
            .unwrap_or(0);
        let mut series = ScoreSeries::with_capacity(capacity as usize);
        let mut tracker = ProgressTracker::new(declared);
        let mut stats = FrameStats {
            declared,
            ..FrameStats::default()
        };

        loop {
            self.check_cancelled()?;
            self.check_deadline(invocation)?;
            // In-process sources and scorers never yield on their own
            tokio::task::yield_now().await;

            let frame = match source.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    invocation.logger.log_warning(&format!(
                        "decoding stopped after {} frames: {}",
                        stats.decoded, e
                    ));
                    stats.truncated = true;
                    break;
                }
            };

            let index = stats.decoded;
            let sampled = self.sampler.should_sample(index);
            if sampled {
                series.push(scorer.score(&frame));
                stats.scored += 1;
            }
            drop(frame);

            stats.decoded += 1;
            let fraction = tracker.advance();
            invocation.progress.frame_consumed(index, sampled, fraction);
        }

        Ok(SamplingPass { series, stats })
    }

    async fn run_remote(
        &self,
        invocation: &mut Invocation<'_>,
        scorer: &dyn RemoteScorer,
        path: &Path,
        file_name: &str,
    ) -> DetectorResult<DetectionReport> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DetectorError::SourceOpen(MediaError::FileNotFound(
                path.to_path_buf(),
            )));
        }

        invocation.advance(PipelineState::SourceOpened)?;
        invocation.advance(PipelineState::Submitting)?;
        invocation.progress.submitting();
        self.check_cancelled()?;

        let started = Instant::now();
        let result = scorer.submit(path, file_name).await;
        let outcome = match &result {
            Ok(_) => metrics::OUTCOME_OK,
            Err(e) => e.kind(),
        };
        metrics::record_remote_request(outcome, started.elapsed().as_secs_f64());
        let report = result?;

        invocation.advance(PipelineState::Aggregating)?;
        let verdict = remote_verdict(&report);

        Ok(DetectionReport {
            invocation_id: invocation.id.clone(),
            backend: BackendKind::Remote,
            verdict,
            frame_scores: Vec::new(),
            frames: None,
            remote_response: Some(report.raw),
            started_at: invocation.started_at,
            finished_at: Utc::now(),
        })
    }

    fn check_cancelled(&self) -> DetectorResult<()> {
        match &self.cancel_rx {
            Some(rx) if *rx.borrow() => Err(DetectorError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Fail once the invocation has outlived the configured timeout.
    fn check_deadline(&self, invocation: &Invocation<'_>) -> DetectorResult<()> {
        match self.config.invocation_timeout {
            Some(limit) if invocation.clock.elapsed() >= limit => Err(DetectorError::Timeout(limit)),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("config", &self.config)
            .field("backend", &self.backend)
            .finish()
    }
}

struct SamplingPass {
    series: ScoreSeries,
    stats: FrameStats,
}

/// Bookkeeping for one invocation: state, logging, progress, metrics.
struct Invocation<'a> {
    id: InvocationId,
    backend: BackendKind,
    started_at: DateTime<Utc>,
    clock: Instant,
    logger: InvocationLogger,
    progress: &'a ProgressSender,
}

impl<'a> Invocation<'a> {
    fn start(backend: BackendKind, progress: &'a ProgressSender) -> Self {
        let id = InvocationId::new();
        let logger = InvocationLogger::new(&id, backend);
        progress.started(&id);

        Self {
            id,
            backend,
            started_at: Utc::now(),
            clock: Instant::now(),
            logger,
            progress,
        }
    }

    fn advance(&mut self, next: PipelineState) -> DetectorResult<()> {
        let current = self.logger.stage();
        if !current.can_transition_to(next) {
            return Err(DetectorError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.logger.enter(next);
        self.progress.state_changed(next);
        Ok(())
    }

    fn finish(&mut self, report: DetectionReport) -> DetectorResult<DetectionReport> {
        if let Err(e) = self.advance(PipelineState::Done) {
            return Err(self.fail(e));
        }

        self.progress
            .complete(report.verdict.label, report.verdict.score);
        self.logger
            .log_completion(&report.verdict, self.clock.elapsed());
        metrics::record_invocation(
            self.backend,
            metrics::OUTCOME_OK,
            self.clock.elapsed().as_secs_f64(),
        );

        Ok(report)
    }

    fn fail(&mut self, err: DetectorError) -> DetectorError {
        self.logger.log_failure(&err);
        if !self.logger.stage().is_terminal() {
            self.logger.enter(PipelineState::Failed);
            self.progress.state_changed(PipelineState::Failed);
        }

        self.progress.failed(err.to_string());
        metrics::record_invocation(self.backend, err.kind(), self.clock.elapsed().as_secs_f64());

        err
    }
}

/// Reject paths that cannot be a video before any decoding starts.
async fn validate_input_file(path: &Path) -> DetectorResult<()> {
    VideoContainer::from_path(path).map_err(|e| DetectorError::invalid_input(e.to_string()))?;

    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DetectorError::SourceOpen(MediaError::FileNotFound(path.to_path_buf()))
        } else {
            DetectorError::SourceOpen(MediaError::Io(e))
        }
    })?;

    if !metadata.is_file() {
        return Err(DetectorError::invalid_input(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(DetectorError::invalid_input(format!(
            "{} is empty",
            path.display()
        )));
    }

    Ok(())
}
