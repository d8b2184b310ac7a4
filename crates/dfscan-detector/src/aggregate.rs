//! Reduction of scores to a verdict.

use dfscan_models::{ScoreSeries, Verdict, VerdictBasis, VerdictLabel};
use dfscan_scan_client::ScanReport;

use crate::error::{DetectorError, DetectorResult};

/// Mean score above which a video is labelled LIKELY_FAKE.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Mean-threshold reducer for the local path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregator {
    threshold: f64,
}

impl Aggregator {
    /// The threshold must lie strictly inside (0, 1).
    pub fn new(threshold: f64) -> DetectorResult<Self> {
        if !threshold.is_finite() || threshold <= 0.0 || threshold >= 1.0 {
            return Err(DetectorError::config(format!(
                "threshold must be between 0 and 1 (exclusive), got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// LIKELY_FAKE iff the arithmetic mean is strictly greater than the
    /// threshold. An empty series is an error, never a default verdict.
    pub fn reduce(&self, series: &ScoreSeries) -> DetectorResult<Verdict> {
        let mean = series.mean().ok_or(DetectorError::EmptySeries)?;
        let label = if mean > self.threshold {
            VerdictLabel::LikelyFake
        } else {
            VerdictLabel::Genuine
        };

        Ok(Verdict {
            label,
            score: mean,
            basis: VerdictBasis::FrameMean {
                frames: series.len(),
                threshold: self.threshold,
            },
        })
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Verdict for the remote path: LIKELY_FAKE iff the service said exactly "FAKE".
pub fn remote_verdict(report: &ScanReport) -> Verdict {
    let (label, score) = if report.is_fake() {
        (VerdictLabel::LikelyFake, 1.0)
    } else {
        (VerdictLabel::Genuine, 0.0)
    };

    Verdict {
        label,
        score,
        basis: VerdictBasis::RemoteLabel {
            label: report.label.clone(),
        },
    }
}
