//! Per-frame scorers for the local path.

use dfscan_media::Frame;
use dfscan_models::Score;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Assigns a fakeness score in [0, 1] to a single frame.
///
/// Implementations must be pure with respect to the pipeline: a score depends
/// only on the frame and the scorer's own state.
pub trait FrameScorer: Send + Sync {
    fn score(&self, frame: &Frame) -> Score;

    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> FrameScorer for F
where
    F: Fn(&Frame) -> Score + Send + Sync,
{
    fn score(&self, frame: &Frame) -> Score {
        self(frame)
    }
}

/// Placeholder scorer drawing uniform random scores.
///
/// Stands in for a trained classifier; verdicts from it carry no meaning.
pub struct RandomScorer {
    rng: Mutex<StdRng>,
}

impl RandomScorer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic scorer for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScorer for RandomScorer {
    fn score(&self, _frame: &Frame) -> Score {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Score::clamped(rng.random::<f64>())
    }

    fn name(&self) -> &'static str {
        "random_placeholder"
    }
}
