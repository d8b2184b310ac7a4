//! Fake-probability scores.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Estimated fake-probability in `[0.0, 1.0]`.
///
/// Always finite; construction rejects NaN, infinities and out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub const MIN: Score = Score(0.0);
    pub const MAX: Score = Score(1.0);

    /// Create a score, rejecting values outside `[0.0, 1.0]`.
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if !value.is_finite() {
            return Err(ScoreError::NotFinite(value));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Create a score by clamping into range. NaN maps to 0.0.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("Score is not finite: {0}")]
    NotFinite(f64),

    #[error("Score out of range [0, 1]: {0}")]
    OutOfRange(f64),
}

/// Ordered per-frame scores, in sampling order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSeries {
    scores: Vec<Score>,
}

impl ScoreSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, score: Score) {
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Score> {
        self.scores.iter()
    }

    pub fn as_slice(&self) -> &[Score] {
        &self.scores
    }

    /// Raw values, in sampling order.
    pub fn values(&self) -> Vec<f64> {
        self.scores.iter().map(Score::value).collect()
    }

    /// Arithmetic mean, or `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: f64 = self.scores.iter().map(Score::value).sum();
        Some(sum / self.scores.len() as f64)
    }
}

impl FromIterator<Score> for ScoreSeries {
    fn from_iter<I: IntoIterator<Item = Score>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}
