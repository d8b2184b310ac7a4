//! Final classification of a video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictLabel {
    Genuine,
    LikelyFake,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Genuine => "GENUINE",
            VerdictLabel::LikelyFake => "LIKELY_FAKE",
        }
    }

    pub fn is_fake(&self) -> bool {
        matches!(self, VerdictLabel::LikelyFake)
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a verdict was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerdictBasis {
    /// Mean of per-frame scores.
    FrameMean { frames: usize, threshold: f64 },

    /// Label returned by the remote scanning service.
    RemoteLabel { label: Option<String> },
}

/// Classification plus the score that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub label: VerdictLabel,
    /// Mean frame score, or 1.0 / 0.0 for a remote FAKE / non-FAKE label
    pub score: f64,
    pub basis: VerdictBasis,
}

impl Verdict {
    pub fn is_fake(&self) -> bool {
        self.label.is_fake()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_serde() {
        assert_eq!(
            serde_json::to_string(&VerdictLabel::LikelyFake).unwrap(),
            "\"LIKELY_FAKE\""
        );
        assert_eq!(
            serde_json::from_str::<VerdictLabel>("\"GENUINE\"").unwrap(),
            VerdictLabel::Genuine
        );
    }

    #[test]
    fn test_verdict_display() {
        let verdict = Verdict {
            label: VerdictLabel::LikelyFake,
            score: 0.9,
            basis: VerdictBasis::FrameMean {
                frames: 3,
                threshold: 0.5,
            },
        };
        assert_eq!(verdict.to_string(), "LIKELY_FAKE (0.90)");
        assert!(verdict.is_fake());
    }

    #[test]
    fn test_basis_tagged() {
        let basis = VerdictBasis::RemoteLabel {
            label: Some("FAKE".to_string()),
        };
        let json = serde_json::to_value(&basis).unwrap();
        assert_eq!(json["kind"], "remote_label");
        assert_eq!(json["label"], "FAKE");
    }
}
