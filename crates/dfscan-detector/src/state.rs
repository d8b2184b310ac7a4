//! Invocation state machine.
//!
//! ```text
//! IDLE -> SOURCE_OPENED -> SAMPLING   -> AGGREGATING -> DONE
//!                       \-> SUBMITTING -/
//! any non-terminal state -> FAILED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    SourceOpened,
    Sampling,
    Submitting,
    Aggregating,
    Done,
    Failed,
}

impl PipelineState {
    pub const ALL: &'static [PipelineState] = &[
        PipelineState::Idle,
        PipelineState::SourceOpened,
        PipelineState::Sampling,
        PipelineState::Submitting,
        PipelineState::Aggregating,
        PipelineState::Done,
        PipelineState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::SourceOpened => "source_opened",
            PipelineState::Sampling => "sampling",
            PipelineState::Submitting => "submitting",
            PipelineState::Aggregating => "aggregating",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether `next` directly follows `self`.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        match (*self, next) {
            (Idle, SourceOpened)
            | (SourceOpened, Sampling)
            | (SourceOpened, Submitting)
            | (Sampling, Aggregating)
            | (Submitting, Aggregating)
            | (Aggregating, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_transitions() {
        let path = [
            PipelineState::Idle,
            PipelineState::SourceOpened,
            PipelineState::Sampling,
            PipelineState::Aggregating,
            PipelineState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_remote_path_transitions() {
        assert!(PipelineState::SourceOpened.can_transition_to(PipelineState::Submitting));
        assert!(PipelineState::Submitting.can_transition_to(PipelineState::Aggregating));
        assert!(!PipelineState::Submitting.can_transition_to(PipelineState::Sampling));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!PipelineState::Idle.can_transition_to(PipelineState::Sampling));
        assert!(!PipelineState::Sampling.can_transition_to(PipelineState::Done));
        assert!(!PipelineState::Idle.can_transition_to(PipelineState::Done));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for &next in PipelineState::ALL {
            assert!(!PipelineState::Done.can_transition_to(next));
            assert!(!PipelineState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_any_live_state_can_fail() {
        for state in PipelineState::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(state.can_transition_to(PipelineState::Failed));
        }
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&PipelineState::SourceOpened).unwrap();
        assert_eq!(json, "\"source_opened\"");
    }
}
