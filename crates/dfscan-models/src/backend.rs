//! Scoring backend selection.
//!
//! - `Local`: sampled frames are scored one by one by an in-process model
//! - `Remote`: the whole file is delegated to an external scanning service

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which scoring backend an invocation uses.
///
/// Chosen once per invocation; the two backends are never mixed within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Frame-sampling pipeline with an in-process scorer.
    #[default]
    Local,

    /// Single upload to the remote scanning service.
    Remote,
}

impl BackendKind {
    /// All available backends.
    pub const ALL: &'static [BackendKind] = &[BackendKind::Local, BackendKind::Remote];

    /// Returns the backend name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
        }
    }

    /// Returns a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            BackendKind::Local => "Local (frame-based model)",
            BackendKind::Remote => "Remote scanning service",
        }
    }

    /// Returns true if this backend samples and scores individual frames.
    pub fn samples_frames(&self) -> bool {
        matches!(self, BackendKind::Local)
    }

    /// Returns true if this backend needs an API credential.
    pub fn requires_credential(&self) -> bool {
        matches!(self, BackendKind::Remote)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "frame" => Ok(BackendKind::Local),
            "remote" | "api" => Ok(BackendKind::Remote),
            _ => Err(BackendKindParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown scoring backend: {0}")]
pub struct BackendKindParseError(String);
