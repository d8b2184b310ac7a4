//! Progress reporting for detection invocations.
//!
//! The pipeline emits events through a [`ProgressSender`] without knowing
//! where they go (UI callback, channel, log). Sending never blocks and never
//! fails the invocation.

use dfscan_models::{InvocationId, VerdictLabel};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::state::PipelineState;

/// Progress event emitted during one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Invocation accepted and assigned an ID
    Started { invocation_id: InvocationId },

    /// Pipeline moved to a new state
    StateChanged { state: PipelineState },

    /// Frame source opened; `declared_frames` is the container's best guess
    SourceOpened { declared_frames: Option<u64> },

    /// One frame decoded. `fraction` is non-decreasing and stays at 0.0 while
    /// the total is unknown.
    FrameConsumed {
        index: u64,
        sampled: bool,
        fraction: f64,
    },

    /// Whole file handed to the remote service
    Submitting,

    /// Verdict produced
    Complete { label: VerdictLabel, score: f64 },

    /// Invocation failed
    Failed { error: String },
}

impl ProgressEvent {
    /// Completion fraction carried by this event, if any.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            ProgressEvent::FrameConsumed { fraction, .. } => Some(*fraction),
            ProgressEvent::Complete { .. } => Some(1.0),
            _ => None,
        }
    }
}

/// Progress callback type.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Cloneable handle the pipeline reports through.
#[derive(Clone)]
pub struct ProgressSender {
    callback: ProgressCallback,
}

impl ProgressSender {
    pub fn new(callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A sender that discards every event.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn send(&self, event: ProgressEvent) {
        (self.callback)(event);
    }

    pub fn started(&self, invocation_id: &InvocationId) {
        self.send(ProgressEvent::Started {
            invocation_id: invocation_id.clone(),
        });
    }

    pub fn state_changed(&self, state: PipelineState) {
        self.send(ProgressEvent::StateChanged { state });
    }

    pub fn source_opened(&self, declared_frames: Option<u64>) {
        self.send(ProgressEvent::SourceOpened { declared_frames });
    }

    pub fn frame_consumed(&self, index: u64, sampled: bool, fraction: f64) {
        self.send(ProgressEvent::FrameConsumed {
            index,
            sampled,
            fraction,
        });
    }

    pub fn submitting(&self) {
        self.send(ProgressEvent::Submitting);
    }

    pub fn complete(&self, label: VerdictLabel, score: f64) {
        self.send(ProgressEvent::Complete { label, score });
    }

    pub fn failed(&self, error: impl Into<String>) {
        self.send(ProgressEvent::Failed {
            error: error.into(),
        });
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressSender")
    }
}

/// Receiving half of [`channel`].
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Receive the next progress event.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Try to receive a progress event without blocking.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything buffered so far.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a progress channel pair.
///
/// The channel is unbounded so the pipeline never waits on a slow consumer.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sender = ProgressSender::new(move |event| {
        // Receiver gone means nobody is listening
        let _ = tx.send(event);
    });
    (sender, ProgressReceiver { rx })
}

/// Turns frame counts into a clamped, non-decreasing completion fraction.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    declared: Option<u64>,
    consumed: u64,
    last: f64,
}

impl ProgressTracker {
    pub fn new(declared: Option<u64>) -> Self {
        Self {
            declared,
            consumed: 0,
            last: 0.0,
        }
    }

    /// Count one consumed frame and return the fraction to report.
    pub fn advance(&mut self) -> f64 {
        self.consumed += 1;
        let fraction = match self.declared {
            Some(total) if total > 0 => (self.consumed as f64 / total as f64).min(1.0),
            _ => 0.0,
        };
        self.last = self.last.max(fraction);
        self.last
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn fraction(&self) -> f64 {
        self.last
    }
}
