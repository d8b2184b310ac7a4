//! Sequential frame sources.
//!
//! A `FrameSource` yields decoded frames in order until end of stream. The
//! orchestrator owns the source for exactly one sampling pass and calls
//! `close` on every exit path; implementations must also release their decode
//! handle when dropped.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;

use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, FrameIndex};

/// Ordered supplier of decoded frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Frame count declared by the container. Best effort: may be missing,
    /// zero, or wrong.
    fn declared_frame_count(&self) -> Option<u64>;

    /// Pull the next frame, or `None` at end of stream.
    ///
    /// An `Err` means decoding broke mid-stream; callers may treat it as end
    /// of stream and keep what was decoded so far.
    async fn next_frame(&mut self) -> MediaResult<Option<Frame>>;

    /// Release the decode handle. Idempotent.
    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Opens a `FrameSource` for a video file.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;
}

#[async_trait]
impl<F> SourceOpener for F
where
    F: Fn(&Path) -> MediaResult<Box<dyn FrameSource>> + Send + Sync,
{
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        self(path)
    }
}

/// In-memory frame source, for synthetic input and tests.
#[derive(Debug, Default)]
pub struct VecFrameSource {
    frames: VecDeque<Frame>,
    declared: Option<u64>,
    fail_at: Option<FrameIndex>,
    emitted: FrameIndex,
    closed: bool,
}

impl VecFrameSource {
    /// Source over `frames`, declaring exactly that many.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            declared: Some(frames.len() as u64),
            frames: frames.into(),
            ..Default::default()
        }
    }

    /// `count` identical solid-gray frames of the given size.
    pub fn solid(count: u64, width: u32, height: u32) -> MediaResult<Self> {
        let frames = (0..count)
            .map(|i| Frame::solid(i, width, height, [128, 128, 128]))
            .collect::<MediaResult<Vec<_>>>()?;
        Ok(Self::new(frames))
    }

    /// Override the declared frame count (to simulate inaccurate containers).
    pub fn with_declared_frames(mut self, declared: Option<u64>) -> Self {
        self.declared = declared;
        self
    }

    /// Fail with a decode error when frame `index` would be produced.
    pub fn fail_at(mut self, index: FrameIndex) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl FrameSource for VecFrameSource {
    fn declared_frame_count(&self) -> Option<u64> {
        self.declared
    }

    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.closed {
            return Ok(None);
        }
        if self.fail_at == Some(self.emitted) {
            self.frames.clear();
            return Err(MediaError::decode_failed(format!(
                "synthetic decode failure at frame {}",
                self.emitted
            )));
        }

        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.emitted += 1;
        }
        Ok(frame)
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.closed = true;
        self.frames.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
