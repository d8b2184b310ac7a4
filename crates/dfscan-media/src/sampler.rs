//! Fixed-stride frame selection.

use crate::error::{MediaError, MediaResult};
use crate::frame::FrameIndex;

/// Default interval between scored frames.
pub const DEFAULT_SAMPLE_STRIDE: u64 = 15;

/// Selects every `stride`-th frame, starting at index 0.
///
/// Pure and stateless: the decision depends only on the frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampler {
    stride: u64,
}

impl FrameSampler {
    /// Create a sampler. Strides of zero or below are rejected.
    pub fn new(stride: i64) -> MediaResult<Self> {
        if stride <= 0 {
            return Err(MediaError::InvalidStride(stride));
        }
        Ok(Self {
            stride: stride as u64,
        })
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Whether the frame at `index` should be scored.
    pub fn should_sample(&self, index: FrameIndex) -> bool {
        index % self.stride == 0
    }

    /// Indices selected from a source of `total` frames.
    pub fn sampled_indices(&self, total: u64) -> impl Iterator<Item = FrameIndex> {
        (0..total).step_by(self.stride as usize)
    }

    /// Number of frames selected from a source of `total` frames.
    pub fn expected_samples(&self, total: u64) -> u64 {
        total.div_ceil(self.stride)
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            stride: DEFAULT_SAMPLE_STRIDE,
        }
    }
}
