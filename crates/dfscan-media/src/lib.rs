//! Frame decoding, sampling and upload staging.
//!
//! This crate provides:
//! - `Frame`: a decoded RGB image (height x width x 3, u8 per channel)
//! - `FrameSource`: sequential, async frame decoding with deterministic release
//! - `FfmpegFrameSource`: FFmpeg `rawvideo` decoder with FFprobe frame counts
//! - `FrameSampler`: fixed-stride frame selection
//! - `StagedUpload`: temporary on-disk copy of uploaded bytes, removed on drop

pub mod command;
pub mod error;
pub mod ffmpeg_source;
pub mod frame;
pub mod probe;
pub mod sampler;
pub mod source;
pub mod upload;

pub use command::{check_ffmpeg, check_ffprobe, DecodeCommand};
pub use error::{MediaError, MediaResult};
pub use ffmpeg_source::{FfmpegFrameSource, FfmpegSourceOpener};
pub use frame::{Frame, FrameIndex};
pub use probe::{probe_video, VideoInfo};
pub use sampler::{FrameSampler, DEFAULT_SAMPLE_STRIDE};
pub use source::{FrameSource, SourceOpener, VecFrameSource};
pub use upload::StagedUpload;
