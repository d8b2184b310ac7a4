//! FFmpeg-backed frame source.
//!
//! Decodes the first video stream to packed `rgb24` on stdout and slices the
//! byte stream into frames. The child process is spawned with `kill_on_drop`,
//! so abandoning the source (early return, cancellation, panic unwinding)
//! always terminates the decoder.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::command::{check_ffmpeg, DecodeCommand};
use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, FrameIndex};
use crate::probe::{probe_video, VideoInfo};
use crate::source::{FrameSource, SourceOpener};

/// Largest width or height accepted from ffprobe (8K UHD is 7680 wide).
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Bytes in one packed `rgb24` frame, rejecting empty or oversized streams.
fn frame_size(width: u32, height: u32) -> MediaResult<usize> {
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidVideo(format!(
            "video stream has no dimensions ({}x{})",
            width, height
        )));
    }
    if width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION {
        return Err(MediaError::InvalidVideo(format!(
            "video dimensions {}x{} exceed the {}px limit",
            width, height, MAX_FRAME_DIMENSION
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(3))
        .ok_or_else(|| {
            MediaError::InvalidVideo(format!("video dimensions {}x{} overflow", width, height))
        })
}

/// Streaming decoder over an FFmpeg child process.
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<Option<String>>>,
    frame_bytes: usize,
    /// Read buffer sized once in `open` and refilled for every frame
    buffer: Vec<u8>,
    next_index: FrameIndex,
    finished: bool,
}

impl FfmpegFrameSource {
    /// Probe `path` and start decoding it.
    pub async fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        check_ffmpeg()?;

        let info = probe_video(path).await?;
        let frame_bytes = frame_size(info.width, info.height)?;

        let args = DecodeCommand::new(path).build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("Failed to capture FFmpeg stdout", None, None)
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            MediaError::ffmpeg_failed("Failed to capture FFmpeg stderr", None, None)
        })?;

        // Drain stderr so a chatty decoder never blocks on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut last = None;
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "dfscan_media::ffmpeg", "{}", line);
                last = Some(line);
            }
            last
        });

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            declared_frames = ?info.frame_count,
            "Opened FFmpeg frame source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            child: Some(child),
            stdout: Some(BufReader::new(stdout)),
            stderr_task: Some(stderr_task),
            frame_bytes,
            buffer: vec![0u8; frame_bytes],
            next_index: 0,
            finished: false,
        })
    }

    /// Probe information for the opened file.
    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for a cleanly-ended decoder and surface a non-zero exit.
    async fn finish(&mut self) -> MediaResult<()> {
        self.finished = true;
        self.stdout = None;

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().await?;
        let last_stderr = match self.stderr_task.take() {
            Some(task) => task.await.ok().flatten(),
            None => None,
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg decode exited with non-zero status",
                last_stderr,
                status.code(),
            ))
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn declared_frame_count(&self) -> Option<u64> {
        self.info.frame_count
    }

    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }
        let Some(reader) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut filled = 0;
        while filled < self.frame_bytes {
            let n = reader.read(&mut self.buffer[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.finish().await?;
            return Ok(None);
        }

        if filled < self.frame_bytes {
            let index = self.next_index;
            self.close().await?;
            return Err(MediaError::decode_failed(format!(
                "truncated frame {} in {}: got {} of {} bytes",
                index,
                self.path.display(),
                filled,
                self.frame_bytes
            )));
        }

        let frame = Frame::from_rgb24(
            self.next_index,
            self.info.width,
            self.info.height,
            self.buffer.clone(),
        )?;
        self.next_index += 1;
        Ok(Some(frame))
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.finished = true;
        self.stdout = None;

        if let Some(mut child) = self.child.take() {
            if child.try_wait()?.is_none() {
                debug!(path = %self.path.display(), "Stopping FFmpeg decoder early");
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill FFmpeg decoder: {}", e);
                    return Err(MediaError::from(e));
                }
            }
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Opens `FfmpegFrameSource`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegSourceOpener;

#[async_trait]
impl SourceOpener for FfmpegSourceOpener {
    async fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegFrameSource::open(path).await?))
    }
}
