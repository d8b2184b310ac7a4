//! FFmpeg decode command arguments.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// Arguments for an FFmpeg process that streams raw `rgb24` frames to stdout.
#[derive(Debug, Clone)]
pub struct DecodeCommand {
    input: PathBuf,
}

impl DecodeCommand {
    /// Create a decode command for the first video stream of `input`.
    pub fn new(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
        }
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "error"]
            .map(String::from)
            .to_vec();

        // Keep decoded dimensions identical to what ffprobe reports
        args.push("-noautorotate".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        // First video stream only, no audio/subtitles
        args.extend(["-map", "0:v:0", "-an", "-sn"].map(String::from));

        // Raw packed RGB to stdout, one frame per decoded picture
        args.extend(["-pix_fmt", "rgb24", "-f", "rawvideo", "-"].map(String::from));

        args
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
