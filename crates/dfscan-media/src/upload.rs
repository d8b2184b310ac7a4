//! Temporary on-disk copies of uploaded videos.
//!
//! Decoders and the scanning client both read from a path, so uploaded bytes
//! are staged into a named temp file first. The file is removed by
//! `StagedUpload::cleanup`, and by `Drop` if the owner never gets that far
//! (error paths, timeouts, dropped futures).

use std::path::Path;
use tempfile::TempPath;
use tokio::fs;
use tracing::{debug, warn};

use dfscan_models::VideoContainer;

use crate::error::{MediaError, MediaResult};

/// Prefix of every staged file name.
pub const STAGED_FILE_PREFIX: &str = "dfscan-";

/// An uploaded video written to a temporary file.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    original_name: String,
    container: VideoContainer,
    size: u64,
}

impl StagedUpload {
    /// Write `bytes` to a new temp file inside `work_dir`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` if `original_name` is not an mp4/mov/avi file
    /// - `EmptyUpload` if `bytes` is empty
    /// - `Io` if the work directory or temp file cannot be written
    pub async fn from_bytes(
        work_dir: impl AsRef<Path>,
        original_name: &str,
        bytes: &[u8],
    ) -> MediaResult<Self> {
        let original_name = sanitize_file_name(original_name);
        let container = VideoContainer::from_path(&original_name)
            .map_err(|e| MediaError::UnsupportedFormat(e.to_string()))?;

        if bytes.is_empty() {
            return Err(MediaError::EmptyUpload(original_name));
        }

        let work_dir = work_dir.as_ref();
        if !work_dir.exists() {
            fs::create_dir_all(work_dir).await?;
        }

        let suffix = format!(".{}", container.extension());
        let path = tempfile::Builder::new()
            .prefix(STAGED_FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(work_dir)?
            .into_temp_path();

        // On failure `path` is dropped here, which removes the partial file
        fs::write(&path, bytes).await?;

        debug!(
            "Staged upload {} ({} bytes) at {}",
            original_name,
            bytes.len(),
            path.display()
        );

        Ok(Self {
            path,
            original_name,
            container,
            size: bytes.len() as u64,
        })
    }

    /// Location of the staged copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as supplied by the uploader, without any directory part.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn container(&self) -> VideoContainer {
        self.container
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Remove the staged file, reporting failures instead of ignoring them.
    pub fn cleanup(self) -> MediaResult<()> {
        let shown = self.path.display().to_string();
        self.path.close().map_err(|e| {
            warn!("Failed to remove staged upload {}: {}", shown, e);
            MediaError::from(e)
        })?;
        debug!("Removed staged upload {}", shown);
        Ok(())
    }
}

/// Strip any directory components a client may have sent along with the name.
fn sanitize_file_name(name: &str) -> String {
    let trimmed = name.trim();
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}
