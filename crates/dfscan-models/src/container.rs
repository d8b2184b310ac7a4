//! Accepted video container types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Container formats accepted for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoContainer {
    Mp4,
    Mov,
    Avi,
}

impl VideoContainer {
    pub const ALL: &'static [VideoContainer] =
        &[VideoContainer::Mp4, VideoContainer::Mov, VideoContainer::Avi];

    /// Canonical file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Mov => "mov",
            VideoContainer::Avi => "avi",
        }
    }

    /// MIME type sent with multipart uploads.
    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "video/mp4",
            VideoContainer::Mov => "video/quicktime",
            VideoContainer::Avi => "video/x-msvideo",
        }
    }

    /// Resolve the container from a file name or path extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UnsupportedContainer> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "mp4" => Ok(VideoContainer::Mp4),
            "mov" => Ok(VideoContainer::Mov),
            "avi" => Ok(VideoContainer::Avi),
            _ => Err(UnsupportedContainer(path.display().to_string())),
        }
    }
}

impl fmt::Display for VideoContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, Error)]
#[error("Unsupported video container (expected mp4, mov or avi): {0}")]
pub struct UnsupportedContainer(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_from_path() {
        assert_eq!(VideoContainer::from_path("clip.mp4").unwrap(), VideoContainer::Mp4);
        assert_eq!(VideoContainer::from_path("/tmp/a/B.MOV").unwrap(), VideoContainer::Mov);
        assert_eq!(VideoContainer::from_path("x.Avi").unwrap(), VideoContainer::Avi);
    }

    #[test]
    fn test_container_rejects_unknown() {
        assert!(VideoContainer::from_path("clip.mkv").is_err());
        assert!(VideoContainer::from_path("noext").is_err());
        assert!(VideoContainer::from_path("").is_err());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(VideoContainer::Mp4.mime_type(), "video/mp4");
        assert_eq!(VideoContainer::Mov.mime_type(), "video/quicktime");
    }
}
