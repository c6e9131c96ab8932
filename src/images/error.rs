// ABOUTME: Error types for image operations.
// ABOUTME: Separates caller mistakes, missing images and runtime failures.

use crate::runtime::RuntimeError;
use crate::types::ParseImageRefError;
use std::path::PathBuf;

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("at least one image name is required")]
    EmptyNameList,

    #[error("invalid image name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: ParseImageRefError,
    },

    #[error("image not found: {0}")]
    NotFound(String),

    #[error("archive not found: {}", .0.display())]
    ArchiveMissing(PathBuf),

    #[error("runtime reported success but wrote no archive at {}", .0.display())]
    ArchiveNotWritten(PathBuf),

    #[error("archive is empty: {}", .0.display())]
    EmptyArchive(PathBuf),

    #[error("failed to save images to {}: {source}", .path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: Box<ImageError>,
    },

    #[error("unexpected runtime output: {0}")]
    UnexpectedOutput(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Markers runtimes use when the named image does not exist.
const MISSING_IMAGE_MARKERS: &[&str] = &["no such image", "no such object", "not found"];

impl ImageError {
    pub fn invalid_name(name: &str, source: ParseImageRefError) -> Self {
        ImageError::InvalidName {
            name: name.to_string(),
            source,
        }
    }

    /// Map a runtime failure for `image`, recognizing "no such image".
    pub fn from_runtime(image: &str, err: RuntimeError) -> Self {
        let detail = err.detail().to_ascii_lowercase();
        if matches!(err, RuntimeError::Execution { .. })
            && MISSING_IMAGE_MARKERS.iter().any(|m| detail.contains(m))
        {
            ImageError::NotFound(image.to_string())
        } else {
            ImageError::Runtime(err)
        }
    }

    /// True when the request itself was wrong and retrying it cannot help.
    pub fn is_client_error(&self) -> bool {
        match self {
            ImageError::EmptyNameList
            | ImageError::InvalidName { .. }
            | ImageError::ArchiveMissing(_) => true,
            ImageError::SaveFailed { source, .. } => source.is_client_error(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ImageError::NotFound(_))
    }
}
