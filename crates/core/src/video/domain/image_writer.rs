use std::path::Path;

use crate::shared::error::ArtworkError;
use crate::shared::frame::Frame;

/// Encodes a single frame to an image file.
pub trait ImageWriter: Send + Sync {
    /// Writes `frame` to `path`, creating the parent directory if needed.
    /// The format follows the path's extension.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), ArtworkError>;
}
