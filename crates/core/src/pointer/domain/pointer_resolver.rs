use std::path::Path;

use crate::shared::error::ArtworkError;

/// Turns a pointer file into the location of the video it names.
pub trait PointerResolver: Send + Sync {
    /// Returns the trimmed video location (path or URL). No check is made
    /// that the location is reachable; that surfaces when the video is opened.
    fn resolve(&self, pointer_path: &Path) -> Result<String, ArtworkError>;
}
