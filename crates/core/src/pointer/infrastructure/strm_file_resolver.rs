use std::path::Path;

use crate::pointer::domain::pointer_resolver::PointerResolver;
use crate::shared::error::ArtworkError;

/// Reads `.strm` files: the whole file, trimmed, is the video location.
pub struct StrmFileResolver;

impl StrmFileResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StrmFileResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerResolver for StrmFileResolver {
    fn resolve(&self, pointer_path: &Path) -> Result<String, ArtworkError> {
        log::debug!("Reading pointer file {}", pointer_path.display());

        let content =
            std::fs::read_to_string(pointer_path).map_err(|source| ArtworkError::Resolution {
                path: pointer_path.to_path_buf(),
                source,
            })?;

        let location = content.trim();
        if location.is_empty() {
            return Err(ArtworkError::EmptyPointer {
                path: pointer_path.to_path_buf(),
            });
        }
        Ok(location.to_string())
    }
}
