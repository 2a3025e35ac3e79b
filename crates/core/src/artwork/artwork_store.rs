use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::shared::artwork_kind::{ArtworkKind, ArtworkNaming};
use crate::shared::constants::ARTWORK_EXTENSION;
use crate::shared::error::ArtworkError;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Locates and persists artwork next to its pointer file.
///
/// An existing artwork file is never overwritten: its presence is the only
/// record that a previous run already handled that kind.
#[derive(Clone)]
pub struct ArtworkStore {
    writer: Arc<dyn ImageWriter>,
    naming: ArtworkNaming,
}

impl ArtworkStore {
    pub fn new(writer: Arc<dyn ImageWriter>, naming: ArtworkNaming) -> Self {
        Self { writer, naming }
    }

    pub fn naming(&self) -> ArtworkNaming {
        self.naming
    }

    /// Artwork path for `kind`, in the pointer file's directory.
    pub fn path_for(&self, pointer_path: &Path, kind: ArtworkKind) -> PathBuf {
        let stem = pointer_path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let file_name = format!(
            "{}.{ARTWORK_EXTENSION}",
            self.naming.file_stem(&stem, kind)
        );
        match pointer_path.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Requested kinds whose artwork is not on disk yet, in request order.
    pub fn pending(&self, pointer_path: &Path, requested: &[ArtworkKind]) -> Vec<ArtworkKind> {
        requested
            .iter()
            .copied()
            .filter(|&kind| !self.exists(&self.path_for(pointer_path, kind)))
            .collect()
    }

    pub fn write(&self, path: &Path, frame: &Frame) -> Result<(), ArtworkError> {
        self.writer.write(path, frame)
    }
}
