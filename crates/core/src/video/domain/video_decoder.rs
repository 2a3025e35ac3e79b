use crate::shared::error::ArtworkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Opens video sources for random-access frame extraction.
///
/// Implementations handle container and codec details; the pipeline only
/// sees [`VideoHandle`] and [`Frame`].
pub trait VideoDecoder: Send + Sync {
    /// Opens the video at `location` (a path or URL).
    fn open(&self, location: &str) -> Result<Box<dyn VideoHandle>, ArtworkError>;
}

/// An opened video. Dropping the handle releases the underlying decoder, so
/// the resource is freed exactly once on every exit path.
pub trait VideoHandle {
    fn metadata(&self) -> &VideoMetadata;

    /// Total decodable frames; 0 means the stream cannot be sampled.
    fn frame_count(&self) -> usize {
        self.metadata().total_frames
    }

    /// Seeks to `index` and decodes that frame.
    ///
    /// Exactness depends on the container's index; some formats only allow
    /// best-effort seeking.
    fn decode(&mut self, index: usize) -> Result<Frame, ArtworkError>;
}
