use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::shared::constants::DEFAULT_JPEG_QUALITY;
use crate::shared::error::ArtworkError;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames to image files using the `image` crate.
///
/// JPEG output uses the configured quality; other extensions fall back to
/// the crate's default encoder for that format.
pub struct ImageFileWriter {
    jpeg_quality: u8,
}

impl ImageFileWriter {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Sets JPEG quality, clamped to 1..=100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), ArtworkError> {
        let write_err = |reason: String| ArtworkError::Write {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| write_err("frame data does not match its dimensions".to_string()))?;

        if is_jpeg(path) {
            let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
            let mut out = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
            img.write_with_encoder(encoder)
                .map_err(|e| write_err(e.to_string()))?;
            out.flush().map_err(|e| write_err(e.to_string()))?;
        } else {
            img.save(path).map_err(|e| write_err(e.to_string()))?;
        }

        log::debug!(
            "Wrote {}x{} image to {}",
            frame.width(),
            frame.height(),
            path.display()
        );
        Ok(())
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.push(r);
            data.push(g);
            data.push(b);
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_write_creates_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie-fanart.jpg");
        let frame = make_frame(100, 80, 50, 100, 200);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 80);
        assert_eq!(
            image::ImageFormat::from_path(&path).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_write_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("poster.jpg");
        let frame = make_frame(20, 30, 0, 0, 0);
        ImageFileWriter::new().write(&path, &frame).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(50, 50, 50, 100, 200);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_lower_quality_gives_smaller_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = Vec::with_capacity(128 * 128 * 3);
        for i in 0..(128 * 128 * 3) {
            data.push(((i * 7919) % 251) as u8);
        }
        let frame = Frame::new(data, 128, 128, 3, 0);

        let high = dir.path().join("high.jpg");
        let low = dir.path().join("low.jpg");
        ImageFileWriter::new()
            .with_jpeg_quality(95)
            .write(&high, &frame)
            .unwrap();
        ImageFileWriter::new()
            .with_jpeg_quality(10)
            .write(&low, &frame)
            .unwrap();

        let high_len = std::fs::metadata(&high).unwrap().len();
        let low_len = std::fs::metadata(&low).unwrap().len();
        assert!(low_len < high_len);
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(ImageFileWriter::new().with_jpeg_quality(0).jpeg_quality(), 1);
        assert_eq!(
            ImageFileWriter::new().with_jpeg_quality(200).jpeg_quality(),
            100
        );
    }

    #[test]
    fn test_write_into_file_path_parent_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let frame = make_frame(10, 10, 0, 0, 0);
        let err = ImageFileWriter::new()
            .write(&blocker.join("out.jpg"), &frame)
            .unwrap_err();
        assert!(matches!(err, ArtworkError::Write { .. }));
    }
}
