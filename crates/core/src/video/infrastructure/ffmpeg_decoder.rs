use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;
use ffmpeg_next::Rational;

use crate::shared::error::ArtworkError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_decoder::{VideoDecoder, VideoHandle};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// How far past the last decodable frame a requested index may lie and still
/// resolve to that last frame. Frame counts estimated from duration x frame
/// rate can overshoot by one through rounding.
pub const END_OF_STREAM_SLACK: usize = 1;

/// Opens videos through ffmpeg-next (libavformat + libavcodec).
///
/// Accepts anything libavformat can open: local paths as well as
/// http(s)/smb/etc. URLs found in pointer files.
pub struct FfmpegDecoder;

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn open(&self, location: &str) -> Result<Box<dyn VideoHandle>, ArtworkError> {
        let open_err = |reason: String| ArtworkError::Open {
            location: location.to_string(),
            reason,
        };

        ffmpeg_next::init().map_err(|e| open_err(e.to_string()))?;
        let input =
            ffmpeg_next::format::input(Path::new(location)).map_err(|e| open_err(e.to_string()))?;

        let (stream_index, time_base, start_pts, fps, recorded_frames, stream_duration, parameters) = {
            let stream = input
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| open_err("no video stream found".to_string()))?;
            (
                stream.index(),
                stream.time_base(),
                stream.start_time(),
                frame_rate(&stream),
                stream.frames(),
                stream.duration(),
                stream.parameters(),
            )
        };

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(parameters)
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| open_err(e.to_string()))?;

        let duration_secs = if stream_duration > 0 {
            stream_duration as f64 * f64::from(time_base)
        } else if input.duration() > 0 {
            input.duration() as f64 / MICROS_PER_SECOND
        } else {
            0.0
        };

        let total_frames = if recorded_frames > 0 {
            recorded_frames as usize
        } else {
            VideoMetadata::estimate_frames(duration_secs, fps)
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            location: location.to_string(),
        };

        log::debug!(
            "Opened {location}: {}x{} {} @ {:.3} fps, {} frames",
            metadata.width,
            metadata.height,
            metadata.codec,
            metadata.fps,
            metadata.total_frames
        );

        // AV_NOPTS_VALUE
        let start_pts = if start_pts == i64::MIN { 0 } else { start_pts };

        Ok(Box::new(FfmpegVideoHandle {
            input,
            decoder,
            scaler: None,
            stream_index,
            clock: FrameClock {
                time_base,
                start_pts,
                fps,
            },
            metadata,
        }))
    }
}

/// An open input plus its video decoder. Both are released on drop.
struct FfmpegVideoHandle {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<Scaler>,
    stream_index: usize,
    clock: FrameClock,
    metadata: VideoMetadata,
}

struct Scaler {
    context: scaling::Context,
    format: Pixel,
    width: u32,
    height: u32,
}

impl FfmpegVideoHandle {
    fn decode_err(&self, index: usize, reason: impl Into<String>) -> ArtworkError {
        ArtworkError::Decode {
            location: self.metadata.location.clone(),
            index,
            reason: reason.into(),
        }
    }

    /// Positions the input on the last keyframe at or before `frame`.
    /// Errors are reported against `index`, the frame being decoded.
    fn seek_to(&mut self, frame: usize, index: usize) -> Result<(), ArtworkError> {
        let target = self.clock.seek_timestamp(frame);
        self.input
            .seek(target, ..target)
            .map_err(|e| self.decode_err(index, format!("seek failed: {e}")))?;
        self.decoder.flush();
        Ok(())
    }

    /// Decodes forward from the current position until a frame numbered at
    /// or past `index` appears.
    fn decode_forward(
        &mut self,
        index: usize,
        mut numbering: Numbering,
    ) -> Result<(usize, VideoFrame), Miss> {
        let mut last = None;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }
            if let Some(hit) = drain(&mut self.decoder, &self.clock, index, &mut numbering, &mut last)? {
                return Ok(hit);
            }
        }

        let _ = self.decoder.send_eof();
        match drain(&mut self.decoder, &self.clock, index, &mut numbering, &mut last)? {
            Some(hit) => Ok(hit),
            None => Err(Miss::Ended(last)),
        }
    }

    fn to_rgb(&mut self, decoded: &VideoFrame, index: usize) -> Result<Frame, ArtworkError> {
        let (format, width, height) = (decoded.format(), decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(self.decode_err(index, "decoded frame has zero size"));
        }

        let stale = self
            .scaler
            .as_ref()
            .map_or(true, |s| s.format != format || s.width != width || s.height != height);
        if stale {
            let context = scaling::Context::get(
                format,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| self.decode_err(index, e.to_string()))?;
            self.scaler = Some(Scaler {
                context,
                format,
                width,
                height,
            });
        }

        let mut rgb_frame = VideoFrame::empty();
        let run = match self.scaler.as_mut() {
            Some(scaler) => scaler.context.run(decoded, &mut rgb_frame),
            None => return Err(self.decode_err(index, "no scaler available")),
        };
        run.map_err(|e| self.decode_err(index, e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Frame::new(pixels, width, height, 3, index))
    }
}

impl VideoHandle for FfmpegVideoHandle {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn decode(&mut self, index: usize) -> Result<Frame, ArtworkError> {
        self.seek_to(index, index)?;
        let found = match self.decode_forward(index, Numbering::Timestamps) {
            Err(Miss::Untimed) => {
                log::debug!(
                    "{} has frames without timestamps, counting from the start",
                    self.metadata.location
                );
                self.seek_to(0, index)?;
                self.decode_forward(index, Numbering::Counting { next: 0 })
            }
            other => other,
        };

        let (number, decoded) = match found {
            Ok(hit) => hit,
            Err(Miss::Ended(Some((number, frame)))) if number + END_OF_STREAM_SLACK >= index => {
                log::debug!(
                    "Frame {index} of {} is past the end, using last frame {number}",
                    self.metadata.location
                );
                (number, frame)
            }
            Err(Miss::Ended(Some((number, _)))) => {
                return Err(self.decode_err(index, format!("stream ends at frame {number}")));
            }
            Err(_) => return Err(self.decode_err(index, "no frame decoded after seek")),
        };
        self.to_rgb(&decoded, number)
    }
}

impl Drop for FfmpegVideoHandle {
    fn drop(&mut self) {
        log::trace!("Releasing decoder for {}", self.metadata.location);
    }
}

/// Maps between frame indices and stream timestamps.
#[derive(Clone, Copy, Debug)]
struct FrameClock {
    time_base: Rational,
    start_pts: i64,
    fps: f64,
}

impl FrameClock {
    /// Seek target in `AV_TIME_BASE` units (microseconds).
    fn seek_timestamp(&self, index: usize) -> i64 {
        let start_secs = self.start_pts as f64 * f64::from(self.time_base);
        if self.fps <= 0.0 {
            return (start_secs * MICROS_PER_SECOND) as i64;
        }
        ((start_secs + index as f64 / self.fps) * MICROS_PER_SECOND) as i64
    }

    /// Index of a decoded frame from its timestamp, if it has one and the
    /// frame rate is known.
    fn frame_number(&self, frame: &VideoFrame) -> Option<usize> {
        let pts = frame.timestamp().or_else(|| frame.pts())?;
        if self.fps <= 0.0 {
            return None;
        }
        let secs = (pts - self.start_pts) as f64 * f64::from(self.time_base);
        Some((secs * self.fps).round().max(0.0) as usize)
    }
}

/// How decoded frames are numbered while searching for a target.
#[derive(Clone, Copy, Debug)]
enum Numbering {
    /// From presentation timestamps; valid after any seek.
    Timestamps,
    /// By position, counting from the first frame of the stream. Only valid
    /// after seeking to the start.
    Counting { next: usize },
}

/// Why `decode_forward` did not reach its target.
enum Miss {
    /// A frame had no timestamp, so its position after a seek is unknown.
    Untimed,
    /// The stream ended first. Carries the last decoded frame and its number.
    Ended(Option<(usize, VideoFrame)>),
}

/// Receives every frame the decoder has buffered, returning the first one
/// numbered at or past `index`.
fn drain(
    decoder: &mut ffmpeg_next::decoder::Video,
    clock: &FrameClock,
    index: usize,
    numbering: &mut Numbering,
    last: &mut Option<(usize, VideoFrame)>,
) -> Result<Option<(usize, VideoFrame)>, Miss> {
    loop {
        let mut decoded = VideoFrame::empty();
        if decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let number = match numbering {
            Numbering::Timestamps => clock.frame_number(&decoded).ok_or(Miss::Untimed)?,
            Numbering::Counting { next } => {
                let number = *next;
                *next += 1;
                number
            }
        };
        if number >= index {
            return Ok(Some((number, decoded)));
        }
        *last = Some((number, decoded));
    }
}

fn frame_rate(stream: &ffmpeg_next::format::stream::Stream) -> f64 {
    [stream.avg_frame_rate(), stream.rate()]
        .into_iter()
        .find(|r| r.numerator() > 0 && r.denominator() > 0)
        .map(f64::from)
        .unwrap_or(0.0)
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width * 3); the padding is dropped.
fn extract_rgb_pixels(rgb_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Gray level written into frame `i` of generated test videos.
    pub(crate) fn gray_level(i: usize) -> u8 {
        ((i * 40) % 256) as u8
    }

    /// Encodes an MPEG-4 video whose frame `i` is a flat `gray_level(i)` image.
    pub(crate) fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(Rational(fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);

        octx.write_header().unwrap();

        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = scaling::Context::get(
            Pixel::RGB24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut rgb_frame = VideoFrame::new(Pixel::RGB24, width, height);
            let stride = rgb_frame.stride(0);
            let data = rgb_frame.data_mut(0);
            let value = gray_level(i);
            for row in 0..height as usize {
                for col in 0..width as usize {
                    let offset = row * stride + col * 3;
                    data[offset] = value;
                    data[offset + 1] = value;
                    data[offset + 2] = value;
                }
            }

            let mut yuv_frame = VideoFrame::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));

            encoder.send_frame(&yuv_frame).unwrap();

            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(Rational(1, fps), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }

        octx.write_trailer().unwrap();
    }

    fn test_video_path(dir: &Path) -> PathBuf {
        dir.join("test.mp4")
    }

    fn mean(frame: &Frame) -> f64 {
        frame.data().iter().map(|&v| v as f64).sum::<f64>() / frame.data().len() as f64
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 5, 160, 120, 30);

        let location = path.to_string_lossy().to_string();
        let handle = FfmpegDecoder::new().open(&location).unwrap();
        let meta = handle.metadata();
        assert_eq!(meta.width, 160);
        assert_eq!(meta.height, 120);
        assert!(meta.fps > 0.0);
        assert_eq!(meta.location, location);
        assert_eq!(handle.frame_count(), 5);
    }

    #[test]
    fn test_open_nonexistent_is_open_error() {
        let err = FfmpegDecoder::new()
            .open("/nonexistent/test.mp4")
            .err()
            .unwrap();
        assert!(matches!(err, ArtworkError::Open { .. }));
    }

    #[test]
    fn test_decode_returns_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 10, 160, 120, 30);

        let mut handle = FfmpegDecoder::new().open(&path.to_string_lossy()).unwrap();
        let frame = handle.decode(6).unwrap();
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.width(), 160);
        assert_eq!(frame.height(), 120);
        assert_eq!(frame.data().len(), 160 * 120 * 3);
        assert_eq!(frame.index(), 6);
    }

    #[test]
    fn test_decode_lands_on_requested_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 9, 160, 120, 30);

        let mut handle = FfmpegDecoder::new().open(&path.to_string_lossy()).unwrap();
        for index in [3usize, 7, 1] {
            let frame = handle.decode(index).unwrap();
            let expected = gray_level(index) as f64;
            assert!(
                (mean(&frame) - expected).abs() < 16.0,
                "frame {index}: mean {} expected ~{expected}",
                mean(&frame)
            );
        }
    }

    #[test]
    fn test_decode_same_handle_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 20, 64, 48, 25);

        let mut handle = FfmpegDecoder::new().open(&path.to_string_lossy()).unwrap();
        assert!(handle.decode(15).is_ok());
        assert!(handle.decode(10).is_ok());
    }

    #[test]
    fn test_decode_past_end_of_stream_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 10, 64, 48, 25);

        let mut handle = FfmpegDecoder::new().open(&path.to_string_lossy()).unwrap();
        let err = handle.decode(50).unwrap_err();
        assert!(
            matches!(err, ArtworkError::Decode { index: 50, .. }),
            "unexpected error: {err}"
        );
        // The handle stays usable after a failed decode.
        assert_eq!(handle.decode(4).unwrap().index(), 4);
    }

    #[test]
    fn test_decode_one_past_end_uses_last_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video_path(dir.path());
        create_test_video(&path, 10, 64, 48, 25);

        let mut handle = FfmpegDecoder::new().open(&path.to_string_lossy()).unwrap();
        let frame = handle.decode(10).unwrap();
        assert_eq!(frame.index(), 9);
    }

    #[test]
    fn test_frame_number_from_pts() {
        let clock = FrameClock {
            time_base: Rational(1, 1000),
            start_pts: 0,
            fps: 25.0,
        };
        let mut frame = VideoFrame::new(Pixel::RGB24, 2, 2);
        frame.set_pts(Some(400));
        assert_eq!(clock.frame_number(&frame), Some(10));
    }

    #[test]
    fn test_frame_without_timestamp_has_no_number() {
        let clock = FrameClock {
            time_base: Rational(1, 1000),
            start_pts: 0,
            fps: 25.0,
        };
        let frame = VideoFrame::new(Pixel::RGB24, 2, 2);
        assert_eq!(clock.frame_number(&frame), None);
    }

    #[test]
    fn test_frame_number_needs_frame_rate() {
        let clock = FrameClock {
            time_base: Rational(1, 1000),
            start_pts: 0,
            fps: 0.0,
        };
        let mut frame = VideoFrame::new(Pixel::RGB24, 2, 2);
        frame.set_pts(Some(400));
        assert_eq!(clock.frame_number(&frame), None);
    }

    #[test]
    fn test_seek_timestamp_in_microseconds() {
        let clock = FrameClock {
            time_base: Rational(1, 90_000),
            start_pts: 0,
            fps: 25.0,
        };
        assert_eq!(clock.seek_timestamp(0), 0);
        assert_eq!(clock.seek_timestamp(50), 2_000_000);
    }

    #[test]
    fn test_seek_timestamp_offsets_by_start_time() {
        let clock = FrameClock {
            time_base: Rational(1, 1000),
            start_pts: 500,
            fps: 10.0,
        };
        assert_eq!(clock.seek_timestamp(10), 1_500_000);
    }

    #[test]
    fn test_seek_timestamp_without_rate_goes_to_start() {
        let clock = FrameClock {
            time_base: Rational(1, 1000),
            start_pts: 0,
            fps: 0.0,
        };
        assert_eq!(clock.seek_timestamp(100), 0);
    }
}
