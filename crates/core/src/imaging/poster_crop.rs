use crate::shared::constants::{POSTER_RATIO_HEIGHT, POSTER_RATIO_WIDTH};
use crate::shared::frame::Frame;

/// Pixel rectangle within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered 2:3 rectangle that fits in a `width x height` frame.
///
/// Only removes pixels: a frame already narrower than 2:3 keeps its full
/// width and is trimmed vertically.
pub fn poster_crop_rect(width: u32, height: u32) -> CropRect {
    let (w, h) = (width as u64, height as u64);
    let rw = POSTER_RATIO_WIDTH as u64;
    let rh = POSTER_RATIO_HEIGHT as u64;

    let new_width = w.min(h * rw / rh);
    let new_height = new_width * rh / rw;

    CropRect {
        x: ((w - new_width) / 2) as u32,
        y: ((h - new_height) / 2) as u32,
        width: new_width as u32,
        height: new_height as u32,
    }
}

/// Returns the centered 2:3 crop of `frame`. The input is left untouched.
///
/// The frame must have non-zero dimensions; the decoder rejects empty frames
/// before they get here.
pub fn crop_to_poster(frame: &Frame) -> Frame {
    debug_assert!(!frame.is_empty(), "cannot crop an empty frame");
    let rect = poster_crop_rect(frame.width(), frame.height());
    frame.region(rect.x, rect.y, rect.width, rect.height)
}
