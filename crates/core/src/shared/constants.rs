/// File extension (without dot) that marks a pointer file.
pub const POINTER_EXTENSION: &str = "strm";

/// Extension of generated artwork images.
pub const ARTWORK_EXTENSION: &str = "jpg";

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Poster aspect ratio, width:height.
pub const POSTER_RATIO_WIDTH: u32 = 2;
pub const POSTER_RATIO_HEIGHT: u32 = 3;
