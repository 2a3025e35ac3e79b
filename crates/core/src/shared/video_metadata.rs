/// Stream properties of an opened video source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    /// Location string the video was opened from (path or URL).
    pub location: String,
}

impl VideoMetadata {
    /// Estimates a frame count from duration and frame rate.
    ///
    /// Used for containers that do not record the number of frames.
    pub fn estimate_frames(duration_secs: f64, fps: f64) -> usize {
        if duration_secs <= 0.0 || fps <= 0.0 || !duration_secs.is_finite() {
            return 0;
        }
        (duration_secs * fps).round() as usize
    }
}
