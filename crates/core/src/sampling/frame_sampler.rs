use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::shared::error::ArtworkError;

/// Most indices a single video is ever sampled for (one per artwork kind).
pub const MAX_SAMPLES: usize = 2;

/// Picks candidate frames uniformly from the second half of a video.
///
/// The back-half bias skips intros and opening credits; frame content is not
/// inspected.
#[derive(Clone, Debug)]
pub struct FrameSampler {
    rng: StdRng,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampler, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws `count` distinct indices from `[total_frames / 2, total_frames - 1]`.
    pub fn sample(&mut self, total_frames: usize, count: usize) -> Result<Vec<usize>, ArtworkError> {
        let err = || ArtworkError::Sample {
            total_frames,
            count,
        };
        if total_frames == 0 || count == 0 || count > MAX_SAMPLES {
            return Err(err());
        }

        let (start, end) = sample_range(total_frames);
        if end - start + 1 < count {
            return Err(err());
        }

        let mut indices = Vec::with_capacity(count);
        let first = self.rng.gen_range(start..=end);
        indices.push(first);
        if count == 2 {
            let mut second = self.rng.gen_range(start..=end);
            while second == first {
                second = self.rng.gen_range(start..=end);
            }
            indices.push(second);
        }
        Ok(indices)
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Inclusive index range candidates are drawn from. `total_frames` must be > 0.
pub fn sample_range(total_frames: usize) -> (usize, usize) {
    (total_frames / 2, total_frames - 1)
}
