use std::sync::Arc;

/// A decoded clip ready for playback: interleaved PCM samples normalized to
/// [-1.0, 1.0].
///
/// Immutable once built. Cloning is cheap and shares the sample buffer, so the
/// controller and the render thread can hold the same clip.
#[derive(Clone, Debug)]
pub struct AudioSource {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Length in frames (one sample per channel).
    pub fn total_sample_length(&self) -> u64 {
        (self.samples.len() / self.channels as usize) as u64
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_sample_length() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reads up to `max_frames` frames starting at `frame`.
    ///
    /// Returns an empty slice once `frame` is past the end.
    pub fn read_frames(&self, frame: u64, max_frames: usize) -> &[f32] {
        let channels = self.channels as usize;
        let start = (frame as usize).saturating_mul(channels).min(self.samples.len());
        let end = start
            .saturating_add(max_frames.saturating_mul(channels))
            .min(self.samples.len());
        &self.samples[start..end]
    }
}
