use std::f32::consts::LN_10;

use crate::audio::domain::effect_node::{EffectKind, ReverbSettings};
use crate::audio::domain::effect_processor::EffectProcessor;

/// Base comb delays in seconds, scaled by the room size of the preset.
const COMB_TIMES: [f32; 4] = [0.0297, 0.0371, 0.0411, 0.0437];
const ALLPASS_TIMES: [f32; 2] = [0.005, 0.0017];
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Schroeder reverb: four parallel feedback combs into two series allpasses,
/// one network per channel.
pub struct ReverbProcessor {
    channels: usize,
    mix: f32,
    states: Vec<ChannelReverb>,
}

impl ReverbProcessor {
    pub fn new(settings: &ReverbSettings, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        let sample_rate = sample_rate.max(1) as f32;
        Self {
            channels,
            mix: (settings.wet_dry_mix / 100.0).clamp(0.0, 1.0),
            states: (0..channels)
                .map(|_| ChannelReverb::new(sample_rate, settings))
                .collect(),
        }
    }
}

impl EffectProcessor for ReverbProcessor {
    fn kind(&self) -> EffectKind {
        EffectKind::Reverb
    }

    fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        let dry_mix = 1.0 - self.mix;
        output.reserve(input.len());
        for frame in input.chunks(self.channels) {
            for (ch, &x) in frame.iter().enumerate() {
                let wet = self.states[ch].process_sample(x);
                output.push(x * dry_mix + wet * self.mix);
            }
        }
    }
}

struct ChannelReverb {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllPassFilter>,
}

impl ChannelReverb {
    fn new(sample_rate: f32, settings: &ReverbSettings) -> Self {
        let scale = settings.room_scale.max(0.1);
        Self {
            combs: COMB_TIMES
                .iter()
                .map(|&t| CombFilter::new(sample_rate, t * scale, settings.decay_seconds))
                .collect(),
            allpasses: ALLPASS_TIMES
                .iter()
                .map(|&t| AllPassFilter::new(sample_rate, t, ALLPASS_FEEDBACK))
                .collect(),
        }
    }

    fn process_sample(&mut self, input: f32) -> f32 {
        let sum: f32 = self.combs.iter_mut().map(|c| c.process(input)).sum();
        let mut output = sum / self.combs.len() as f32;
        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }
}

struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl CombFilter {
    fn new(sample_rate: f32, delay_seconds: f32, decay_seconds: f32) -> Self {
        let len = ((delay_seconds * sample_rate).round() as usize).max(1);
        let delay = delay_seconds.max(1.0 / sample_rate);
        // Feedback that reaches -60 dB after `decay_seconds`.
        let feedback = (-3.0 * delay / decay_seconds.max(0.1) * LN_10).exp();
        Self {
            buffer: vec![0.0; len],
            index: 0,
            feedback,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.index];
        self.buffer[self.index] = input + output * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}

struct AllPassFilter {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
}

impl AllPassFilter {
    fn new(sample_rate: f32, delay_seconds: f32, feedback: f32) -> Self {
        let len = ((delay_seconds * sample_rate).round() as usize).max(1);
        Self {
            buffer: vec![0.0; len],
            index: 0,
            feedback,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        let output = -input + buffered;
        self.buffer[self.index] = input + buffered * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        output
    }
}
