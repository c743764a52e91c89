use crate::audio::domain::effect_node::{EchoSettings, EffectKind};
use crate::audio::domain::effect_processor::EffectProcessor;

/// Multi-tap feedback echo.
///
/// Each channel owns a circular delay line long enough for the longest tap.
/// The dry signal passes through at unity gain; the tap sum is added on top,
/// scaled by the wet/dry mix.
pub struct EchoProcessor {
    channels: usize,
    taps: Vec<(usize, f32)>,
    feedback: f32,
    mix: f32,
    lines: Vec<DelayLine>,
}

impl EchoProcessor {
    pub fn new(settings: &EchoSettings, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        let sample_rate = sample_rate.max(1) as f32;
        let taps: Vec<(usize, f32)> = settings
            .taps
            .iter()
            .map(|t| (((t.delay_seconds * sample_rate).round() as usize).max(1), t.gain))
            .collect();
        let max_delay = taps.iter().map(|(d, _)| *d).max().unwrap_or(1);

        Self {
            channels,
            taps,
            feedback: settings.feedback.clamp(0.0, 0.95),
            mix: (settings.wet_dry_mix / 100.0).clamp(0.0, 1.0),
            lines: (0..channels).map(|_| DelayLine::new(max_delay + 1)).collect(),
        }
    }
}

impl EffectProcessor for EchoProcessor {
    fn kind(&self) -> EffectKind {
        EffectKind::Echo
    }

    fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        output.reserve(input.len());
        for frame in input.chunks(self.channels) {
            for (ch, &x) in frame.iter().enumerate() {
                let line = &mut self.lines[ch];
                let wet: f32 = self
                    .taps
                    .iter()
                    .map(|&(delay, gain)| gain * line.read(delay))
                    .sum();
                line.push(x + self.feedback * wet);
                output.push(x + self.mix * wet);
            }
        }
    }
}

struct DelayLine {
    buffer: Vec<f32>,
    write: usize,
}

impl DelayLine {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(2)],
            write: 0,
        }
    }

    /// Sample written `delay` pushes ago.
    fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write + len - delay.min(len)) % len]
    }

    fn push(&mut self, value: f32) {
        self.buffer[self.write] = value;
        self.write = (self.write + 1) % self.buffer.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::effect_node::EchoTap;
    use approx::assert_relative_eq;

    fn impulse(len: usize) -> Vec<f32> {
        let mut samples = vec![0.0; len];
        samples[0] = 1.0;
        samples
    }

    fn single_tap(delay_seconds: f32, gain: f32, mix: f32) -> EchoSettings {
        EchoSettings {
            taps: vec![EchoTap {
                delay_seconds,
                gain,
            }],
            feedback: 0.0,
            wet_dry_mix: mix,
        }
    }

    #[test]
    fn test_output_length_matches_input() {
        let mut echo = EchoProcessor::new(&EchoSettings::multi_echo(), 16000, 2);
        let mut out = Vec::new();
        echo.process(&vec![0.1; 3200], &mut out);
        assert_eq!(out.len(), 3200);
    }

    #[test]
    fn test_single_tap_repeats_impulse_after_delay() {
        let mut echo = EchoProcessor::new(&single_tap(0.01, 0.5, 100.0), 1000, 1);
        let mut out = Vec::new();
        echo.process(&impulse(30), &mut out);

        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[10], 0.5);
        assert!(out[1..10].iter().all(|s| *s == 0.0));
        assert!(out[11..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_mix_scales_echo_but_not_dry() {
        let mut echo = EchoProcessor::new(&single_tap(0.01, 0.5, 50.0), 1000, 1);
        let mut out = Vec::new();
        echo.process(&impulse(20), &mut out);
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[10], 0.25);
    }

    #[test]
    fn test_zero_mix_is_dry() {
        let mut echo = EchoProcessor::new(&single_tap(0.01, 0.5, 0.0), 1000, 1);
        let input: Vec<f32> = (0..50).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut out = Vec::new();
        echo.process(&input, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn test_multi_echo_taps_land_at_preset_delays() {
        let mut echo = EchoProcessor::new(&EchoSettings::multi_echo(), 1000, 1);
        let mut out = Vec::new();
        echo.process(&impulse(100), &mut out);
        // First tap at 60 ms, gain 0.55, mix 50%.
        assert_relative_eq!(out[60], 0.275, epsilon = 1e-6);
        assert!(out[1..60].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_delay_state_persists_across_blocks() {
        let mut echo = EchoProcessor::new(&single_tap(0.01, 0.5, 100.0), 1000, 1);
        let mut out = Vec::new();
        echo.process(&impulse(5), &mut out);
        echo.process(&[0.0; 10], &mut out);
        assert_relative_eq!(out[10], 0.5);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut echo = EchoProcessor::new(&single_tap(0.005, 0.5, 100.0), 1000, 2);
        let mut input = vec![0.0; 20];
        input[0] = 1.0; // left only
        let mut out = Vec::new();
        echo.process(&input, &mut out);
        assert_relative_eq!(out[10], 0.5); // left, frame 5
        assert_relative_eq!(out[11], 0.0); // right, frame 5
    }
}
