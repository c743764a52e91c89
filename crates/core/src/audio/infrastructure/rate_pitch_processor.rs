use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::audio::domain::effect_node::EffectKind;
use crate::audio::domain::effect_processor::EffectProcessor;

/// STFT analysis/synthesis window size.
const WINDOW_SIZE: usize = 1024;

/// Hop between successive synthesis frames (75% overlap).
const SYNTHESIS_HOP: usize = WINDOW_SIZE / 4;

/// Non-redundant bins of a real-input FFT.
const HALF_WINDOW: usize = WINDOW_SIZE / 2 + 1;

/// Sum of squared Hann windows at 75% overlap.
const OLA_GAIN: f64 = 1.5;

/// Streaming phase vocoder that changes playback rate and pitch together.
///
/// Frames are read from the input every `analysis_hop` samples and written
/// every `SYNTHESIS_HOP` samples, so the output runs `rate` times faster.
/// Pitch is moved by remapping frequency bins by `2^(cents / 1200)` before
/// resynthesis. Each channel keeps its own phase state.
///
/// All per-frame buffers are allocated up front; `process` only grows the
/// input and ready queues, which keep their capacity between calls.
pub struct RatePitchProcessor {
    channels: usize,
    analysis_hop: usize,
    pitch_ratio: f64,
    hann: Vec<f64>,
    expected_advance: Vec<f64>,
    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
    states: Vec<ChannelVocoder>,
    frames_in: u64,
    frames_out: u64,
}

impl RatePitchProcessor {
    pub fn new(rate: f32, pitch_cents: f32, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        let analysis_hop = ((SYNTHESIS_HOP as f64 * rate as f64).round() as usize).max(1);
        let pitch_ratio = 2.0_f64.powf(pitch_cents as f64 / 1200.0);

        let hann: Vec<f64> = (0..WINDOW_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / WINDOW_SIZE as f64).cos()))
            .collect();
        let expected_advance: Vec<f64> = (0..HALF_WINDOW)
            .map(|k| 2.0 * PI * k as f64 * analysis_hop as f64 / WINDOW_SIZE as f64)
            .collect();

        let mut planner = FftPlanner::<f64>::new();
        let fft_forward = planner.plan_fft_forward(WINDOW_SIZE);
        let fft_inverse = planner.plan_fft_inverse(WINDOW_SIZE);

        Self {
            channels,
            analysis_hop,
            pitch_ratio,
            hann,
            expected_advance,
            fft_forward,
            fft_inverse,
            states: (0..channels).map(|_| ChannelVocoder::new()).collect(),
            frames_in: 0,
            frames_out: 0,
        }
    }

    /// Output frames owed for everything consumed so far.
    fn target_frames_out(&self) -> u64 {
        (self.frames_in as f64 * SYNTHESIS_HOP as f64 / self.analysis_hop as f64).round() as u64
    }

    fn run_frames(&mut self) {
        let ctx = FrameContext {
            analysis_hop: self.analysis_hop,
            pitch_ratio: self.pitch_ratio,
            hann: &self.hann,
            expected_advance: &self.expected_advance,
            fft_forward: self.fft_forward.as_ref(),
            fft_inverse: self.fft_inverse.as_ref(),
        };
        for state in &mut self.states {
            state.run_frames(&ctx);
        }
    }

    /// Interleave up to `max_frames` ready frames from every channel.
    fn drain_ready(&mut self, max_frames: Option<u64>, output: &mut Vec<f32>) {
        let available = self.states.iter().map(|s| s.ready.len()).min().unwrap_or(0);
        let frames = match max_frames {
            Some(max) => available.min(max as usize),
            None => available,
        };
        output.reserve(frames * self.channels);
        for i in 0..frames {
            for state in &self.states {
                output.push(state.ready[i]);
            }
        }
        for state in &mut self.states {
            state.ready.drain(..frames);
        }
        self.frames_out += frames as u64;
    }
}

impl EffectProcessor for RatePitchProcessor {
    fn kind(&self) -> EffectKind {
        EffectKind::RatePitch
    }

    fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        for frame in input.chunks(self.channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                self.states[ch].push(sample);
            }
        }
        self.frames_in += (input.len() / self.channels) as u64;

        self.run_frames();
        let owed = self.target_frames_out().saturating_sub(self.frames_out);
        self.drain_ready(Some(owed), output);
    }

    fn flush(&mut self, output: &mut Vec<f32>) {
        for state in &mut self.states {
            state.input.extend(std::iter::repeat(0.0).take(WINDOW_SIZE));
        }
        self.run_frames();
        for state in &mut self.states {
            state.release_tail();
        }

        let owed = self.target_frames_out().saturating_sub(self.frames_out);
        self.drain_ready(Some(owed), output);

        // Pad with silence if the vocoder produced fewer frames than owed.
        let missing = self.target_frames_out().saturating_sub(self.frames_out);
        output.extend(std::iter::repeat(0.0).take(missing as usize * self.channels));
        self.frames_out += missing;
    }
}

struct FrameContext<'a> {
    analysis_hop: usize,
    pitch_ratio: f64,
    hann: &'a [f64],
    expected_advance: &'a [f64],
    fft_forward: &'a dyn Fft<f64>,
    fft_inverse: &'a dyn Fft<f64>,
}

struct ChannelVocoder {
    input: Vec<f32>,
    /// Input samples still to drop when the analysis hop overshoots the
    /// buffered input.
    skip: usize,
    prev_phase: Vec<f64>,
    synth_phase: Vec<f64>,
    overlap: Vec<f64>,
    ready: Vec<f32>,
    spectrum: Vec<Complex<f64>>,
    magnitudes: Vec<f64>,
    frequencies: Vec<f64>,
}

impl ChannelVocoder {
    fn new() -> Self {
        Self {
            input: Vec::with_capacity(WINDOW_SIZE * 2),
            skip: 0,
            prev_phase: vec![0.0; HALF_WINDOW],
            synth_phase: vec![0.0; HALF_WINDOW],
            overlap: vec![0.0; WINDOW_SIZE],
            ready: Vec::with_capacity(WINDOW_SIZE * 2),
            spectrum: vec![Complex::new(0.0, 0.0); WINDOW_SIZE],
            magnitudes: vec![0.0; HALF_WINDOW],
            frequencies: vec![0.0; HALF_WINDOW],
        }
    }

    fn push(&mut self, sample: f32) {
        if self.skip > 0 {
            self.skip -= 1;
        } else {
            self.input.push(sample);
        }
    }

    fn run_frames(&mut self, ctx: &FrameContext<'_>) {
        let mut consumed = 0;

        while consumed + WINDOW_SIZE <= self.input.len() {
            // Analysis: window the input frame and FFT
            for (i, bin) in self.spectrum.iter_mut().enumerate() {
                *bin = Complex::new(self.input[consumed + i] as f64 * ctx.hann[i], 0.0);
            }
            ctx.fft_forward.process(&mut self.spectrum);

            self.magnitudes.fill(0.0);
            self.frequencies.fill(0.0);

            for k in 0..HALF_WINDOW {
                let magnitude = self.spectrum[k].norm();
                let phase = self.spectrum[k].im.atan2(self.spectrum[k].re);

                // True frequency in radians per input sample
                let phase_diff = phase - self.prev_phase[k] - ctx.expected_advance[k];
                let wrapped = phase_diff - (2.0 * PI) * (phase_diff / (2.0 * PI)).round();
                let true_freq =
                    (ctx.expected_advance[k] + wrapped) / ctx.analysis_hop as f64;
                self.prev_phase[k] = phase;

                // Keep the loudest source when several bins land on one target
                let target = (k as f64 * ctx.pitch_ratio).round() as usize;
                if target < HALF_WINDOW && magnitude > self.magnitudes[target] {
                    self.magnitudes[target] = magnitude;
                    self.frequencies[target] = true_freq * ctx.pitch_ratio;
                }
            }

            for k in 0..HALF_WINDOW {
                self.synth_phase[k] += self.frequencies[k] * SYNTHESIS_HOP as f64;
                self.spectrum[k] = Complex::from_polar(self.magnitudes[k], self.synth_phase[k]);
            }
            // Mirror for negative frequencies (conjugate symmetry for real output)
            for k in 1..HALF_WINDOW - 1 {
                self.spectrum[WINDOW_SIZE - k] = self.spectrum[k].conj();
            }
            ctx.fft_inverse.process(&mut self.spectrum);

            // rustfft does not normalize the inverse transform
            let norm = 1.0 / (WINDOW_SIZE as f64 * OLA_GAIN);
            for i in 0..WINDOW_SIZE {
                self.overlap[i] += self.spectrum[i].re * norm * ctx.hann[i];
            }

            self.ready
                .extend(self.overlap[..SYNTHESIS_HOP].iter().map(|s| *s as f32));
            self.overlap.copy_within(SYNTHESIS_HOP.., 0);
            self.overlap[WINDOW_SIZE - SYNTHESIS_HOP..].fill(0.0);

            consumed += ctx.analysis_hop;
        }

        // A hop longer than the window can run past the buffered input; the
        // overshoot is dropped from the samples that arrive next.
        if consumed > self.input.len() {
            self.skip += consumed - self.input.len();
            self.input.clear();
        } else {
            self.input.drain(..consumed);
        }
    }

    /// Move the remaining overlap-add tail into the ready queue.
    fn release_tail(&mut self) {
        self.ready.extend(self.overlap.iter().map(|s| *s as f32));
        self.overlap.fill(0.0);
    }
}
