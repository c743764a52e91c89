use std::fmt;
use std::str::FromStr;

pub const DEFAULT_RATE: f32 = 1.0;
pub const MIN_RATE: f32 = 1.0 / 32.0;
pub const MAX_RATE: f32 = 32.0;

pub const DEFAULT_PITCH_CENTS: f32 = 0.0;
pub const MIN_PITCH_CENTS: f32 = -2400.0;
pub const MAX_PITCH_CENTS: f32 = 2400.0;

pub const SLOW_RATE: f32 = 0.5;
pub const FAST_RATE: f32 = 1.5;
pub const HIGH_PITCH_CENTS: f32 = 1000.0;
pub const LOW_PITCH_CENTS: f32 = -1000.0;

/// Effect combination requested for one play.
///
/// `None` means "leave at default"; the effective values are clamped to the
/// range the rate/pitch stage supports.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackOptions {
    pub rate: Option<f32>,
    pub pitch_cents: Option<f32>,
    pub echo: bool,
    pub reverb: bool,
}

impl PlaybackOptions {
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_pitch_cents(mut self, cents: f32) -> Self {
        self.pitch_cents = Some(cents);
        self
    }

    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn with_reverb(mut self) -> Self {
        self.reverb = true;
        self
    }

    /// Playback speed multiplier applied to duration.
    pub fn effective_rate(&self) -> f32 {
        match self.rate {
            Some(rate) if rate.is_finite() && rate > 0.0 => rate.clamp(MIN_RATE, MAX_RATE),
            _ => DEFAULT_RATE,
        }
    }

    pub fn effective_pitch_cents(&self) -> f32 {
        match self.pitch_cents {
            Some(cents) if cents.is_finite() => cents.clamp(MIN_PITCH_CENTS, MAX_PITCH_CENTS),
            _ => DEFAULT_PITCH_CENTS,
        }
    }
}

/// One-tap effects offered by the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    Slow,
    Fast,
    High,
    Low,
    Echo,
    Reverb,
}

impl Preset {
    pub const ALL: &[Preset] = &[
        Preset::Slow,
        Preset::Fast,
        Preset::High,
        Preset::Low,
        Preset::Echo,
        Preset::Reverb,
    ];

    pub fn options(self) -> PlaybackOptions {
        let base = PlaybackOptions::default();
        match self {
            Preset::Slow => base.with_rate(SLOW_RATE),
            Preset::Fast => base.with_rate(FAST_RATE),
            Preset::High => base.with_pitch_cents(HIGH_PITCH_CENTS),
            Preset::Low => base.with_pitch_cents(LOW_PITCH_CENTS),
            Preset::Echo => base.with_echo(),
            Preset::Reverb => base.with_reverb(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Slow => "slow",
            Preset::Fast => "fast",
            Preset::High => "high",
            Preset::Low => "low",
            Preset::Echo => "echo",
            Preset::Reverb => "reverb",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset '{0}' (expected one of: slow, fast, high, low, echo, reverb)")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
