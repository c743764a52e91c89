use std::fmt;

/// Kind of a render stage, without its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    RatePitch,
    Echo,
    Reverb,
    Passthrough,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::RatePitch => write!(f, "rate-pitch"),
            EffectKind::Echo => write!(f, "echo"),
            EffectKind::Reverb => write!(f, "reverb"),
            EffectKind::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// One delayed copy of the input in a multi-tap echo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EchoTap {
    pub delay_seconds: f32,
    pub gain: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EchoSettings {
    pub taps: Vec<EchoTap>,
    /// Portion of the tap sum fed back into the delay line.
    pub feedback: f32,
    /// Wet/dry mix in percent (0 = dry only, 100 = full echo).
    pub wet_dry_mix: f32,
}

impl EchoSettings {
    /// Fixed multi-echo preset: three short slap-back taps with light feedback.
    pub fn multi_echo() -> Self {
        Self {
            taps: vec![
                EchoTap {
                    delay_seconds: 0.060,
                    gain: 0.55,
                },
                EchoTap {
                    delay_seconds: 0.120,
                    gain: 0.35,
                },
                EchoTap {
                    delay_seconds: 0.180,
                    gain: 0.20,
                },
            ],
            feedback: 0.3,
            wet_dry_mix: 50.0,
        }
    }

    pub fn max_delay_seconds(&self) -> f32 {
        self.taps
            .iter()
            .map(|t| t.delay_seconds)
            .fold(0.0f32, f32::max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbSettings {
    /// Time for the tail to fall by 60 dB.
    pub decay_seconds: f32,
    /// Scales the comb delay times; larger values model bigger rooms.
    pub room_scale: f32,
    /// Wet/dry mix in percent.
    pub wet_dry_mix: f32,
}

impl ReverbSettings {
    pub const fn cathedral() -> Self {
        Self {
            decay_seconds: 4.5,
            room_scale: 1.6,
            wet_dry_mix: 50.0,
        }
    }
}

/// A stage of the render chain with its kind-specific parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectNode {
    RatePitch { rate: f32, pitch_cents: f32 },
    Echo(EchoSettings),
    Reverb(ReverbSettings),
    Passthrough,
}

impl EffectNode {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectNode::RatePitch { .. } => EffectKind::RatePitch,
            EffectNode::Echo(_) => EffectKind::Echo,
            EffectNode::Reverb(_) => EffectKind::Reverb,
            EffectNode::Passthrough => EffectKind::Passthrough,
        }
    }

    /// True when the stage leaves the signal untouched.
    pub fn is_identity(&self) -> bool {
        match self {
            EffectNode::RatePitch { rate, pitch_cents } => {
                (*rate - 1.0).abs() < f32::EPSILON && pitch_cents.abs() < f32::EPSILON
            }
            EffectNode::Echo(settings) => settings.wet_dry_mix <= 0.0 || settings.taps.is_empty(),
            EffectNode::Reverb(settings) => settings.wet_dry_mix <= 0.0,
            EffectNode::Passthrough => true,
        }
    }
}
