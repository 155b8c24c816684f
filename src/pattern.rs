use serde::Deserialize;

use crate::channels::Channels;

/// A light pattern, sampled by elapsed milliseconds since it became active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pattern {
    Constant { color: Channels },
    Pulsing { color: Channels, period_ms: u32 },
    OnOff { color: Channels, period_ms: u32 },
}

impl Pattern {
    pub fn constant(color: Channels) -> Pattern {
        Pattern::Constant { color }
    }

    pub fn pulsing(color: Channels, period_ms: u32) -> Pattern {
        Pattern::Pulsing { color, period_ms }
    }

    pub fn on_off(color: Channels, period_ms: u32) -> Pattern {
        Pattern::OnOff { color, period_ms }
    }

    pub fn sample(&self, elapsed_ms: u64) -> Channels {
        match *self {
            Pattern::Constant { color } => color,
            // A zero period degenerates to constant-on
            Pattern::Pulsing { color, period_ms: 0 } | Pattern::OnOff { color, period_ms: 0 } => {
                color
            }
            Pattern::Pulsing { color, period_ms } => {
                let phase = elapsed_ms % period_ms as u64;
                color.scaled(triangle_envelope(phase, period_ms))
            }
            Pattern::OnOff { color, period_ms } => {
                let phase = elapsed_ms % period_ms as u64;
                if phase * 2 < period_ms as u64 {
                    color
                } else {
                    Channels::zero()
                }
            }
        }
    }
}

/// Rises from 0 at the start of the period to 1 at mid-period and back.
fn triangle_envelope(phase: u64, period_ms: u32) -> f32 {
    let x = phase as f32 / period_ms as f32;
    (1.0 - (2.0 * x - 1.0).abs()).clamp(0.0, 1.0)
}

/// Named patterns the status indicator picks from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPreset {
    Constant,
    FastPulsing,
    NormalPulsing,
    SlowPulsing,
}

impl PatternPreset {
    pub fn to_pattern(self, color: Channels) -> Pattern {
        match self {
            PatternPreset::Constant => Pattern::constant(color),
            PatternPreset::FastPulsing => Pattern::pulsing(color, 1000),
            PatternPreset::NormalPulsing => Pattern::pulsing(color, 2000),
            PatternPreset::SlowPulsing => Pattern::pulsing(color, 4000),
        }
    }
}

impl TryFrom<u8> for PatternPreset {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PatternPreset::Constant),
            1 => Ok(PatternPreset::FastPulsing),
            2 => Ok(PatternPreset::NormalPulsing),
            3 => Ok(PatternPreset::SlowPulsing),
            _ => Err(code),
        }
    }
}
