//! The closed set of per-segment effects.
//!
//! Effects are a tagged enum rather than name/parameter dictionaries so
//! application order and parameter validation are checked exhaustively.
//! The order of a segment's effect stack is significant and is never
//! normalized: Rotate-then-Mirror is not Mirror-then-Rotate.

use montage_core::{MontageError, Result};
use serde::{Deserialize, Serialize};

/// A single visual or temporal transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Multiplicative intensity scale; 1.0 is a no-op.
    Brightness { level: f64 },
    /// Multiplicative contrast scale; 1.0 is a no-op.
    Contrast { level: f64 },
    /// Rotation about the frame center, in degrees.
    Rotate { degrees: f64 },
    /// Playback speed; factor > 1 plays faster (shorter).
    Speed { factor: f64 },
    Grayscale,
    MirrorHorizontal,
    MirrorVertical,
}

impl Effect {
    /// Validate parameter ranges. Called before an effect enters a
    /// segment's stack, so the application engine can assume parameters
    /// are in range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Effect::Brightness { level } => {
                if !(0.0..=2.0).contains(&level) {
                    return Err(MontageError::InvalidEffect(format!(
                        "brightness level {level} outside [0, 2]"
                    )));
                }
            }
            Effect::Contrast { level } => {
                if !(0.0..=2.0).contains(&level) {
                    return Err(MontageError::InvalidEffect(format!(
                        "contrast level {level} outside [0, 2]"
                    )));
                }
            }
            Effect::Rotate { degrees } => {
                if !(-360.0..=360.0).contains(&degrees) {
                    return Err(MontageError::InvalidEffect(format!(
                        "rotation {degrees} outside [-360, 360]"
                    )));
                }
            }
            Effect::Speed { factor } => {
                if !(0.1..=10.0).contains(&factor) {
                    return Err(MontageError::InvalidEffect(format!(
                        "speed factor {factor} outside [0.1, 10]"
                    )));
                }
            }
            Effect::Grayscale | Effect::MirrorHorizontal | Effect::MirrorVertical => {}
        }
        Ok(())
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Brightness { .. } => "brightness",
            Effect::Contrast { .. } => "contrast",
            Effect::Rotate { .. } => "rotate",
            Effect::Speed { .. } => "speed",
            Effect::Grayscale => "grayscale",
            Effect::MirrorHorizontal => "mirror_horizontal",
            Effect::MirrorVertical => "mirror_vertical",
        }
    }
}

/// Combined speed factor of a stack: the product of all Speed effects.
/// A 10s span under Speed(2.0) plays for 5s.
pub fn speed_factor(effects: &[Effect]) -> f64 {
    effects.iter().fold(1.0, |acc, e| match e {
        Effect::Speed { factor } => acc * factor,
        _ => acc,
    })
}
