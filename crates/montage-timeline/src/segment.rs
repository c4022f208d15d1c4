//! Segments: trimmed spans of a clip placed on the timeline.

use crate::clip::ClipRef;
use montage_core::{MontageError, RationalTime, Result, TimeRange};
use montage_effects::{speed_factor, Effect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A trimmed span of a clip, positioned on the timeline by `order_index`.
///
/// The in/out points are source-clip times. Timeline position is derived
/// from ordering, so reordering never touches the trim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique segment ID
    pub id: Uuid,
    /// Source clip this segment trims
    pub clip: Arc<ClipRef>,
    /// Trim start, in source-clip time
    pub in_point: RationalTime,
    /// Trim end, in source-clip time (exclusive)
    pub out_point: RationalTime,
    /// Position in the timeline sequence, contiguous from zero
    pub order_index: usize,
    /// Effect stack, applied in order
    pub effects: Vec<Effect>,
    /// Audio gain multiplier in `[0, 2]`
    pub volume: f64,
}

impl Segment {
    pub(crate) fn new(
        clip: Arc<ClipRef>,
        in_point: RationalTime,
        out_point: RationalTime,
        order_index: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            clip,
            in_point,
            out_point,
            order_index,
            effects: Vec::new(),
            volume: 1.0,
        }
    }

    /// Check a trim range against a clip, the same check `Timeline::add_segment`
    /// performs before admitting a segment.
    pub fn validate_range(
        clip: &ClipRef,
        in_point: RationalTime,
        out_point: RationalTime,
    ) -> Result<()> {
        if in_point.is_negative() || out_point <= in_point || out_point > clip.duration {
            return Err(MontageError::InvalidRange {
                in_point: in_point.to_seconds_f64(),
                out_point: out_point.to_seconds_f64(),
                duration: clip.duration.to_seconds_f64(),
            });
        }
        Ok(())
    }

    /// The trimmed span in source-clip time.
    pub fn source_range(&self) -> TimeRange {
        TimeRange::from_start_end(self.in_point, self.out_point)
    }

    /// Duration of the trimmed span, before speed effects.
    pub fn trimmed_duration(&self) -> RationalTime {
        self.out_point - self.in_point
    }

    /// Duration this segment occupies on the timeline, after speed effects.
    pub fn effective_duration(&self) -> RationalTime {
        let factor = speed_factor(&self.effects);
        if factor == 1.0 {
            self.trimmed_duration()
        } else {
            self.trimmed_duration().div_f64(factor)
        }
    }

    /// Append a validated effect to the stack.
    pub fn push_effect(&mut self, effect: Effect) -> Result<()> {
        effect.validate()?;
        self.effects.push(effect);
        Ok(())
    }

    /// Replace the whole effect stack; every entry is validated first.
    pub fn set_effects(&mut self, effects: Vec<Effect>) -> Result<()> {
        for effect in &effects {
            effect.validate()?;
        }
        self.effects = effects;
        Ok(())
    }

    /// Set the audio gain, which must lie in `[0, 2]`.
    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        if !(0.0..=2.0).contains(&volume) || !volume.is_finite() {
            return Err(MontageError::InvalidParameter(format!(
                "volume {volume} outside [0, 2]"
            )));
        }
        self.volume = volume;
        Ok(())
    }
}
