//! The timeline: an ordered sequence of segments plus timed overlays.

use crate::clip::ClipRef;
use crate::overlay::TextOverlay;
use crate::segment::Segment;
use montage_core::{MontageError, RationalTime, Result};
use montage_effects::Effect;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// An ordered composition of segments with text overlays.
///
/// Segments abut with no gaps: output position is derived purely from
/// ordering and effective durations. Every mutation that changes the
/// sequence rewrites `order_index` so indices stay contiguous from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    segments: Vec<Segment>,
    overlays: Vec<TextOverlay>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments in playback order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Overlays in insertion order.
    pub fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a trimmed span of `clip` at the end of the sequence.
    pub fn add_segment(
        &mut self,
        clip: Arc<ClipRef>,
        in_point: RationalTime,
        out_point: RationalTime,
    ) -> Result<Uuid> {
        Segment::validate_range(&clip, in_point, out_point)?;
        let segment = Segment::new(clip, in_point, out_point, self.segments.len());
        let id = segment.id;
        debug!(segment = %id, "added segment");
        self.segments.push(segment);
        Ok(id)
    }

    /// Remove a segment by ID, closing the gap it leaves.
    pub fn remove_segment(&mut self, id: Uuid) -> Result<Segment> {
        let pos = self.position_of(id)?;
        let removed = self.segments.remove(pos);
        self.resequence();
        debug!(segment = %id, "removed segment");
        Ok(removed)
    }

    /// Move a segment to `new_index`, shifting the others to keep the
    /// sequence stable.
    pub fn move_segment(&mut self, id: Uuid, new_index: usize) -> Result<()> {
        let pos = self.position_of(id)?;
        if new_index >= self.segments.len() {
            return Err(MontageError::OutOfBounds {
                index: new_index,
                len: self.segments.len(),
            });
        }
        let segment = self.segments.remove(pos);
        self.segments.insert(new_index, segment);
        self.resequence();
        Ok(())
    }

    /// Look up a segment by ID.
    pub fn segment(&self, id: Uuid) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Replace a segment's effect stack after validating every entry.
    pub fn set_segment_effects(&mut self, id: Uuid, effects: Vec<Effect>) -> Result<()> {
        self.segment_mut(id)?.set_effects(effects)
    }

    /// Append one validated effect to a segment's stack.
    pub fn push_segment_effect(&mut self, id: Uuid, effect: Effect) -> Result<()> {
        self.segment_mut(id)?.push_effect(effect)
    }

    /// Set a segment's audio gain.
    pub fn set_segment_volume(&mut self, id: Uuid, volume: f64) -> Result<()> {
        self.segment_mut(id)?.set_volume(volume)
    }

    /// Total output duration: the sum of effective segment durations.
    pub fn total_duration(&self) -> RationalTime {
        self.segments
            .iter()
            .fold(RationalTime::ZERO, |acc, s| acc + s.effective_duration())
    }

    /// Output time at which a segment begins.
    pub fn segment_start(&self, id: Uuid) -> Result<RationalTime> {
        let mut start = RationalTime::ZERO;
        for segment in &self.segments {
            if segment.id == id {
                return Ok(start);
            }
            start = start + segment.effective_duration();
        }
        Err(MontageError::NotFound(id))
    }

    /// Add a validated overlay.
    pub fn add_overlay(&mut self, overlay: TextOverlay) -> Result<Uuid> {
        overlay.validate()?;
        let id = overlay.id;
        self.overlays.push(overlay);
        Ok(id)
    }

    /// Remove an overlay by ID.
    pub fn remove_overlay(&mut self, id: Uuid) -> Result<TextOverlay> {
        let pos = self
            .overlays
            .iter()
            .position(|o| o.id == id)
            .ok_or(MontageError::NotFound(id))?;
        Ok(self.overlays.remove(pos))
    }

    /// Drop every segment and overlay.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.overlays.clear();
    }

    /// Compare editing content, ignoring the IDs that regenerate when a
    /// project file is reloaded.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.overlays.len() == other.overlays.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| {
                    a.clip.path == b.clip.path
                        && a.in_point == b.in_point
                        && a.out_point == b.out_point
                        && a.effects == b.effects
                        && a.volume == b.volume
                })
            && self.overlays.iter().zip(&other.overlays).all(|(a, b)| {
                a.text == b.text
                    && a.font == b.font
                    && a.size == b.size
                    && a.color == b.color
                    && a.position == b.position
                    && a.start == b.start
                    && a.duration == b.duration
            })
    }

    fn position_of(&self, id: Uuid) -> Result<usize> {
        self.segments
            .iter()
            .position(|s| s.id == id)
            .ok_or(MontageError::NotFound(id))
    }

    fn segment_mut(&mut self, id: Uuid) -> Result<&mut Segment> {
        self.segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(MontageError::NotFound(id))
    }

    fn resequence(&mut self) {
        for (i, segment) in self.segments.iter_mut().enumerate() {
            segment.order_index = i;
        }
    }
}
