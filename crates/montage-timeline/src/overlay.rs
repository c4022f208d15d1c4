//! Text overlays timed against the composed output.

use montage_core::{MontageError, RationalTime, Result, TimeRange};
use montage_effects::Anchor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line of text burned into the output over a window of timeline time.
///
/// The window is expressed in output time, independent of any segment.
/// A window that runs past the end of the composition is legal while
/// editing and clipped at export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// Unique overlay ID
    pub id: Uuid,
    /// Text to render
    pub text: String,
    /// Font family name, resolved against system fonts at export
    pub font: String,
    /// Glyph size in pixels
    pub size: f32,
    /// Color name or `#rrggbb`
    pub color: String,
    /// Anchor position on the frame
    pub position: Anchor,
    /// Window start, in output time
    pub start: RationalTime,
    /// Window duration
    pub duration: RationalTime,
}

impl TextOverlay {
    /// Create an overlay with default styling.
    pub fn new(text: impl Into<String>, start: RationalTime, duration: RationalTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            font: "Arial".to_string(),
            size: 50.0,
            color: "white".to_string(),
            position: Anchor::Center,
            start,
            duration,
        }
    }

    /// Reject windows that could never be shown.
    pub fn validate(&self) -> Result<()> {
        if self.start.is_negative() || self.duration.is_zero() || self.duration.is_negative() {
            return Err(MontageError::InvalidParameter(format!(
                "overlay window start {} duration {} is empty or negative",
                self.start, self.duration
            )));
        }
        if self.size <= 0.0 || !self.size.is_finite() {
            return Err(MontageError::InvalidParameter(format!(
                "overlay size {} must be positive",
                self.size
            )));
        }
        Ok(())
    }

    /// The overlay's window in output time.
    pub fn window(&self) -> TimeRange {
        TimeRange::new(self.start, self.duration)
    }

    /// The window clipped to a composition of `total` length, or `None`
    /// when the overlay starts at or after the end.
    pub fn clipped_window(&self, total: RationalTime) -> Option<TimeRange> {
        let window = self.window();
        let composition = TimeRange::new(RationalTime::ZERO, total);
        window.intersection(composition)
    }
}
