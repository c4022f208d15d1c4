//! Clip references: immutable handles to source media.

use montage_core::{FrameRate, RationalTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable handle to a source media file plus cached probe metadata.
///
/// Shared as `Arc<ClipRef>`: many segments may trim spans out of the
/// same source. Never mutated after creation; a re-probe produces a new
/// handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipRef {
    /// Unique clip ID
    pub id: Uuid,
    /// Path to the media file
    pub path: String,
    /// Source duration
    pub duration: RationalTime,
    /// Source frame rate
    pub frame_rate: FrameRate,
    /// Whether the source carries an audio stream
    pub has_audio: bool,
}

impl ClipRef {
    /// Create a new clip reference from probe results.
    pub fn new(
        path: impl Into<String>,
        duration: RationalTime,
        frame_rate: FrameRate,
        has_audio: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            duration,
            frame_rate,
            has_audio,
        }
    }
}
