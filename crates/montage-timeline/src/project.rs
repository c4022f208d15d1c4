//! Project persistence: a versioned JSON document describing the timeline.
//!
//! The document stores clip paths rather than probe metadata, so loading
//! re-resolves every source through a [`SourceResolver`]. Segment and
//! overlay IDs are not persisted; they regenerate on load.

use crate::clip::ClipRef;
use crate::overlay::TextOverlay;
use crate::timeline::Timeline;
use montage_core::{MontageError, RationalTime, Result};
use montage_effects::{Anchor, Effect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Current project document version.
pub const PROJECT_VERSION: u32 = 1;

/// Resolves a stored clip path back to a probed clip reference.
///
/// The media layer implements this against ffprobe; tests substitute a
/// fake that fabricates metadata.
pub trait SourceResolver {
    fn resolve(&self, path: &str) -> Result<ClipRef>;
}

/// A segment that could not be restored from a project document.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    pub clip_path: String,
    pub reason: String,
}

/// Result of loading a project: the timeline that could be restored,
/// plus one warning per segment that was dropped.
#[derive(Debug)]
pub struct LoadedProject {
    pub timeline: Timeline,
    pub warnings: Vec<LoadWarning>,
}

/// On-disk project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub segments: Vec<SegmentDoc>,
    pub text_overlays: Vec<OverlayDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentDoc {
    pub clip_path: String,
    #[serde(rename = "in")]
    pub in_point: RationalTime,
    #[serde(rename = "out")]
    pub out_point: RationalTime,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDoc {
    pub text: String,
    pub font: String,
    pub size: f32,
    pub color: String,
    pub position: Anchor,
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

fn default_volume() -> f64 {
    1.0
}

impl ProjectFile {
    /// Snapshot a timeline into a document at the current version.
    pub fn from_timeline(timeline: &Timeline) -> Self {
        Self {
            version: PROJECT_VERSION,
            segments: timeline
                .segments()
                .iter()
                .map(|s| SegmentDoc {
                    clip_path: s.clip.path.clone(),
                    in_point: s.in_point,
                    out_point: s.out_point,
                    effects: s.effects.clone(),
                    volume: s.volume,
                })
                .collect(),
            text_overlays: timeline
                .overlays()
                .iter()
                .map(|o| OverlayDoc {
                    text: o.text.clone(),
                    font: o.font.clone(),
                    size: o.size,
                    color: o.color.clone(),
                    position: o.position,
                    start_time: o.start,
                    duration: o.duration,
                })
                .collect(),
        }
    }

    /// Rebuild a timeline, resolving each clip path through `resolver`.
    ///
    /// A segment whose source cannot be resolved, or whose stored trim
    /// no longer fits the source, is skipped with a warning; the rest of
    /// the project still loads.
    pub fn resolve_timeline(&self, resolver: &dyn SourceResolver) -> Result<LoadedProject> {
        let mut timeline = Timeline::new();
        let mut warnings = Vec::new();
        let mut clips: HashMap<String, Arc<ClipRef>> = HashMap::new();

        for doc in &self.segments {
            let clip = match clips.get(&doc.clip_path) {
                Some(clip) => clip.clone(),
                None => match resolver.resolve(&doc.clip_path) {
                    Ok(clip) => {
                        let clip = Arc::new(clip);
                        clips.insert(doc.clip_path.clone(), clip.clone());
                        clip
                    }
                    Err(e) => {
                        warn!(path = %doc.clip_path, error = %e, "skipping segment, source unavailable");
                        warnings.push(LoadWarning {
                            clip_path: doc.clip_path.clone(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                },
            };

            let id = match timeline.add_segment(clip, doc.in_point, doc.out_point) {
                Ok(id) => id,
                Err(e) => {
                    warn!(path = %doc.clip_path, error = %e, "skipping segment, trim no longer valid");
                    warnings.push(LoadWarning {
                        clip_path: doc.clip_path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            timeline.set_segment_effects(id, doc.effects.clone())?;
            timeline.set_segment_volume(id, doc.volume)?;
        }

        for doc in &self.text_overlays {
            let mut overlay = TextOverlay::new(doc.text.clone(), doc.start_time, doc.duration);
            overlay.font = doc.font.clone();
            overlay.size = doc.size;
            overlay.color = doc.color.clone();
            overlay.position = doc.position;
            timeline.add_overlay(overlay)?;
        }

        Ok(LoadedProject { timeline, warnings })
    }

    /// Parse a project document, migrating older versions forward.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| MontageError::Serialization(e.to_string()))?;

        let version = value
            .get("version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        if version > PROJECT_VERSION {
            return Err(MontageError::Serialization(format!(
                "project version {version} is newer than supported version {PROJECT_VERSION}"
            )));
        }
        if version < PROJECT_VERSION {
            migrate(&mut value, version);
        }

        serde_json::from_value(value).map_err(|e| MontageError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MontageError::Serialization(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Rewrite an older document in place until it matches `PROJECT_VERSION`.
fn migrate(value: &mut serde_json::Value, from: u32) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    if from < 1 {
        // v0 documents predate the version field and may omit overlays
        obj.entry("text_overlays")
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        obj.entry("segments")
            .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    }
    obj.insert(
        "version".to_string(),
        serde_json::Value::from(PROJECT_VERSION),
    );
}
