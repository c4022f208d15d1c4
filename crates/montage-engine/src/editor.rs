//! The editing facade: one timeline, its history, and export launching.

use crate::export::{spawn_export, ExportHandle};
use montage_core::{MontageError, RationalTime, Result};
use montage_effects::{Effect, FontLibrary};
use montage_media::{ExportSettings, MediaService};
use montage_timeline::{
    ClipRef, History, LoadWarning, ProjectFile, SourceResolver, TextOverlay, Timeline,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Adapts the media service to the persistence layer's resolver trait.
struct MediaResolver<'a>(&'a dyn MediaService);

impl SourceResolver for MediaResolver<'_> {
    fn resolve(&self, path: &str) -> Result<ClipRef> {
        self.0.probe(Path::new(path))
    }
}

/// Owns a timeline and coordinates edits, history, persistence, and
/// export.
///
/// Every successful mutation snapshots the pre-mutation state into the
/// undo history; a rejected mutation leaves both the timeline and the
/// history untouched. Exports run against a frozen copy of the
/// timeline, so editing may continue while one renders, but only one
/// export runs at a time.
pub struct Editor {
    timeline: Timeline,
    history: History,
    media: Arc<dyn MediaService>,
    fonts: Arc<FontLibrary>,
    export_finished: Option<Arc<AtomicBool>>,
}

impl Editor {
    pub fn new(media: Arc<dyn MediaService>, fonts: Arc<FontLibrary>) -> Self {
        Self {
            timeline: Timeline::new(),
            history: History::new(),
            media,
            fonts,
            export_finished: None,
        }
    }

    /// The current timeline state.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Probe a media file for use in segments. Not an edit; nothing is
    /// checkpointed.
    pub fn import_clip(&self, path: &Path) -> Result<Arc<ClipRef>> {
        Ok(Arc::new(self.media.probe(path)?))
    }

    /// Run a mutation with checkpoint-on-success semantics.
    fn edit<T>(&mut self, op: impl FnOnce(&mut Timeline) -> Result<T>) -> Result<T> {
        let before = self.timeline.clone();
        match op(&mut self.timeline) {
            Ok(value) => {
                self.history.checkpoint(before);
                Ok(value)
            }
            Err(e) => {
                self.timeline = before;
                Err(e)
            }
        }
    }

    pub fn add_segment(
        &mut self,
        clip: Arc<ClipRef>,
        in_point: RationalTime,
        out_point: RationalTime,
    ) -> Result<Uuid> {
        self.edit(|tl| tl.add_segment(clip, in_point, out_point))
    }

    pub fn remove_segment(&mut self, id: Uuid) -> Result<()> {
        self.edit(|tl| tl.remove_segment(id).map(|_| ()))
    }

    pub fn move_segment(&mut self, id: Uuid, new_index: usize) -> Result<()> {
        self.edit(|tl| tl.move_segment(id, new_index))
    }

    pub fn push_effect(&mut self, id: Uuid, effect: Effect) -> Result<()> {
        self.edit(|tl| tl.push_segment_effect(id, effect))
    }

    pub fn set_effects(&mut self, id: Uuid, effects: Vec<Effect>) -> Result<()> {
        self.edit(|tl| tl.set_segment_effects(id, effects))
    }

    pub fn set_volume(&mut self, id: Uuid, volume: f64) -> Result<()> {
        self.edit(|tl| tl.set_segment_volume(id, volume))
    }

    pub fn add_overlay(&mut self, overlay: TextOverlay) -> Result<Uuid> {
        self.edit(|tl| tl.add_overlay(overlay))
    }

    pub fn remove_overlay(&mut self, id: Uuid) -> Result<()> {
        self.edit(|tl| tl.remove_overlay(id).map(|_| ()))
    }

    /// Remove every segment and overlay in one undoable step.
    pub fn clear(&mut self) -> Result<()> {
        self.edit(|tl| {
            tl.clear();
            Ok(())
        })
    }

    /// Step back one edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.timeline) {
            Some(previous) => {
                self.timeline = previous;
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone edit.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.timeline) {
            Some(next) => {
                self.timeline = next;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Write the timeline to a project file.
    pub fn save_project(&self, path: &Path) -> Result<()> {
        ProjectFile::from_timeline(&self.timeline).save_to_file(path)?;
        info!(path = %path.display(), "project saved");
        Ok(())
    }

    /// Replace the timeline with one loaded from a project file.
    ///
    /// Segments whose sources are gone come back as warnings instead of
    /// failing the load. History is reset; a load is not undoable.
    pub fn load_project(&mut self, path: &Path) -> Result<Vec<LoadWarning>> {
        let file = ProjectFile::load_from_file(path)?;
        let loaded = file.resolve_timeline(&MediaResolver(self.media.as_ref()))?;
        self.timeline = loaded.timeline;
        self.history.clear();
        info!(path = %path.display(), warnings = loaded.warnings.len(), "project loaded");
        Ok(loaded.warnings)
    }

    /// Start rendering the current timeline to `output` on a worker
    /// thread. Fails with [`MontageError::ExportInProgress`] while an
    /// earlier export is still running.
    pub fn start_export(
        &mut self,
        output: impl Into<PathBuf>,
        settings: ExportSettings,
    ) -> Result<ExportHandle> {
        if let Some(finished) = &self.export_finished {
            if !finished.load(Ordering::Acquire) {
                return Err(MontageError::ExportInProgress);
            }
        }
        if self.timeline.is_empty() {
            return Err(MontageError::InvalidParameter(
                "timeline has no segments to export".into(),
            ));
        }

        let output = settings.apply_extension(&output.into());
        let finished = Arc::new(AtomicBool::new(false));
        let handle = spawn_export(
            self.timeline.clone(),
            settings,
            output,
            self.media.clone(),
            self.fonts.clone(),
            finished.clone(),
        )?;
        self.export_finished = Some(finished);
        Ok(handle)
    }
}
