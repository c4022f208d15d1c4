//! Editor-level editing and history behavior across crates.

use crate::fake::FakeMediaService;
use montage_core::{MontageError, RationalTime};
use montage_effects::{Effect, FontLibrary};
use montage_engine::Editor;
use montage_timeline::TextOverlay;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn editor() -> Editor {
    Editor::new(
        Arc::new(FakeMediaService::new()),
        Arc::new(FontLibrary::with_dirs(vec![PathBuf::from("/nonexistent")])),
    )
}

#[test]
fn edits_checkpoint_and_undo_restores() {
    let mut ed = editor();
    let clip = ed.import_clip(Path::new("/media/a.mp4")).unwrap();

    let first = ed
        .add_segment(
            clip.clone(),
            RationalTime::ZERO,
            RationalTime::from_seconds(4),
        )
        .unwrap();
    ed.add_segment(
        clip,
        RationalTime::from_seconds(4),
        RationalTime::from_seconds(8),
    )
    .unwrap();
    assert_eq!(ed.timeline().segments().len(), 2);

    ed.remove_segment(first).unwrap();
    assert_eq!(ed.timeline().segments().len(), 1);

    assert!(ed.undo());
    assert_eq!(ed.timeline().segments().len(), 2);

    assert!(ed.redo());
    assert_eq!(ed.timeline().segments().len(), 1);
}

#[test]
fn rejected_edit_leaves_timeline_and_history_untouched() {
    let mut ed = editor();
    let clip = ed.import_clip(Path::new("/media/a.mp4")).unwrap();
    ed.add_segment(
        clip.clone(),
        RationalTime::ZERO,
        RationalTime::from_seconds(4),
    )
    .unwrap();

    // fake clips are 10s; out point of 20s must be rejected
    let err = ed
        .add_segment(
            clip,
            RationalTime::ZERO,
            RationalTime::from_seconds(20),
        )
        .unwrap_err();
    assert!(matches!(err, MontageError::InvalidRange { .. }));
    assert_eq!(ed.timeline().segments().len(), 1);

    // the only undo step is the first, valid add
    assert!(ed.undo());
    assert!(ed.timeline().is_empty());
    assert!(!ed.undo());
}

#[test]
fn new_edit_after_undo_clears_redo() {
    let mut ed = editor();
    let clip = ed.import_clip(Path::new("/media/a.mp4")).unwrap();
    let id = ed
        .add_segment(
            clip.clone(),
            RationalTime::ZERO,
            RationalTime::from_seconds(4),
        )
        .unwrap();
    ed.push_effect(id, Effect::Grayscale).unwrap();

    assert!(ed.undo());
    assert!(ed.can_redo());

    ed.set_volume(id, 0.5).unwrap();
    assert!(!ed.can_redo());
    assert!(!ed.redo());
}

#[test]
fn history_depth_is_capped_at_fifty() {
    let mut ed = editor();
    for i in 0..55 {
        ed.add_overlay(TextOverlay::new(
            format!("overlay {i}"),
            RationalTime::from_seconds(i),
            RationalTime::from_seconds(1),
        ))
        .unwrap();
    }

    let mut undone = 0;
    while ed.undo() {
        undone += 1;
    }
    assert_eq!(undone, 50);
    // the five oldest snapshots were evicted
    assert_eq!(ed.timeline().overlays().len(), 5);
}

#[test]
fn clear_is_one_undoable_step() {
    let mut ed = editor();
    let clip = ed.import_clip(Path::new("/media/a.mp4")).unwrap();
    ed.add_segment(
        clip,
        RationalTime::ZERO,
        RationalTime::from_seconds(4),
    )
    .unwrap();
    ed.add_overlay(TextOverlay::new(
        "Title",
        RationalTime::ZERO,
        RationalTime::from_seconds(2),
    ))
    .unwrap();

    ed.clear().unwrap();
    assert!(ed.timeline().is_empty());
    assert!(ed.timeline().overlays().is_empty());

    assert!(ed.undo());
    assert_eq!(ed.timeline().segments().len(), 1);
    assert_eq!(ed.timeline().overlays().len(), 1);
}

#[test]
fn effect_and_volume_edits_are_undoable() {
    let mut ed = editor();
    let clip = ed.import_clip(Path::new("/media/a.mp4")).unwrap();
    let id = ed
        .add_segment(
            clip,
            RationalTime::ZERO,
            RationalTime::from_seconds(10),
        )
        .unwrap();

    ed.push_effect(id, Effect::Speed { factor: 2.0 }).unwrap();
    assert_eq!(
        ed.timeline().total_duration(),
        RationalTime::from_seconds(5)
    );

    assert!(ed.undo());
    assert_eq!(
        ed.timeline().total_duration(),
        RationalTime::from_seconds(10)
    );
    assert!(ed.timeline().segment(id).unwrap().effects.is_empty());
}
