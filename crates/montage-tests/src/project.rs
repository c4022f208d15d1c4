//! Project save/load round trips through the editor.

use crate::fake::FakeMediaService;
use montage_core::RationalTime;
use montage_effects::{Anchor, Effect, FontLibrary};
use montage_engine::Editor;
use montage_timeline::TextOverlay;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn editor_with(media: Arc<FakeMediaService>) -> Editor {
    Editor::new(
        media,
        Arc::new(FontLibrary::with_dirs(vec![PathBuf::from("/nonexistent")])),
    )
}

fn populated_editor(media: Arc<FakeMediaService>) -> Editor {
    let mut ed = editor_with(media);
    let a = ed.import_clip(Path::new("/media/a.mp4")).unwrap();
    let b = ed.import_clip(Path::new("/media/b.mp4")).unwrap();

    let s1 = ed
        .add_segment(
            a.clone(),
            RationalTime::from_seconds(1),
            RationalTime::from_seconds(5),
        )
        .unwrap();
    ed.push_effect(s1, Effect::Grayscale).unwrap();
    ed.push_effect(s1, Effect::Rotate { degrees: 90.0 }).unwrap();
    ed.set_volume(s1, 0.25).unwrap();

    ed.add_segment(b, RationalTime::ZERO, RationalTime::from_seconds(10))
        .unwrap();
    ed.add_segment(
        a,
        RationalTime::from_seconds(6),
        RationalTime::from_seconds(9),
    )
    .unwrap();

    let mut title = TextOverlay::new("Title", RationalTime::ZERO, RationalTime::from_seconds(3));
    title.position = Anchor::Top;
    title.color = "#ff8000".to_string();
    ed.add_overlay(title).unwrap();
    ed.add_overlay(TextOverlay::new(
        "Credits",
        RationalTime::from_seconds(14),
        RationalTime::from_seconds(3),
    ))
    .unwrap();
    ed
}

#[test]
fn save_then_load_preserves_content() {
    let media = Arc::new(FakeMediaService::new());
    let ed = populated_editor(media.clone());
    let before = ed.timeline().clone();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.json");
    ed.save_project(&path).unwrap();

    let mut other = editor_with(media);
    let warnings = other.load_project(&path).unwrap();
    assert!(warnings.is_empty());
    assert!(other.timeline().content_eq(&before));
    // effect order survives
    assert_eq!(
        other.timeline().segments()[0].effects,
        vec![Effect::Grayscale, Effect::Rotate { degrees: 90.0 }]
    );
}

#[test]
fn load_skips_missing_sources_with_warnings() {
    let media = Arc::new(FakeMediaService::new());
    let ed = populated_editor(media.clone());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.json");
    ed.save_project(&path).unwrap();

    media.mark_missing("/media/a.mp4");
    let mut other = editor_with(media);
    let warnings = other.load_project(&path).unwrap();

    // two segments referenced the missing clip
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.clip_path == "/media/a.mp4"));
    assert_eq!(other.timeline().segments().len(), 1);
    assert_eq!(other.timeline().segments()[0].clip.path, "/media/b.mp4");
    // overlays are unaffected by missing media
    assert_eq!(other.timeline().overlays().len(), 2);
}

#[test]
fn load_resets_history() {
    let media = Arc::new(FakeMediaService::new());
    let ed = populated_editor(media.clone());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.json");
    ed.save_project(&path).unwrap();

    let mut other = editor_with(media);
    let clip = other.import_clip(Path::new("/media/c.mp4")).unwrap();
    other
        .add_segment(clip, RationalTime::ZERO, RationalTime::from_seconds(2))
        .unwrap();
    assert!(other.can_undo());

    other.load_project(&path).unwrap();
    assert!(!other.can_undo());
    assert!(!other.can_redo());
}
