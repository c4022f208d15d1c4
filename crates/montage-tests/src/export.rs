//! Export pipeline behavior end to end, against the fake media service.

use crate::fake::FakeMediaService;
use montage_core::{MontageError, RationalTime};
use montage_effects::{Effect, FontLibrary};
use montage_engine::{Editor, ExportEvent, ExportStage};
use montage_media::ExportSettings;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn editor_with(media: Arc<FakeMediaService>) -> Editor {
    Editor::new(
        media,
        Arc::new(FontLibrary::with_dirs(vec![PathBuf::from("/nonexistent")])),
    )
}

fn add_clip_segment(ed: &mut Editor, path: &str, seconds: i64) -> uuid::Uuid {
    let clip = ed.import_clip(Path::new(path)).unwrap();
    ed.add_segment(
        clip,
        RationalTime::ZERO,
        RationalTime::from_seconds(seconds),
    )
    .unwrap()
}

/// Drain an export's events, returning the progress values and the
/// terminal event.
fn drain(handle: montage_engine::ExportHandle) -> (Vec<f64>, ExportEvent) {
    let mut progress = Vec::new();
    let mut terminal = None;
    for event in handle.events().iter() {
        match event {
            ExportEvent::Progress(f) => progress.push(f),
            other => {
                terminal = Some(other);
                break;
            }
        }
    }
    handle.join();
    (progress, terminal.expect("no terminal event"))
}

#[test]
fn export_completes_and_reports_monotone_progress() {
    let media = Arc::new(FakeMediaService::new());
    let mut ed = editor_with(media);
    add_clip_segment(&mut ed, "/media/a.mp4", 4);
    let id = add_clip_segment(&mut ed, "/media/b.mp4", 6);
    ed.push_effect(id, Effect::Speed { factor: 2.0 }).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("final.mp4");
    let handle = ed
        .start_export(output.clone(), ExportSettings::default())
        .unwrap();

    let (progress, terminal) = drain(handle);
    match terminal {
        ExportEvent::Completed(path) => assert_eq!(path, output),
        other => panic!("expected completion, got {other:?}"),
    }
    assert!(output.exists());

    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert!((progress.last().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn cancellation_leaves_no_output_file() {
    let media = Arc::new(FakeMediaService::new());
    let hold = media.hold_encode();
    let mut ed = editor_with(media);
    add_clip_segment(&mut ed, "/media/a.mp4", 8);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("final.mp4");
    let handle = ed
        .start_export(output.clone(), ExportSettings::default())
        .unwrap();

    handle.cancel();
    hold.store(false, Ordering::SeqCst);

    let (_, terminal) = drain(handle);
    assert!(matches!(terminal, ExportEvent::Cancelled));
    assert!(!output.exists());
}

#[test]
fn second_export_is_rejected_while_first_runs() {
    let media = Arc::new(FakeMediaService::new());
    let hold = media.hold_encode();
    let mut ed = editor_with(media);
    add_clip_segment(&mut ed, "/media/a.mp4", 4);

    let dir = tempfile::tempdir().unwrap();
    let first = ed
        .start_export(dir.path().join("one.mp4"), ExportSettings::default())
        .unwrap();

    let err = ed
        .start_export(dir.path().join("two.mp4"), ExportSettings::default())
        .unwrap_err();
    assert!(matches!(err, MontageError::ExportInProgress));

    // the running export is undisturbed
    hold.store(false, Ordering::SeqCst);
    let (_, terminal) = drain(first);
    assert!(matches!(terminal, ExportEvent::Completed(_)));
    assert!(!dir.path().join("two.mp4").exists());
}

#[test]
fn export_allowed_again_after_first_finishes() {
    let media = Arc::new(FakeMediaService::new());
    let mut ed = editor_with(media);
    add_clip_segment(&mut ed, "/media/a.mp4", 2);

    let dir = tempfile::tempdir().unwrap();
    let (_, terminal) = drain(
        ed.start_export(dir.path().join("one.mp4"), ExportSettings::default())
            .unwrap(),
    );
    assert!(matches!(terminal, ExportEvent::Completed(_)));

    let (_, terminal) = drain(
        ed.start_export(dir.path().join("two.mp4"), ExportSettings::default())
            .unwrap(),
    );
    assert!(matches!(terminal, ExportEvent::Completed(_)));
}

#[test]
fn empty_timeline_cannot_export() {
    let mut ed = editor_with(Arc::new(FakeMediaService::new()));
    let err = ed
        .start_export("/tmp/out.mp4", ExportSettings::default())
        .unwrap_err();
    // rejected synchronously as a validation error, no worker spawned
    assert!(matches!(err, MontageError::InvalidParameter(_)));
}

#[test]
fn vanished_source_fails_in_preparing() {
    let media = Arc::new(FakeMediaService::new());
    let mut ed = editor_with(media.clone());
    add_clip_segment(&mut ed, "/media/a.mp4", 4);
    media.mark_missing("/media/a.mp4");

    let dir = tempfile::tempdir().unwrap();
    let handle = ed
        .start_export(dir.path().join("final.mp4"), ExportSettings::default())
        .unwrap();
    let (_, terminal) = drain(handle);
    match terminal {
        ExportEvent::Failed { stage, error } => {
            assert_eq!(stage, ExportStage::Preparing);
            assert!(error.contains("/media/a.mp4"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn decode_failure_names_the_failing_segment() {
    let media = Arc::new(FakeMediaService::new());
    let mut ed = editor_with(media.clone());
    let clip = ed.import_clip(Path::new("/media/a.mp4")).unwrap();
    // two segments over the same clip, so clip-level attribution would
    // be ambiguous
    ed.add_segment(
        clip.clone(),
        RationalTime::ZERO,
        RationalTime::from_seconds(2),
    )
    .unwrap();
    let second = ed
        .add_segment(
            clip.clone(),
            RationalTime::from_seconds(2),
            RationalTime::from_seconds(4),
        )
        .unwrap();
    media.fail_decoding();

    let dir = tempfile::tempdir().unwrap();
    let handle = ed
        .start_export(dir.path().join("final.mp4"), ExportSettings::default())
        .unwrap();
    let (_, terminal) = drain(handle);
    match terminal {
        ExportEvent::Failed { stage, error } => {
            assert_eq!(stage, ExportStage::Rendering);
            // the first segment in order is the one that fails
            let first = ed.timeline().segments()[0].id;
            assert!(error.contains(&first.to_string()));
            assert!(!error.contains(&second.to_string()));
            assert!(!error.contains(&clip.id.to_string()));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn editing_during_export_does_not_disturb_the_render() {
    let media = Arc::new(FakeMediaService::new());
    let hold = media.hold_encode();
    let mut ed = editor_with(media);
    add_clip_segment(&mut ed, "/media/a.mp4", 4);

    let dir = tempfile::tempdir().unwrap();
    let handle = ed
        .start_export(dir.path().join("final.mp4"), ExportSettings::default())
        .unwrap();

    // mutate the live timeline while the worker renders its frozen copy
    ed.clear().unwrap();
    assert!(ed.timeline().is_empty());

    hold.store(false, Ordering::SeqCst);
    let (_, terminal) = drain(handle);
    assert!(matches!(terminal, ExportEvent::Completed(_)));
}
