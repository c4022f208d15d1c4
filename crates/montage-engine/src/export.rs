//! Threaded export pipeline.
//!
//! An export renders a frozen copy of the timeline on a worker thread:
//! decode each segment, apply its effect stack, mix its audio, burn in
//! overlays, then hand the finished stream to the encoder. The owning
//! thread observes the run through a channel of [`ExportEvent`]s and can
//! cancel at any point; cancellation leaves no partial output file.

use montage_core::{AudioBuffer, FrameBuffer, MontageError};
use montage_effects::{
    apply_gain, apply_stack, draw_text, fit, parse_color, speed_factor, stretch, FontLibrary,
};
use montage_media::{
    CancelToken, ExportSettings, FrameStream, MediaService, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE,
};
use montage_timeline::Timeline;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Pipeline stage an export failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    /// Validating inputs and resolving fonts
    Preparing,
    /// Decoding, effects, and overlay burn-in
    Rendering,
    /// Handing frames to the encoder
    Encoding,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preparing => "preparing",
            Self::Rendering => "rendering",
            Self::Encoding => "encoding",
        };
        f.write_str(name)
    }
}

/// Progress and completion notifications from an export worker.
///
/// Zero or more `Progress` events (strictly increasing, in `0.0..=1.0`)
/// followed by exactly one terminal event.
#[derive(Debug, Clone)]
pub enum ExportEvent {
    Progress(f64),
    Completed(PathBuf),
    Failed { stage: ExportStage, error: String },
    Cancelled,
}

/// Handle to a running export.
#[derive(Debug)]
pub struct ExportHandle {
    events: crossbeam_channel::Receiver<ExportEvent>,
    cancel: CancelToken,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ExportHandle {
    /// Event stream for this export. Ends after the terminal event.
    pub fn events(&self) -> &crossbeam_channel::Receiver<ExportEvent> {
        &self.events
    }

    /// Request cancellation. The worker honors it at the next frame
    /// boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker has produced its terminal event.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Block until the worker thread exits.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub(crate) fn spawn_export(
    timeline: Timeline,
    settings: ExportSettings,
    output: PathBuf,
    media: Arc<dyn MediaService>,
    fonts: Arc<FontLibrary>,
    finished: Arc<AtomicBool>,
) -> montage_core::Result<ExportHandle> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let cancel = CancelToken::new();

    let worker_cancel = cancel.clone();
    let worker_finished = finished.clone();
    let thread = std::thread::Builder::new()
        .name("montage-export".into())
        .spawn(move || {
            let terminal = run_export(
                &timeline,
                &settings,
                &output,
                media.as_ref(),
                &fonts,
                &worker_cancel,
                &tx,
            );
            worker_finished.store(true, Ordering::Release);
            let _ = tx.send(terminal);
        })?;

    Ok(ExportHandle {
        events: rx,
        cancel,
        finished,
        thread: Some(thread),
    })
}

/// Emit at most one event per distinct fraction, strictly increasing.
struct ProgressEmitter<'a> {
    tx: &'a crossbeam_channel::Sender<ExportEvent>,
    last: f64,
}

impl<'a> ProgressEmitter<'a> {
    fn new(tx: &'a crossbeam_channel::Sender<ExportEvent>) -> Self {
        Self { tx, last: 0.0 }
    }

    fn emit(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction > self.last {
            self.last = fraction;
            let _ = self.tx.send(ExportEvent::Progress(fraction));
        }
    }
}

/// Frames between progress emissions during the encode.
const PROGRESS_STRIDE: u64 = 16;

fn run_export(
    timeline: &Timeline,
    settings: &ExportSettings,
    output: &Path,
    media: &dyn MediaService,
    fonts: &FontLibrary,
    cancel: &CancelToken,
    tx: &crossbeam_channel::Sender<ExportEvent>,
) -> ExportEvent {
    let mut progress = ProgressEmitter::new(tx);

    // Preparing: validate and resolve everything that can fail cheaply
    let first_clip = match timeline.segments().first() {
        Some(segment) => &segment.clip,
        None => {
            return ExportEvent::Failed {
                stage: ExportStage::Preparing,
                error: "timeline has no segments".into(),
            };
        }
    };
    let mut checked: Vec<&str> = Vec::new();
    for segment in timeline.segments() {
        if checked.contains(&segment.clip.path.as_str()) {
            continue;
        }
        if let Err(e) = media.probe(Path::new(&segment.clip.path)) {
            return ExportEvent::Failed {
                stage: ExportStage::Preparing,
                error: e.to_string(),
            };
        }
        checked.push(&segment.clip.path);
    }

    let total_duration = timeline.total_duration();
    let mut overlays = Vec::new();
    for overlay in timeline.overlays() {
        let Some(window) = overlay.clipped_window(total_duration) else {
            warn!(text = %overlay.text, "overlay lies entirely past the end, skipping");
            continue;
        };
        let font = match fonts.resolve(&overlay.font) {
            Ok(font) => font,
            Err(e) => {
                return ExportEvent::Failed {
                    stage: ExportStage::Preparing,
                    error: e.to_string(),
                };
            }
        };
        let color = match parse_color(&overlay.color) {
            Ok(color) => color,
            Err(e) => {
                return ExportEvent::Failed {
                    stage: ExportStage::Preparing,
                    error: e.to_string(),
                };
            }
        };
        overlays.push((overlay, window, font, color));
    }

    let rate = settings.frame_rate.resolve(first_clip.frame_rate);
    let total_frames = timeline
        .segments()
        .iter()
        .map(|s| s.effective_duration().to_frames(rate).max(1))
        .sum::<i64>() as f64;
    let any_audio = timeline.segments().iter().any(|s| s.clip.has_audio);

    info!(
        segments = timeline.segments().len(),
        overlays = overlays.len(),
        rate = %rate,
        output = %output.display(),
        "export started"
    );

    // Rendering: decode, apply effects, accumulate
    let mut combined = FrameStream {
        frames: Vec::new(),
        frame_rate: rate,
        audio: None,
    };
    let mut rendered = 0.0;
    for segment in timeline.segments() {
        if cancel.is_cancelled() {
            return ExportEvent::Cancelled;
        }
        let stream = match media.read_segment(
            &segment.clip,
            segment.source_range(),
            rate,
            settings.width,
            settings.height,
        ) {
            Ok(stream) => stream,
            Err(e) => {
                // the media layer only knows the clip; attribute the
                // failure to the segment being rendered
                let error = match e {
                    MontageError::Decode { reason, .. } => MontageError::Decode {
                        segment: segment.id,
                        reason,
                    },
                    other => other,
                };
                return ExportEvent::Failed {
                    stage: ExportStage::Rendering,
                    error: error.to_string(),
                };
            }
        };

        let frames: Vec<FrameBuffer> = apply_stack(stream.frames, &segment.effects)
            .iter()
            .map(|f| fit(f, settings.width, settings.height))
            .collect();

        let factor = speed_factor(&segment.effects);
        let audio = match stream.audio {
            Some(mut audio) => {
                apply_gain(&mut audio, segment.volume);
                if factor != 1.0 {
                    audio = stretch(&audio, factor);
                }
                Some(audio)
            }
            // keep silent segments in sync when the mix has audio
            None if any_audio => Some(AudioBuffer::silence(
                segment.effective_duration().to_seconds_f64(),
                AUDIO_SAMPLE_RATE,
                AUDIO_CHANNELS,
            )),
            None => None,
        };

        rendered += frames.len() as f64;
        combined.append(FrameStream {
            frames,
            frame_rate: rate,
            audio,
        });
        progress.emit(0.5 * (rendered / total_frames.max(rendered)));
    }

    // Overlay burn-in, by output frame index
    for (overlay, window, font, color) in &overlays {
        if cancel.is_cancelled() {
            return ExportEvent::Cancelled;
        }
        let len = combined.frames.len();
        let first = (window.start.to_frames(rate).max(0) as usize).min(len);
        let last = (window.end().to_frames(rate).max(0) as usize).min(len);
        for frame in &mut combined.frames[first..last] {
            draw_text(
                frame,
                font,
                &overlay.text,
                overlay.size,
                *color,
                overlay.position,
            );
        }
    }

    // Encoding
    let result = media.write(
        output,
        &combined,
        settings,
        &mut |written, total| {
            if written % PROGRESS_STRIDE == 0 || written == total {
                progress.emit(0.5 + 0.5 * written as f64 / total as f64);
            }
        },
        cancel,
    );

    match result {
        Ok(()) => {
            progress.emit(1.0);
            info!(output = %output.display(), "export completed");
            ExportEvent::Completed(output.to_path_buf())
        }
        Err(_) if cancel.is_cancelled() => ExportEvent::Cancelled,
        Err(e) => ExportEvent::Failed {
            stage: ExportStage::Encoding,
            error: e.to_string(),
        },
    }
}
