//! The media service boundary between the engine and FFmpeg.

use crate::settings::ExportSettings;
use montage_core::{AudioBuffer, FrameBuffer, FrameRate, Result, TimeRange};
use montage_timeline::ClipRef;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Decoded media for one segment: video frames at a uniform rate, plus
/// the segment's audio when the source has any.
#[derive(Debug, Clone)]
pub struct FrameStream {
    pub frames: Vec<FrameBuffer>,
    pub frame_rate: FrameRate,
    pub audio: Option<AudioBuffer>,
}

impl FrameStream {
    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    /// Concatenate another stream's content onto this one. Rates must
    /// already agree; the caller decodes everything at the output rate.
    pub fn append(&mut self, mut other: FrameStream) {
        self.frames.append(&mut other.frames);
        match (&mut self.audio, other.audio) {
            (Some(a), Some(b)) => a.append(&b),
            (None, Some(b)) => self.audio = Some(b),
            _ => {}
        }
    }
}

/// Shared cancellation flag for a running export.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Abstraction over media I/O.
///
/// The production implementation shells out to FFmpeg; tests substitute
/// a synthetic service so the pipeline runs without media files.
pub trait MediaService: Send + Sync {
    /// Probe a media file's metadata.
    fn probe(&self, path: &Path) -> Result<ClipRef>;

    /// Decode a source-time range of a clip to RGBA frames at the given
    /// rate and size, together with its audio.
    fn read_segment(
        &self,
        clip: &ClipRef,
        range: TimeRange,
        rate: FrameRate,
        width: u32,
        height: u32,
    ) -> Result<FrameStream>;

    /// Encode a finished stream to `path`. `on_frame` receives
    /// `(written, total)` as frames are handed to the encoder; `cancel`
    /// is polled between frames and aborts the encode when set.
    fn write(
        &self,
        path: &Path,
        stream: &FrameStream,
        settings: &ExportSettings,
        on_frame: &mut dyn FnMut(u64, u64),
        cancel: &CancelToken,
    ) -> Result<()>;
}
