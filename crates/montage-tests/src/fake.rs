//! A synthetic media service so pipeline tests run without media files
//! or an ffmpeg install.

use montage_core::{
    AudioBuffer, FrameBuffer, FrameRate, MontageError, Result, TimeRange,
};
use montage_media::{CancelToken, ExportSettings, FrameStream, MediaService};
use montage_timeline::ClipRef;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fabricates ten-second 30fps clips with audio, renders test-pattern
/// frames, and "encodes" by writing a marker file.
pub struct FakeMediaService {
    duration_seconds: i64,
    missing: Mutex<HashSet<String>>,
    /// While set, `write` stalls before its first frame. Lets tests
    /// cancel or overlap exports deterministically.
    hold_encode: Arc<AtomicBool>,
    /// When set, every decode fails even though probing succeeds.
    fail_decode: AtomicBool,
}

impl FakeMediaService {
    pub fn new() -> Self {
        Self {
            duration_seconds: 10,
            missing: Mutex::new(HashSet::new()),
            hold_encode: Arc::new(AtomicBool::new(false)),
            fail_decode: AtomicBool::new(false),
        }
    }

    /// Mark a path as unavailable from now on.
    pub fn mark_missing(&self, path: &str) {
        self.missing.lock().unwrap().insert(path.to_string());
    }

    /// Make every subsequent decode fail.
    pub fn fail_decoding(&self) {
        self.fail_decode.store(true, Ordering::SeqCst);
    }

    /// Stall encodes until the returned flag is cleared.
    pub fn hold_encode(&self) -> Arc<AtomicBool> {
        self.hold_encode.store(true, Ordering::SeqCst);
        self.hold_encode.clone()
    }
}

impl MediaService for FakeMediaService {
    fn probe(&self, path: &Path) -> Result<ClipRef> {
        let path = path.to_string_lossy().into_owned();
        if self.missing.lock().unwrap().contains(&path) {
            return Err(MontageError::MissingSource(path));
        }
        Ok(ClipRef::new(
            path,
            montage_core::RationalTime::from_seconds(self.duration_seconds),
            FrameRate::FPS_30,
            true,
        ))
    }

    fn read_segment(
        &self,
        clip: &ClipRef,
        range: TimeRange,
        rate: FrameRate,
        width: u32,
        height: u32,
    ) -> Result<FrameStream> {
        if self.fail_decode.load(Ordering::SeqCst)
            || self.missing.lock().unwrap().contains(&clip.path)
        {
            return Err(MontageError::Decode {
                segment: clip.id,
                reason: "source unreadable".into(),
            });
        }
        let count = range.duration.to_frames(rate).max(0) as usize;
        let frames = vec![FrameBuffer::test_pattern(width, height); count];
        let audio = clip.has_audio.then(|| {
            AudioBuffer::silence(range.duration.to_seconds_f64(), 48_000, 2)
        });
        Ok(FrameStream {
            frames,
            frame_rate: rate,
            audio,
        })
    }

    fn write(
        &self,
        path: &Path,
        stream: &FrameStream,
        _settings: &ExportSettings,
        on_frame: &mut dyn FnMut(u64, u64),
        cancel: &CancelToken,
    ) -> Result<()> {
        while self.hold_encode.load(Ordering::SeqCst) && !cancel.is_cancelled() {
            std::thread::sleep(Duration::from_millis(1));
        }

        let total = stream.frame_count();
        let mut file = std::fs::File::create(path)?;
        for written in 1..=total {
            if cancel.is_cancelled() {
                drop(file);
                let _ = std::fs::remove_file(path);
                return Err(MontageError::Encode("encode cancelled".into()));
            }
            file.write_all(b"frame\n")?;
            on_frame(written, total);
        }
        Ok(())
    }
}
