//! FFmpeg-backed media service.
//!
//! Probing goes through ffprobe's JSON output. Decode and encode shell
//! out to ffmpeg and move raw RGBA video (and f32 PCM audio) over
//! pipes, so the rest of the pipeline never touches container formats.

use crate::service::{CancelToken, FrameStream, MediaService};
use crate::settings::{ExportSettings, OutputFormat};
use ffmpeg_sidecar::command::ffmpeg_is_installed;
use ffmpeg_sidecar::ffprobe::ffprobe_path;
use ffmpeg_sidecar::paths::ffmpeg_path;
use montage_core::{
    AudioBuffer, FrameBuffer, FrameRate, MontageError, RationalTime, Result, TimeRange,
};
use montage_timeline::{ClipRef, SourceResolver};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Sample rate all audio is resampled to while in the pipeline.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
/// Channel count all audio is downmixed or upmixed to.
pub const AUDIO_CHANNELS: u16 = 2;

/// Media service backed by ffmpeg/ffprobe subprocesses.
pub struct FfmpegService {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegService {
    /// Locate the ffmpeg binaries, downloading a sidecar copy when none
    /// is installed.
    pub fn new() -> Result<Self> {
        if !ffmpeg_is_installed() {
            info!("ffmpeg not found, downloading sidecar binary");
            ffmpeg_sidecar::download::auto_download()
                .map_err(|e| MontageError::Encode(format!("ffmpeg unavailable: {e}")))?;
        }
        Ok(Self {
            ffmpeg: ffmpeg_path(),
            ffprobe: ffprobe_path(),
        })
    }

    /// Use explicit binary paths (tests and unusual installs).
    pub fn with_binaries(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self { ffmpeg, ffprobe }
    }

    fn decode_audio(&self, clip: &ClipRef, range: TimeRange) -> Result<AudioBuffer> {
        let output = Command::new(&self.ffmpeg)
            .args([
                "-v",
                "error",
                "-ss",
                &seconds_arg(range.start),
                "-t",
                &seconds_arg(range.duration),
                "-i",
                &clip.path,
                "-vn",
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "-ar",
                &AUDIO_SAMPLE_RATE.to_string(),
                "-ac",
                &AUDIO_CHANNELS.to_string(),
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            return Err(MontageError::Decode {
                segment: clip.id,
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let samples = output
            .stdout
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(AudioBuffer {
            sample_rate: AUDIO_SAMPLE_RATE,
            channels: AUDIO_CHANNELS,
            samples,
        })
    }
}

impl MediaService for FfmpegService {
    fn probe(&self, path: &Path) -> Result<ClipRef> {
        if !path.exists() {
            return Err(MontageError::MissingSource(
                path.to_string_lossy().into_owned(),
            ));
        }
        let path_str = path.to_string_lossy().into_owned();
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &path_str,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            return Err(MontageError::Probe {
                path: path_str,
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parse_probe(&path_str, &String::from_utf8_lossy(&output.stdout))
    }

    fn read_segment(
        &self,
        clip: &ClipRef,
        range: TimeRange,
        rate: FrameRate,
        width: u32,
        height: u32,
    ) -> Result<FrameStream> {
        debug!(clip = %clip.path, start = %range.start, duration = %range.duration, "decoding segment");
        let output = Command::new(&self.ffmpeg)
            .args([
                "-v",
                "error",
                "-ss",
                &seconds_arg(range.start),
                "-t",
                &seconds_arg(range.duration),
                "-i",
                &clip.path,
                "-vf",
                &format!("scale={width}:{height}"),
                "-r",
                &rate_arg(rate),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            return Err(MontageError::Decode {
                segment: clip.id,
                reason: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let frame_bytes = (width * height * 4) as usize;
        let frames = output
            .stdout
            .chunks_exact(frame_bytes)
            .map(|chunk| FrameBuffer::from_rgba(width, height, chunk.to_vec()))
            .collect();

        let audio = if clip.has_audio {
            Some(self.decode_audio(clip, range)?)
        } else {
            None
        };

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
        settings: &ExportSettings,
        on_frame: &mut dyn FnMut(u64, u64),
        cancel: &CancelToken,
    ) -> Result<()> {
        if stream.frames.is_empty() {
            return Err(MontageError::Encode(
                "refusing to encode an empty stream".into(),
            ));
        }
        let width = stream.frames[0].width;
        let height = stream.frames[0].height;
        let total = stream.frame_count();

        // Audio rides in as a second raw input from a temp file
        let audio_file = match &stream.audio {
            Some(audio) if !audio.samples.is_empty() => {
                let mut file = tempfile::NamedTempFile::new()?;
                for sample in &audio.samples {
                    file.write_all(&sample.to_le_bytes())?;
                }
                file.flush()?;
                Some((file, audio.sample_rate, audio.channels))
            }
            _ => None,
        };

        let args = write_args(
            path,
            settings,
            width,
            height,
            stream.frame_rate,
            audio_file
                .as_ref()
                .map(|(f, rate, ch)| (f.path().to_path_buf(), *rate, *ch)),
        );

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MontageError::Encode(format!("failed to spawn ffmpeg: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MontageError::Encode("failed to open ffmpeg stdin".into()))?;

        for (written, frame) in stream.frames.iter().enumerate() {
            if cancel.is_cancelled() {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                let _ = std::fs::remove_file(path);
                return Err(MontageError::Encode("encode cancelled".into()));
            }
            stdin
                .write_all(&frame.data)
                .map_err(|e| MontageError::Encode(format!("failed to write frame: {e}")))?;
            on_frame(written as u64 + 1, total);
        }
        drop(stdin);

        let output = child
            .wait_with_output()
            .map_err(|e| MontageError::Encode(format!("failed to wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            let _ = std::fs::remove_file(path);
            return Err(MontageError::Encode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }
}

impl SourceResolver for FfmpegService {
    fn resolve(&self, path: &str) -> Result<ClipRef> {
        self.probe(Path::new(path))
    }
}

/// Extract clip metadata from ffprobe's JSON output.
fn parse_probe(path: &str, json: &str) -> Result<ClipRef> {
    let bad = |reason: &str| MontageError::Probe {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| bad(&format!("invalid ffprobe output: {e}")))?;

    let duration = value
        .pointer("/format/duration")
        .and_then(|d| d.as_str())
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| bad("missing duration"))?;

    let streams = value
        .get("streams")
        .and_then(|s| s.as_array())
        .ok_or_else(|| bad("missing streams"))?;

    let video = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))
        .ok_or_else(|| bad("no video stream"))?;
    let frame_rate = video
        .get("avg_frame_rate")
        .or_else(|| video.get("r_frame_rate"))
        .and_then(|r| r.as_str())
        .and_then(parse_rate)
        .ok_or_else(|| bad("unreadable frame rate"))?;

    let has_audio = streams
        .iter()
        .any(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"));

    Ok(ClipRef::new(
        path,
        RationalTime::from_seconds_f64(duration),
        frame_rate,
        has_audio,
    ))
}

/// Parse an ffprobe rate like `30000/1001` or `25`.
fn parse_rate(s: &str) -> Option<FrameRate> {
    let (numer, denom) = match s.split_once('/') {
        Some((n, d)) => (n.parse().ok()?, d.parse().ok()?),
        None => (s.parse().ok()?, 1),
    };
    if numer == 0 || denom == 0 {
        return None;
    }
    Some(FrameRate::new(numer, denom))
}

/// Build the encode argument list: raw RGBA on stdin, optional raw PCM
/// from a temp file, codec and bitrate per the settings.
fn write_args(
    path: &Path,
    settings: &ExportSettings,
    width: u32,
    height: u32,
    rate: FrameRate,
    audio: Option<(PathBuf, u32, u16)>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pixel_format".into(),
        "rgba".into(),
        "-video_size".into(),
        format!("{width}x{height}"),
        "-framerate".into(),
        rate_arg(rate),
        "-i".into(),
        "pipe:0".into(),
    ];

    if let Some((audio_path, sample_rate, channels)) = &audio {
        args.extend_from_slice(&[
            "-f".into(),
            "f32le".into(),
            "-ar".into(),
            sample_rate.to_string(),
            "-ac".into(),
            channels.to_string(),
            "-i".into(),
            audio_path.to_string_lossy().into_owned(),
        ]);
    }

    args.extend_from_slice(&[
        "-c:v".into(),
        settings.format.ffmpeg_encoder().into(),
        "-pix_fmt".into(),
        settings.format.pixel_format().into(),
    ]);
    // PNG is lossless, a bitrate target would be ignored
    if settings.format != OutputFormat::Avi {
        args.extend_from_slice(&["-b:v".into(), format!("{}k", settings.bitrate.kbps())]);
    }

    if audio.is_some() {
        args.extend_from_slice(&[
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            format!("{}k", settings.audio_bitrate),
            "-shortest".into(),
        ]);
    }

    args.push(path.to_string_lossy().into_owned());
    args
}

fn seconds_arg(time: RationalTime) -> String {
    format!("{:.6}", time.to_seconds_f64())
}

fn rate_arg(rate: FrameRate) -> String {
    format!("{}/{}", rate.numerator, rate.denominator)
}
