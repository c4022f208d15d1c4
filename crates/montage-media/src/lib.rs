//! Montage Media - FFmpeg-backed media I/O
//!
//! Probing, segment decoding to raw RGBA frames, and encoding of
//! finished streams, all over ffmpeg subprocess pipes.

pub mod ffmpeg;
pub mod service;
pub mod settings;

pub use ffmpeg::{FfmpegService, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
pub use service::{CancelToken, FrameStream, MediaService};
pub use settings::{BitrateTier, ExportSettings, FrameRateChoice, OutputFormat};
