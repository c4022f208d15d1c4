//! Export output settings: container/codec, bitrate tier, frame rate.

use montage_core::FrameRate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output container and video codec pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// MP4 container, H.264 video
    Mp4H264,
    /// MP4 container, H.265 video
    Mp4H265,
    /// AVI container, PNG video (lossless)
    Avi,
    /// QuickTime container, H.264 video
    Mov,
    /// WebM container, VP8 video
    WebM,
}

impl OutputFormat {
    /// FFmpeg video encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Mp4H264 | Self::Mov => "libx264",
            Self::Mp4H265 => "libx265",
            Self::Avi => "png",
            Self::WebM => "libvpx",
        }
    }

    /// File extension for the container.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4H264 | Self::Mp4H265 => "mp4",
            Self::Avi => "avi",
            Self::Mov => "mov",
            Self::WebM => "webm",
        }
    }

    /// Encoder input pixel format. PNG frames stay RGB; everything else
    /// goes through the usual 4:2:0 conversion.
    pub fn pixel_format(self) -> &'static str {
        match self {
            Self::Avi => "rgb24",
            _ => "yuv420p",
        }
    }
}

/// Video bitrate tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BitrateTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl BitrateTier {
    /// Target video bitrate in kbps.
    pub fn kbps(self) -> u32 {
        match self {
            Self::Low => 2_000,
            Self::Medium => 5_000,
            Self::High => 8_000,
            Self::VeryHigh => 15_000,
        }
    }
}

/// Output frame rate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameRateChoice {
    /// Keep the frame rate of the first clip in the timeline
    Original,
    Fps24,
    Fps30,
    Fps60,
}

impl FrameRateChoice {
    /// Resolve against the rate of the timeline's leading source.
    pub fn resolve(self, source: FrameRate) -> FrameRate {
        match self {
            Self::Original => source,
            Self::Fps24 => FrameRate::FPS_24,
            Self::Fps30 => FrameRate::FPS_30,
            Self::Fps60 => FrameRate::FPS_60,
        }
    }
}

/// Full export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    pub format: OutputFormat,
    pub bitrate: BitrateTier,
    pub frame_rate: FrameRateChoice,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Audio bitrate in kbps; the audio codec is always AAC
    pub audio_bitrate: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp4H264,
            bitrate: BitrateTier::Medium,
            frame_rate: FrameRateChoice::Original,
            width: 1920,
            height: 1080,
            audio_bitrate: 192,
        }
    }
}

impl ExportSettings {
    /// Force the output path's extension to match the chosen container.
    pub fn apply_extension(&self, path: &Path) -> PathBuf {
        path.with_extension(self.format.extension())
    }
}
