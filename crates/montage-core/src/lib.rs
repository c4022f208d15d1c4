//! Montage Core - Foundation types for the editing engine
//!
//! This crate provides the fundamental types used throughout Montage:
//! - Time representation (RationalTime, FrameRate, TimeRange)
//! - RGBA frame buffers and PCM audio buffers
//! - The error taxonomy shared by every crate

pub mod audio;
pub mod error;
pub mod frame;
pub mod time;

pub use audio::AudioBuffer;
pub use error::{MontageError, Result};
pub use frame::FrameBuffer;
pub use time::{FrameRate, RationalTime, TimeRange};
