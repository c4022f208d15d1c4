//! Montage Effects - software effect application engine
//!
//! Provides the closed Effect variant type, CPU application of pixel and
//! temporal transforms to RGBA frame streams, audio gain/time-stretch,
//! and text overlay rasterization for export burn-in.

pub mod audio;
pub mod effect;
pub mod raster;
pub mod text;

pub use audio::{apply_gain, stretch};
pub use effect::{speed_factor, Effect};
pub use raster::{apply_stack, apply_to_frame, fit, retime, rotate};
pub use text::{anchor_offset, draw_text, parse_color, Anchor, FontLibrary};
