//! CPU application of effects to RGBA frames.
//!
//! Frames are transformed one effect at a time, in the stack's stored
//! order. Pixel effects run in parallel across frames; the temporal
//! Speed effect resamples the stream as a whole.

use montage_core::FrameBuffer;
use rayon::prelude::*;
use tracing::debug;

use crate::effect::Effect;

/// Apply a full effect stack, in order, to a frame stream.
pub fn apply_stack(frames: Vec<FrameBuffer>, effects: &[Effect]) -> Vec<FrameBuffer> {
    let mut frames = frames;
    for effect in effects {
        debug!(effect = effect.name(), frames = frames.len(), "applying effect");
        frames = match effect {
            Effect::Speed { factor } => retime(frames, *factor),
            _ => frames
                .into_par_iter()
                .map(|f| apply_to_frame(effect, f))
                .collect(),
        };
    }
    frames
}

/// Apply a single non-temporal effect to one frame.
pub fn apply_to_frame(effect: &Effect, mut frame: FrameBuffer) -> FrameBuffer {
    match *effect {
        Effect::Brightness { level } | Effect::Contrast { level } => {
            scale_intensity(&mut frame, level);
            frame
        }
        Effect::Rotate { degrees } => rotate(&frame, degrees),
        Effect::Grayscale => {
            grayscale(&mut frame);
            frame
        }
        Effect::MirrorHorizontal => {
            mirror_horizontal(&mut frame);
            frame
        }
        Effect::MirrorVertical => {
            mirror_vertical(&mut frame);
            frame
        }
        // Temporal effects operate on the stream, not a frame.
        Effect::Speed { .. } => frame,
    }
}

/// Resample a frame stream by `1 / factor`. Factor 2.0 halves the frame
/// count; factor 0.5 doubles it by repeating source frames.
pub fn retime(frames: Vec<FrameBuffer>, factor: f64) -> Vec<FrameBuffer> {
    if frames.is_empty() || factor == 1.0 {
        return frames;
    }
    let src_len = frames.len();
    let out_len = ((src_len as f64 / factor).round() as usize).max(1);
    (0..out_len)
        .map(|i| {
            let src = ((i as f64 * factor).floor() as usize).min(src_len - 1);
            frames[src].clone()
        })
        .collect()
}

/// Multiply each RGB channel by `level`, clamped to [0, 255]. Alpha is
/// left untouched.
fn scale_intensity(frame: &mut FrameBuffer, level: f64) {
    for px in frame.data.chunks_exact_mut(4) {
        for c in &mut px[..3] {
            *c = (*c as f64 * level).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Rec.601 luma conversion.
fn grayscale(frame: &mut FrameBuffer) {
    for px in frame.data.chunks_exact_mut(4) {
        let luma = (0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64)
            .clamp(0.0, 255.0) as u8;
        px[0] = luma;
        px[1] = luma;
        px[2] = luma;
    }
}

fn mirror_horizontal(frame: &mut FrameBuffer) {
    let w = frame.width;
    for y in 0..frame.height {
        let row = frame.row_mut(y);
        for x in 0..(w / 2) as usize {
            let l = x * 4;
            let r = (w as usize - 1 - x) * 4;
            for c in 0..4 {
                row.swap(l + c, r + c);
            }
        }
    }
}

fn mirror_vertical(frame: &mut FrameBuffer) {
    let h = frame.height;
    for y in 0..(h / 2) {
        let top = frame.row(y).to_vec();
        let bottom = frame.row(h - 1 - y).to_vec();
        frame.row_mut(y).copy_from_slice(&bottom);
        frame.row_mut(h - 1 - y).copy_from_slice(&top);
    }
}

/// Rotate counterclockwise by `degrees` about the frame center.
///
/// Multiples of 90 are exact pixel shuffles. Any other angle expands the
/// canvas to the rotated bounding box, fills with opaque black, and
/// inverse-maps with nearest-neighbor sampling. The expansion policy is
/// fixed so downstream compositing sees deterministic dimensions.
pub fn rotate(frame: &FrameBuffer, degrees: f64) -> FrameBuffer {
    let turns = degrees.rem_euclid(360.0);
    if turns == 0.0 {
        return frame.clone();
    }
    if turns == 90.0 || turns == 180.0 || turns == 270.0 {
        return rotate_exact(frame, turns as u32);
    }
    rotate_arbitrary(frame, turns)
}

fn rotate_exact(frame: &FrameBuffer, turns: u32) -> FrameBuffer {
    let (w, h) = (frame.width, frame.height);
    match turns {
        90 => {
            let mut out = FrameBuffer::new(h, w);
            for y in 0..w {
                for x in 0..h {
                    out.put_pixel(x, y, frame.pixel(w - 1 - y, x));
                }
            }
            out
        }
        180 => {
            let mut out = FrameBuffer::new(w, h);
            for y in 0..h {
                for x in 0..w {
                    out.put_pixel(x, y, frame.pixel(w - 1 - x, h - 1 - y));
                }
            }
            out
        }
        270 => {
            let mut out = FrameBuffer::new(h, w);
            for y in 0..w {
                for x in 0..h {
                    out.put_pixel(x, y, frame.pixel(y, h - 1 - x));
                }
            }
            out
        }
        _ => unreachable!("rotate_exact called with non-right angle"),
    }
}

/// Letterbox a frame onto a `width` x `height` canvas.
///
/// The frame is scaled to fit while preserving aspect ratio, centered,
/// and padded with opaque black. Frames already at the target size pass
/// through untouched, so the common no-rotation path is free.
pub fn fit(frame: &FrameBuffer, width: u32, height: u32) -> FrameBuffer {
    if frame.width == width && frame.height == height {
        return frame.clone();
    }
    let scale = (width as f64 / frame.width as f64).min(height as f64 / frame.height as f64);
    let scaled_w = ((frame.width as f64 * scale).round() as u32).max(1);
    let scaled_h = ((frame.height as f64 * scale).round() as u32).max(1);
    let off_x = (width - scaled_w) / 2;
    let off_y = (height - scaled_h) / 2;

    let mut out = FrameBuffer::new(width, height);
    for y in 0..scaled_h {
        let sy = ((y as f64 / scale) as u32).min(frame.height - 1);
        for x in 0..scaled_w {
            let sx = ((x as f64 / scale) as u32).min(frame.width - 1);
            out.put_pixel(x + off_x, y + off_y, frame.pixel(sx, sy));
        }
    }
    out
}

fn rotate_arbitrary(frame: &FrameBuffer, degrees: f64) -> FrameBuffer {
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (w, h) = (frame.width as f64, frame.height as f64);

    let new_w = (w * cos.abs() + h * sin.abs()).ceil() as u32;
    let new_h = (w * sin.abs() + h * cos.abs()).ceil() as u32;
    let mut out = FrameBuffer::new(new_w, new_h);

    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ncx, ncy) = (new_w as f64 / 2.0, new_h as f64 / 2.0);

    for y in 0..new_h {
        for x in 0..new_w {
            let dx = x as f64 + 0.5 - ncx;
            let dy = y as f64 + 0.5 - ncy;
            // Inverse rotation back into source space
            let sx = cos * dx + sin * dy + cx;
            let sy = -sin * dx + cos * dy + cy;
            let (sx, sy) = (sx.floor(), sy.floor());
            if sx >= 0.0 && sx < w && sy >= 0.0 && sy < h {
                out.put_pixel(x, y, frame.pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}
