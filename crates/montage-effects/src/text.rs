//! Text overlay rasterization.
//!
//! Overlays are burned into frames at export time with a CPU glyph
//! rasterizer. Fonts are resolved by name from the system font
//! directories; live preview never renders overlays, so nothing here is
//! on an interactive path.

use montage_core::{FrameBuffer, MontageError, Result};
use parking_lot::Mutex;
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Distance in pixels between edge-anchored text and the frame border.
const EDGE_MARGIN: f32 = 24.0;

/// Where an overlay is anchored on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

/// Parse an overlay color: `#rrggbb`, `#rgb`, or a small set of names.
pub fn parse_color(s: &str) -> Result<[u8; 4]> {
    let named = match s.to_ascii_lowercase().as_str() {
        "white" => Some([255, 255, 255, 255]),
        "black" => Some([0, 0, 0, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 255, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "cyan" => Some([0, 255, 255, 255]),
        "magenta" => Some([255, 0, 255, 255]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "orange" => Some([255, 165, 0, 255]),
        _ => None,
    };
    if let Some(c) = named {
        return Ok(c);
    }

    let hex = s.strip_prefix('#').ok_or_else(|| {
        MontageError::InvalidParameter(format!("unrecognized color '{s}'"))
    })?;
    let expand = |h: &str| u8::from_str_radix(h, 16).map(|v| v * 17);
    match hex.len() {
        3 => Ok([
            expand(&hex[0..1]).map_err(|_| bad_color(s))?,
            expand(&hex[1..2]).map_err(|_| bad_color(s))?,
            expand(&hex[2..3]).map_err(|_| bad_color(s))?,
            255,
        ]),
        6 => Ok([
            u8::from_str_radix(&hex[0..2], 16).map_err(|_| bad_color(s))?,
            u8::from_str_radix(&hex[2..4], 16).map_err(|_| bad_color(s))?,
            u8::from_str_radix(&hex[4..6], 16).map_err(|_| bad_color(s))?,
            255,
        ]),
        _ => Err(bad_color(s)),
    }
}

fn bad_color(s: &str) -> MontageError {
    MontageError::InvalidParameter(format!("unrecognized color '{s}'"))
}

/// Resolves font names against font files on disk, caching parsed fonts.
pub struct FontLibrary {
    dirs: Vec<PathBuf>,
    cache: Mutex<HashMap<String, Arc<Font<'static>>>>,
}

impl FontLibrary {
    /// Library over the platform's standard font directories.
    pub fn system() -> Self {
        let mut dirs = vec![
            PathBuf::from("/usr/share/fonts"),
            PathBuf::from("/usr/local/share/fonts"),
            PathBuf::from("/System/Library/Fonts"),
            PathBuf::from("C:\\Windows\\Fonts"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(Path::new(&home).join(".fonts"));
            dirs.push(Path::new(&home).join(".local/share/fonts"));
        }
        Self::with_dirs(dirs)
    }

    /// Library over explicit directories (used by tests).
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a font by name, falling back to any available font when
    /// no file matches. Fails only when no font file exists at all.
    pub fn resolve(&self, name: &str) -> Result<Arc<Font<'static>>> {
        let key = normalize(name);
        if let Some(font) = self.cache.lock().get(&key) {
            return Ok(font.clone());
        }

        let candidates = self.font_files();
        let chosen = candidates
            .iter()
            .find(|p| stem_matches(p, &key))
            .or_else(|| candidates.iter().find(|p| stem_matches(p, "dejavusans")))
            .or_else(|| candidates.first())
            .ok_or_else(|| MontageError::Font(name.to_string()))?;

        debug!(font = name, file = %chosen.display(), "resolved overlay font");
        let data = std::fs::read(chosen)?;
        let font = Font::try_from_vec(data).ok_or_else(|| MontageError::Font(name.to_string()))?;
        let font = Arc::new(font);
        self.cache.lock().insert(key, font.clone());
        Ok(font)
    }

    fn font_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            collect_fonts(dir, 0, &mut files);
        }
        files
    }
}

fn collect_fonts(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > 3 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fonts(&path, depth + 1, out);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("ttf") | Some("otf")
        ) {
            out.push(path);
        }
    }
}

fn stem_matches(path: &Path, key: &str) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| normalize(s).contains(key))
        .unwrap_or(false)
}

/// Lowercase and strip everything but letters and digits, so "Times-New-Roman"
/// matches "TimesNewRoman.ttf".
pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Burn a line of text into a frame at the given anchor.
pub fn draw_text(
    frame: &mut FrameBuffer,
    font: &Font<'_>,
    text: &str,
    size: f32,
    color: [u8; 4],
    anchor: Anchor,
) {
    let scale = Scale::uniform(size);
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<_> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();

    let text_width = glyphs
        .iter()
        .rev()
        .filter_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x))
        .next()
        .unwrap_or(0) as f32;
    let text_height = v_metrics.ascent - v_metrics.descent;

    let (ox, oy) = anchor_offset(
        anchor,
        frame.width as f32,
        frame.height as f32,
        text_width,
        text_height,
    );

    for glyph in &glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = bb.min.x + gx as i32 + ox as i32;
            let py = bb.min.y + gy as i32 + oy as i32;
            if px >= 0 && py >= 0 && (px as u32) < frame.width && (py as u32) < frame.height {
                blend(frame, px as u32, py as u32, color, coverage);
            }
        });
    }
}

/// Top-left corner for a text block of `(tw, th)` on a `(fw, fh)` frame.
pub fn anchor_offset(anchor: Anchor, fw: f32, fh: f32, tw: f32, th: f32) -> (f32, f32) {
    let center_x = (fw - tw) / 2.0;
    let center_y = (fh - th) / 2.0;
    let (x, y) = match anchor {
        Anchor::Center => (center_x, center_y),
        Anchor::Top => (center_x, EDGE_MARGIN),
        Anchor::Bottom => (center_x, fh - th - EDGE_MARGIN),
        Anchor::Left => (EDGE_MARGIN, center_y),
        Anchor::Right => (fw - tw - EDGE_MARGIN, center_y),
    };
    (x.max(0.0), y.max(0.0))
}

fn blend(frame: &mut FrameBuffer, x: u32, y: u32, color: [u8; 4], coverage: f32) {
    let alpha = coverage * color[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let dst = frame.pixel(x, y);
    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = (color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha)).round() as u8;
    }
    out[3] = dst[3].max((alpha * 255.0) as u8);
    frame.put_pixel(x, y, out);
}
