//! Watermark text rendering.
//!
//! Text is drawn with the public-domain 8×8 bitmap glyphs from `font8x8`,
//! scaled up by an integer factor with nearest-neighbour replication. This
//! keeps the binary free of font files and system font lookups, and makes
//! the rendered pixels identical on every machine.
//!
//! Glyphs are looked up in the ASCII table first, then Latin-1 (which holds
//! `©`). Anything else renders as `?`.

use super::calculations::{glyph_scale, southeast_origin};
use super::params::TextOverlay;
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

const GLYPH_SIZE: u32 = 8;

fn glyph_for(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Pixel extent of `text` rendered at the given glyph scale.
///
/// Glyphs are separated by a gap of one scaled pixel column. Computed in
/// `u64` since large scales overflow `u32`.
pub fn text_extent(text: &str, scale: u32) -> (u64, u64) {
    let count = text.chars().count() as u64;
    if count == 0 {
        return (0, 0);
    }
    let scale = scale.max(1) as u64;
    let glyph = GLYPH_SIZE as u64 * scale;
    let width = count
        .saturating_mul(glyph)
        .saturating_add((count - 1).saturating_mul(scale));
    (width, glyph)
}

/// Half-open pixel rectangle in canvas coordinates; may lie off-canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Rect {
    fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(width),
            y1: y.saturating_add(height),
        }
    }

    /// Part of the rectangle inside a `width`×`height` canvas, if any.
    fn clip(self, width: u32, height: u32) -> Option<Rect> {
        let clipped = Rect {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(width as i64),
            y1: self.y1.min(height as i64),
        };
        (clipped.x0 < clipped.x1 && clipped.y0 < clipped.y1).then_some(clipped)
    }
}

/// Draw `overlay` onto `canvas`, anchored at the bottom-right corner.
///
/// Pixels falling outside the canvas are clipped before they are visited, so
/// the work is bounded by the canvas size whatever the font size.
pub fn draw_text(canvas: &mut RgbaImage, overlay: &TextOverlay) {
    let scale = glyph_scale(overlay.font_size);
    let extent = text_extent(&overlay.text, scale);
    if extent == (0, 0) {
        return;
    }
    let (width, height) = canvas.dimensions();
    let (origin_x, origin_y) = southeast_origin((width, height), extent, overlay.inset);
    let scale = scale as i64;
    let glyph = GLYPH_SIZE as i64 * scale;
    let advance = glyph + scale;

    for (idx, ch) in overlay.text.chars().enumerate() {
        let glyph_x = origin_x.saturating_add((idx as i64).saturating_mul(advance));
        if glyph_x >= width as i64 {
            break;
        }
        if Rect::new(glyph_x, origin_y, glyph, glyph).clip(width, height).is_none() {
            continue;
        }
        for (row, bits) in glyph_for(ch).iter().enumerate() {
            for col in 0..GLYPH_SIZE as i64 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let block = Rect::new(
                    glyph_x + col * scale,
                    origin_y + row as i64 * scale,
                    scale,
                    scale,
                );
                if let Some(visible) = block.clip(width, height) {
                    fill_rect(canvas, visible, overlay.fill);
                }
            }
        }
    }
}

/// Blend `fill` over every pixel of an already-clipped rectangle.
fn fill_rect(canvas: &mut RgbaImage, rect: Rect, fill: [u8; 4]) {
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            let dst = canvas.get_pixel_mut(x as u32, y as u32);
            *dst = blend_over(*dst, fill);
        }
    }
}

/// Porter-Duff "over" of `src` onto `dst`.
fn blend_over(dst: Rgba<u8>, src: [u8; 4]) -> Rgba<u8> {
    let alpha = src[3] as u16;
    if alpha == 0 {
        return dst;
    }
    let inv = 255 - alpha;
    let mix = |d: u8, s: u8| ((d as u16 * inv + s as u16 * alpha) / 255) as u8;
    let out_alpha = alpha + (dst[3] as u16 * inv + 127) / 255;
    Rgba([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        out_alpha.min(255) as u8,
    ])
}
