//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Output dimensions of a primary artifact.
///
/// Images wider than `max_width` are scaled down to exactly `max_width`,
/// preserving aspect ratio. Narrower images are left alone (no upscaling).
///
/// # Examples
/// ```
/// # use image_press::imaging::calculate_primary_dimensions;
/// assert_eq!(calculate_primary_dimensions((3840, 2160), 1920), (1920, 1080));
/// assert_eq!(calculate_primary_dimensions((800, 600), 1920), (800, 600));
/// ```
pub fn calculate_primary_dimensions(original: (u32, u32), max_width: u32) -> (u32, u32) {
    let (w, h) = original;
    if w <= max_width {
        return (w, h);
    }
    let scaled_h = (h as f64 * max_width as f64 / w as f64).round() as u32;
    (max_width, scaled_h.max(1))
}

/// Watermark font size for a source of the given intrinsic dimensions.
///
/// Computed through the scaled output height: the source is notionally
/// scaled to `max_width`, giving `scaled_height`; the effective aspect is
/// `max_width / scaled_height`; the font size is
/// `max_width * scaled_height / (10_000 * aspect)`. The intermediate steps are
/// kept as-is so rounding matches the established output.
pub fn calculate_watermark_font_size(original: (u32, u32), max_width: u32) -> f64 {
    let (w, h) = original;
    if w == 0 || h == 0 {
        return 0.0;
    }
    let max_width = max_width as f64;
    let delta_ratio = max_width / w as f64;
    let scaled_height = delta_ratio * h as f64;
    let ratio = max_width / scaled_height;
    max_width * scaled_height / (10_000.0 * ratio)
}

/// Integer scale applied to the 8px bitmap glyphs for a nominal font size.
///
/// Never less than 1, so tiny watermarks stay legible.
pub fn glyph_scale(font_size: f64) -> u32 {
    let scale = (font_size / 8.0).round();
    if scale.is_finite() && scale >= 1.0 {
        scale as u32
    } else {
        1
    }
}

/// Top-left origin for a block of `text` size anchored to the bottom-right
/// corner of `canvas`, kept `inset` pixels away from both edges.
///
/// May be negative when the block is larger than the canvas; callers clip.
pub fn southeast_origin(canvas: (u32, u32), text: (u64, u64), inset: f64) -> (i64, i64) {
    // `as` saturates for out-of-range floats.
    let inset = inset.round() as i64;
    let text_w = i64::try_from(text.0).unwrap_or(i64::MAX);
    let text_h = i64::try_from(text.1).unwrap_or(i64::MAX);
    let x = (canvas.0 as i64).saturating_sub(inset).saturating_sub(text_w);
    let y = (canvas.1 as i64).saturating_sub(inset).saturating_sub(text_h);
    (x, y)
}
