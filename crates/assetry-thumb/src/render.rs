use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, GenericImageView};

use crate::error::{ThumbError, ThumbResult};

/// Largest side a baseline JPEG can encode.
pub const MAX_DIMENSION: u32 = 65_535;

/// Upper bound on output pixels, which bounds the resize buffer.
pub const MAX_PIXELS: u64 = 16 * 1024 * 1024;

/// Output size for a source of `width` x `height` scaled to `target_width`.
///
/// The width is normally `target_width` (smaller sources are enlarged, same
/// as larger ones are reduced) and the height keeps the aspect ratio, rounded,
/// never below one pixel. Sources so tall that the height would pass
/// [`MAX_DIMENSION`] or the output would pass [`MAX_PIXELS`] are capped in
/// height instead, with the width narrowed to keep the aspect ratio.
pub fn target_size(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let target_width = target_width.clamp(1, MAX_DIMENSION);
    if width == 0 || height == 0 {
        return (target_width, 1);
    }
    let max_height = (MAX_PIXELS / u64::from(target_width)).min(u64::from(MAX_DIMENSION)) as u32;
    let scaled = (f64::from(height) * f64::from(target_width) / f64::from(width)).round();
    if scaled <= f64::from(max_height) {
        return (target_width, (scaled as u32).max(1));
    }
    let narrowed = (f64::from(width) * f64::from(max_height) / f64::from(height)).round() as u32;
    (narrowed.clamp(1, target_width), max_height)
}

/// Decode an image, resize it to `target_width`, and encode it as JPEG.
///
/// CPU-bound; call from a blocking context.
pub fn render_jpeg(source: &[u8], target_width: u32, quality: u8) -> ThumbResult<Vec<u8>> {
    let decoded = image::load_from_memory(source)
        .map_err(|e| ThumbError::Derivation(format!("decode source image: {e}")))?;
    let (width, height) = decoded.dimensions();
    let (out_width, out_height) = target_size(width, height, target_width);

    let resized = if (out_width, out_height) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(out_width, out_height, FilterType::Triangle)
    };

    // JPEG has no alpha channel.
    let rgb = resized.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(rgb.as_raw(), out_width, out_height, ColorType::Rgb8.into())
        .map_err(|e| ThumbError::Derivation(format!("encode thumbnail: {e}")))?;
    Ok(jpeg)
}
