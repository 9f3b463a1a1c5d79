// src/engine/encoder.rs
//
// JPEG encoding (mozjpeg): progressive, 4:2:0, optimized Huffman tables.

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::error::NormalizeError;
use image::{DynamicImage, RgbImage};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;

use crate::engine::MAX_DIMENSION;

/// Smoothing applied before DCT, stronger as quality drops.
fn smoothing_factor(quality: u8) -> u8 {
    if quality >= 90 {
        0
    } else if quality >= 70 {
        5
    } else if quality >= 60 {
        10
    } else {
        18
    }
}

/// Produce an RGB8 view of the frame, compositing any alpha onto black.
///
/// A canvas exported as JPEG shows transparent regions as black; this keeps
/// PNG/WebP uploads with transparency looking the same.
pub fn flatten_to_rgb(img: &DynamicImage) -> Cow<'_, RgbImage> {
    match img {
        DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
        other if other.color().has_alpha() => {
            let rgba = other.to_rgba8();
            let (w, h) = rgba.dimensions();
            let mut out = Vec::with_capacity(w as usize * h as usize * 3);
            for px in rgba.pixels() {
                let [r, g, b, a] = px.0;
                let a = a as u16;
                out.push(((r as u16 * a + 127) / 255) as u8);
                out.push(((g as u16 * a + 127) / 255) as u8);
                out.push(((b as u16 * a + 127) / 255) as u8);
            }
            // Buffer length is exactly w*h*3, so from_raw cannot fail here
            match RgbImage::from_raw(w, h, out) {
                Some(rgb) => Cow::Owned(rgb),
                None => Cow::Owned(other.to_rgb8()),
            }
        }
        other => Cow::Owned(other.to_rgb8()),
    }
}

/// Encode a frame to progressive JPEG with mozjpeg.
///
/// `quality` is percent (1-100); values above 100 are clamped.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let quality = quality.clamp(1, 100);

        let rgb = flatten_to_rgb(img);
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        if w == 0 || h == 0 {
            return Err(NormalizeError::encode_failed(
                "invalid frame dimensions: width or height is zero",
            ));
        }
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(NormalizeError::dimension_exceeds_limit(
                w.max(h),
                MAX_DIMENSION,
            ));
        }
        let expected_len = (w as usize) * (h as usize) * 3;
        if pixels.len() != expected_len {
            return Err(NormalizeError::encode_failed(format!(
                "frame buffer is {} bytes, expected {expected_len}",
                pixels.len()
            )));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(quality as f32);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        comp.set_smoothing_factor(smoothing_factor(quality));

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                NormalizeError::encode_failed(format!("mozjpeg: failed to start compress: {e:?}"))
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    NormalizeError::encode_failed(format!(
                        "mozjpeg: failed to write scanlines: {e:?}"
                    ))
                })?;
            }

            writer.finish().map_err(|e| {
                NormalizeError::encode_failed(format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        if output.is_empty() {
            return Err(NormalizeError::encode_failed("mozjpeg produced no output"));
        }
        Ok(output)
    })
}
