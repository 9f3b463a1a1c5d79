// src/engine/decoder.rs
//
// Bitmap loader: JPEG (mozjpeg), PNG (zune-png), WebP (libwebp), others via image crate.

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::error::NormalizeError;
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage,
};
use mozjpeg::Decompress;
use std::io::Cursor;
use tracing::debug;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::bytestream::ZCursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_core::result::DecodingResult;
use zune_png::PngDecoder;

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

fn codec_error<E: std::fmt::Debug>(what: &'static str) -> impl Fn(E) -> NormalizeError {
    move |e| NormalizeError::decode_failed(format!("{what}: {e:?}"))
}

/// Wrap an 8-bit interleaved buffer with `channels` samples per pixel.
fn bitmap_from_raw(
    width: u32,
    height: u32,
    channels: usize,
    buf: Vec<u8>,
) -> EngineResult<DynamicImage> {
    let img = match channels {
        1 => GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    img.ok_or_else(|| {
        NormalizeError::decode_failed(format!(
            "pixel buffer does not match {width}x{height} with {channels} channels"
        ))
    })
}

/// True when the stream ends with the EOI marker, ignoring trailing zero padding.
///
/// An EOI elsewhere (e.g. closing an embedded EXIF thumbnail) does not count.
fn ends_with_eoi(data: &[u8]) -> bool {
    let end = data.iter().rposition(|&b| b != 0x00).map_or(0, |i| i + 1);
    data[..end].ends_with(&[0xFF, 0xD9])
}

/// Decode JPEG with mozjpeg (libjpeg-turbo), always to RGB.
pub fn decode_jpeg_mozjpeg(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:mozjpeg", || {
        // libjpeg pads truncated streams with grey instead of failing
        if !ends_with_eoi(data) {
            return Err(NormalizeError::decode_failed("jpeg: missing EOI marker"));
        }

        let mut started = Decompress::new_mem(data)
            .map_err(codec_error("jpeg: header"))?
            .rgb()
            .map_err(codec_error("jpeg: rgb output"))?;
        let (width, height) = (started.width() as u32, started.height() as u32);
        check_dimensions(width, height)?;

        let rows: Vec<[u8; 3]> = started
            .read_scanlines()
            .map_err(codec_error("jpeg: scanlines"))?;
        bitmap_from_raw(width, height, 3, rows.into_iter().flatten().collect())
    })
}

/// Decode formats without a dedicated decoder (GIF, BMP, ...) using the image crate.
pub fn decode_with_image_crate(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:image", || {
        image::load_from_memory(data).map_err(|e| NormalizeError::decode_failed(e.to_string()))
    })
}

/// Decode PNG with zune-png; 16-bit samples are stripped to 8 bits.
pub fn decode_png_zune(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:png", || {
        let mut decoder =
            PngDecoder::new_with_options(ZCursor::new(data), DecoderOptions::default().png_set_strip_to_8bit(true));
        let pixels = decoder.decode().map_err(codec_error("png"))?;
        let (info, colorspace) = decoder
            .info()
            .zip(decoder.colorspace())
            .ok_or_else(|| NormalizeError::decode_failed("png: header not parsed"))?;
        let (width, height) = (info.width as u32, info.height as u32);
        check_dimensions(width, height)?;

        let DecodingResult::U8(buf) = pixels else {
            return Err(NormalizeError::decode_failed("png: samples are not 8-bit"));
        };
        let channels = match colorspace {
            ColorSpace::Luma => 1,
            ColorSpace::LumaA => 2,
            ColorSpace::RGB => 3,
            ColorSpace::RGBA => 4,
            other => {
                return Err(NormalizeError::decode_failed(format!(
                    "png: unsupported colorspace {other:?}"
                )))
            }
        };
        bitmap_from_raw(width, height, channels, buf)
    })
}

/// Decode WebP with libwebp. Animated WebP goes through the image crate (first frame).
pub fn decode_webp_libwebp(data: &[u8]) -> EngineResult<DynamicImage> {
    run_with_panic_policy("decode:webp", || {
        let features = BitstreamFeatures::new(data)
            .ok_or_else(|| NormalizeError::decode_failed("webp: unreadable bitstream header"))?;
        check_dimensions(features.width(), features.height())?;

        if features.has_animation() {
            return decode_with_image_crate(data);
        }
        WebPDecoder::new(data)
            .decode()
            .map(|frame| frame.to_image())
            .ok_or_else(|| NormalizeError::decode_failed("webp: decode failed"))
    })
}

/// Detect input format using magic bytes. Returns None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Decoded bitmap plus what the loader learned about the payload.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
    /// EXIF orientation that was applied (1 when absent)
    pub orientation: u16,
}

/// Bitmap loader entrypoint:
/// - Refuse empty payloads and oversized headers before touching pixels
/// - Route by magic bytes to the fastest decoder for the format
/// - Apply EXIF orientation so the bitmap is upright, as a browser would draw it
pub fn decode_image(bytes: &[u8]) -> EngineResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(NormalizeError::decode_failed("empty payload"));
    }
    ensure_dimensions_safe(bytes)?;

    let format = detect_format(bytes);
    let img = match format {
        Some(ImageFormat::Jpeg) => decode_jpeg_mozjpeg(bytes)?,
        Some(ImageFormat::Png) => decode_png_zune(bytes)?,
        Some(ImageFormat::WebP) => decode_webp_libwebp(bytes)?,
        Some(_) => decode_with_image_crate(bytes)?,
        None => return Err(NormalizeError::decode_failed("unrecognized image format")),
    };

    if img.width() == 0 || img.height() == 0 {
        return Err(NormalizeError::decode_failed(format!(
            "image has no pixels ({}x{})",
            img.width(),
            img.height()
        )));
    }

    let orientation = detect_exif_orientation(bytes).unwrap_or(1);
    let image = apply_orientation(img, orientation);
    debug!(
        format = ?format,
        width = image.width(),
        height = image.height(),
        orientation,
        "decoded bitmap"
    );

    Ok(DecodedImage {
        image,
        format,
        orientation,
    })
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> EngineResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(NormalizeError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(NormalizeError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Inspect encoded bytes and ensure the image dimensions are safe before decoding.
/// Unreadable headers are left for the decoder to report.
pub fn ensure_dimensions_safe(bytes: &[u8]) -> EngineResult<()> {
    let cursor = Cursor::new(bytes);
    if let Ok(reader) = ImageReader::new(cursor).with_guessed_format() {
        if let Ok((width, height)) = reader.into_dimensions() {
            return check_dimensions(width, height);
        }
    }
    Ok(())
}

/// Extract EXIF Orientation tag (1-8). Returns None if missing or invalid.
pub fn detect_exif_orientation(bytes: &[u8]) -> Option<u16> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let orientation = field.value.get_uint(0)? as u16;
    if (1..=8).contains(&orientation) {
        Some(orientation)
    } else {
        None
    }
}

/// Rotate/flip a bitmap so that EXIF `orientation` becomes 1.
pub fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(), // transpose
        6 => img.rotate90(),
        7 => img.rotate270().fliph(), // transverse
        8 => img.rotate270(),
        _ => img,
    }
}
