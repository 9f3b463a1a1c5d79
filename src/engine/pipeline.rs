// src/engine/pipeline.rs
//
// Frame geometry (crop window, fit-within) and resampling into the output frame.

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::error::NormalizeError;
use crate::ops::Framing;
use fast_image_resize::{self as fir, PixelType, ResizeOptions};
use image::{imageops::FilterType, DynamicImage, RgbImage, RgbaImage};
use tracing::debug;

/// Tolerance used when comparing crop-window ratios.
pub const RATIO_EPSILON: f64 = 1e-9;

/// Rectangular sub-region of a source bitmap, in (possibly fractional) source pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropWindow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropWindow {
    /// The whole bitmap.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f64,
            height: height as f64,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn is_full(&self, width: u32, height: u32) -> bool {
        self.x == 0.0
            && self.y == 0.0
            && self.width == width as f64
            && self.height == height as f64
    }

    /// True when the window lies inside a `width`x`height` bitmap.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= width as f64 + RATIO_EPSILON
            && self.y + self.height <= height as f64 + RATIO_EPSILON
    }
}

/// Centered crop window with the ratio of a `frame_w`x`frame_h` frame.
///
/// Sources strictly wider than the frame lose their sides; everything else,
/// including sources with exactly the frame ratio, loses top and bottom
/// (by zero rows at equal ratio).
pub fn aspect_lock_window(src_w: u32, src_h: u32, frame_w: u32, frame_h: u32) -> CropWindow {
    let (sw, sh) = (src_w as f64, src_h as f64);
    let (fw, fh) = (frame_w as f64, frame_h as f64);

    if sw / sh > fw / fh {
        let width = (sh * fw / fh).min(sw);
        CropWindow {
            x: (sw - width) / 2.0,
            y: 0.0,
            width,
            height: sh,
        }
    } else {
        let height = (sw * fh / fw).min(sh);
        CropWindow {
            x: 0.0,
            y: (sh - height) / 2.0,
            width: sw,
            height,
        }
    }
}

/// Crop window for the 1280x720 header frame.
pub fn header_crop_window(src_w: u32, src_h: u32) -> CropWindow {
    aspect_lock_window(src_w, src_h, 1280, 720)
}

/// Output dimensions that fit inside `max_w`x`max_h` keeping the source ratio.
///
/// Sources already inside the box are returned unchanged (never upscaled).
pub fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w <= max_w && src_h <= max_h {
        return (src_w, src_h);
    }
    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Crop window and output dimensions for a source under a framing.
pub fn plan_frame(src_w: u32, src_h: u32, framing: Framing) -> (CropWindow, (u32, u32)) {
    match framing {
        Framing::AspectLock { width, height } => {
            (aspect_lock_window(src_w, src_h, width, height), (width, height))
        }
        Framing::FitWithin {
            max_width,
            max_height,
        } => (
            CropWindow::full(src_w, src_h),
            fit_within(src_w, src_h, max_width, max_height),
        ),
    }
}

/// Geometry + resample: turn a decoded bitmap into the output frame.
///
/// When the plan is the identity (full window, same size) the bitmap is passed through.
pub fn build_frame(img: DynamicImage, framing: Framing) -> EngineResult<DynamicImage> {
    let (src_w, src_h) = (img.width(), img.height());
    let (window, (dst_w, dst_h)) = plan_frame(src_w, src_h, framing);
    debug!(
        src_w,
        src_h,
        crop_x = window.x,
        crop_y = window.y,
        crop_w = window.width,
        crop_h = window.height,
        dst_w,
        dst_h,
        "planned output frame"
    );

    if window.is_full(src_w, src_h) && (dst_w, dst_h) == (src_w, src_h) {
        return Ok(img);
    }
    resample(img, window, dst_w, dst_h)
}

fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Resample `window` of `img` into a `dst_w`x`dst_h` frame with Lanczos3.
///
/// Uses fast_image_resize; if it fails the image crate does the same job on an
/// integer-rounded window.
pub fn resample(
    img: DynamicImage,
    window: CropWindow,
    dst_w: u32,
    dst_h: u32,
) -> EngineResult<DynamicImage> {
    let (src_w, src_h) = (img.width(), img.height());
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return Err(NormalizeError::resize_failed(
            (src_w, src_h),
            (dst_w, dst_h),
            "invalid dimensions for resize",
        ));
    }
    if !window.is_within(src_w, src_h) {
        return Err(NormalizeError::resize_failed(
            (src_w, src_h),
            (dst_w, dst_h),
            format!("crop window {window:?} lies outside the source"),
        ));
    }

    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other if other.color().has_alpha() => (PixelType::U8x4, other.to_rgba8().into_raw()),
        other => (PixelType::U8x3, other.to_rgb8().into_raw()),
    };

    let options = default_resize_options().crop(window.x, window.y, window.width, window.height);
    let primary = run_with_panic_policy("resize:fir", || {
        resize_with_fir(&src_pixels, src_w, src_h, pixel_type, dst_w, dst_h, &options)
            .map_err(|reason| NormalizeError::resize_failed((src_w, src_h), (dst_w, dst_h), reason))
    });

    match primary {
        Ok(frame) => Ok(frame),
        Err(err) => {
            debug!(error = %err, "fast_image_resize failed, using image crate fallback");
            resize_with_image_crate_fallback(&src_pixels, src_w, src_h, pixel_type, window, dst_w, dst_h)
                .map_err(|fallback_err| {
                    NormalizeError::resize_failed(
                        (src_w, src_h),
                        (dst_w, dst_h),
                        format!("{err}; image crate fallback failed: {fallback_err}"),
                    )
                })
        }
    }
}

fn resize_with_fir(
    src_pixels: &[u8],
    src_w: u32,
    src_h: u32,
    pixel_type: PixelType,
    dst_w: u32,
    dst_h: u32,
    options: &ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let src_image = fir::images::Image::from_vec_u8(src_w, src_h, src_pixels.to_vec(), pixel_type)
        .map_err(|e| format!("fir source image error: {e:?}"))?;
    let mut dst_image = fir::images::Image::new(dst_w, dst_h, pixel_type);

    // The resizer premultiplies alpha for U8x4 itself.
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    into_dynamic(dst_w, dst_h, pixel_type, dst_image.into_vec())
}

fn into_dynamic(
    width: u32,
    height: u32,
    pixel_type: PixelType,
    pixels: Vec<u8>,
) -> std::result::Result<DynamicImage, String> {
    match pixel_type {
        PixelType::U8x3 => RgbImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "failed to create rgb image from resized data".to_string()),
        PixelType::U8x4 => RgbaImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| "failed to create rgba image from resized data".to_string()),
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

fn resize_with_image_crate_fallback(
    src_pixels: &[u8],
    src_w: u32,
    src_h: u32,
    pixel_type: PixelType,
    window: CropWindow,
    dst_w: u32,
    dst_h: u32,
) -> std::result::Result<DynamicImage, String> {
    let src = into_dynamic(src_w, src_h, pixel_type, src_pixels.to_vec())?;

    let x = (window.x.round() as u32).min(src_w - 1);
    let y = (window.y.round() as u32).min(src_h - 1);
    let w = (window.width.round() as u32).clamp(1, src_w - x);
    let h = (window.height.round() as u32).clamp(1, src_h - y);

    Ok(src
        .crop_imm(x, y, w, h)
        .resize_exact(dst_w, dst_h, FilterType::Lanczos3))
}
