// src/engine.rs
//
// The image normalization engine:
// 1. Load: decode the payload into an upright bitmap
// 2. Frame: compute the crop window / fitted size and resample once
// 3. Encode: search JPEG quality until the blob fits the byte budget
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod api;
mod budget;
mod common;
mod decoder;
mod encoder;
mod io;
mod pipeline;

pub use api::{normalize_content_image, normalize_header_image, EncodedJpeg, ImageNormalizer};
pub use budget::{encode_within_budget, BudgetedJpeg, FrameEncoder, MozJpegEncoder};
pub use common::{run_with_panic_policy, CancelToken, EngineResult};
pub use decoder::{
    apply_orientation, check_dimensions, decode_image, decode_jpeg_mozjpeg, decode_png_zune,
    decode_webp_libwebp, decode_with_image_crate, detect_exif_orientation, detect_format,
    DecodedImage,
};
pub use encoder::{encode_jpeg, flatten_to_rgb};
pub use io::Source;
pub use pipeline::{
    aspect_lock_window, build_frame, fit_within, header_crop_window, plan_frame, resample,
    CropWindow,
};
