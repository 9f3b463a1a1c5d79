// lib.rs
//
// article-image: image normalization for the article editor
//
// - Header images: center-cropped to 16:9, exactly 1280x720
// - Content images: ratio kept, fit 1280x1280, never upscaled
// - Every output is a progressive JPEG of at most 1 MiB, or a typed error
//
// Uploading, storage paths and persistence belong to the caller.

// Memory allocator optimization - jemalloc for large decode/resample buffers
// Note: jemalloc is not supported on Windows/MSVC, so we exclude it on that platform
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub mod article;
pub mod engine;
pub mod error;
pub mod ops;
pub mod slug;

pub use engine::{
    normalize_content_image, normalize_header_image, CancelToken, EncodedJpeg, ImageNormalizer,
    Source,
};
pub use error::{ErrorCategory, ErrorKind, NormalizeError};
pub use ops::{Framing, NormalizeProfile, SizeBudget, MAX_ENCODED_BYTES};

/// Get library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Input formats the loader can decode
pub fn supported_input_formats() -> &'static [&'static str] {
    &["jpeg", "jpg", "png", "webp", "gif", "bmp"]
}
