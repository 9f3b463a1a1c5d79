// src/engine/api.rs
//
// ImageNormalizer: the public entrypoint tying loader, framing and budgeted encoder together.

use crate::engine::budget::{encode_within_budget, FrameEncoder, MozJpegEncoder};
use crate::engine::common::{check_cancel, CancelToken, EngineResult};
use crate::engine::decoder::decode_image;
use crate::engine::io::Source;
use crate::engine::pipeline::build_frame;
use crate::ops::NormalizeProfile;
use std::time::Instant;
use tracing::debug;

/// A normalized, budget-compliant JPEG.
///
/// Ownership of the bytes passes to the caller; nothing inside the crate keeps a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedJpeg {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedJpeg {
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Runs one profile over raw payloads.
///
/// Usage:
/// ```no_run
/// use article_image::{ImageNormalizer, NormalizeProfile};
///
/// # fn demo(upload: &[u8]) -> article_image::error::Result<()> {
/// let header = ImageNormalizer::new(NormalizeProfile::header()).normalize(upload)?;
/// assert_eq!((header.width, header.height), (1280, 720));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ImageNormalizer {
    profile: NormalizeProfile,
    cancel: Option<CancelToken>,
}

impl ImageNormalizer {
    pub fn new(profile: NormalizeProfile) -> Self {
        Self {
            profile,
            cancel: None,
        }
    }

    /// Normalizer for a built-in profile name (`header`, `content`).
    pub fn for_profile(name: &str) -> EngineResult<Self> {
        Ok(Self::new(NormalizeProfile::get(name)?))
    }

    /// Check `token` between stages and before every encode attempt.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn profile(&self) -> &NormalizeProfile {
        &self.profile
    }

    pub fn normalize(&self, payload: &[u8]) -> EngineResult<EncodedJpeg> {
        self.normalize_with_encoder(payload, &mut MozJpegEncoder)
    }

    /// Normalize a memory or file source; a mapped file is released before returning.
    pub fn normalize_source(&self, source: &Source) -> EngineResult<EncodedJpeg> {
        source.with_bytes(|bytes| self.normalize(bytes))
    }

    /// Same as [`normalize`](Self::normalize) with a caller-supplied encoder.
    pub fn normalize_with_encoder<E: FrameEncoder>(
        &self,
        payload: &[u8],
        encoder: &mut E,
    ) -> EngineResult<EncodedJpeg> {
        self.profile.validate()?;
        let cancel = self.cancel.as_ref();
        let started = Instant::now();

        let decoded = decode_image(payload)?;
        let decode_ms = started.elapsed().as_secs_f64() * 1000.0;
        check_cancel(cancel, "decode")?;

        let frame_started = Instant::now();
        let frame = build_frame(decoded.image, self.profile.framing)?;
        let frame_ms = frame_started.elapsed().as_secs_f64() * 1000.0;
        check_cancel(cancel, "resample")?;

        let encode_started = Instant::now();
        let encoded = encode_within_budget(&frame, &self.profile.budget, encoder, cancel)?;
        let encode_ms = encode_started.elapsed().as_secs_f64() * 1000.0;

        debug!(
            bytes_in = payload.len(),
            bytes_out = encoded.data.len(),
            width = frame.width(),
            height = frame.height(),
            attempts = encoded.attempts,
            decode_ms,
            frame_ms,
            encode_ms,
            "normalized image"
        );

        Ok(EncodedJpeg {
            data: encoded.data,
            width: frame.width(),
            height: frame.height(),
        })
    }
}

/// Header image: center-cropped 16:9, exactly 1280x720, at most 1 MiB.
pub fn normalize_header_image(payload: &[u8]) -> EngineResult<EncodedJpeg> {
    ImageNormalizer::new(NormalizeProfile::header()).normalize(payload)
}

/// Content image: ratio kept, fits 1280x1280 without upscaling, at most 1 MiB.
pub fn normalize_content_image(payload: &[u8]) -> EngineResult<EncodedJpeg> {
    ImageNormalizer::new(NormalizeProfile::content()).normalize(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizeError;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn header_output_is_1280x720_jpeg() {
        let out = normalize_header_image(&png_bytes(400, 200)).unwrap();
        assert_eq!((out.width, out.height), (1280, 720));
        assert!(out.len() <= 1_048_576);
        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1280, 720));
    }

    #[test]
    fn content_output_keeps_small_images() {
        let out = normalize_content_image(&png_bytes(300, 200)).unwrap();
        assert_eq!((out.width, out.height), (300, 200));
    }

    #[test]
    fn for_profile_rejects_unknown_names() {
        assert!(ImageNormalizer::for_profile("content").is_ok());
        assert!(matches!(
            ImageNormalizer::for_profile("banner"),
            Err(NormalizeError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn cancelled_token_stops_after_decode() {
        let token = CancelToken::new();
        token.cancel();
        let err = ImageNormalizer::new(NormalizeProfile::content())
            .with_cancel(token)
            .normalize(&png_bytes(10, 10))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Cancelled { ref stage } if stage == "decode"));
    }

    #[test]
    fn custom_encoder_sees_the_frame() {
        let mut seen = None;
        let mut enc = |frame: &DynamicImage, _q: u8| -> EngineResult<Vec<u8>> {
            seen = Some((frame.width(), frame.height()));
            Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
        };
        let out = ImageNormalizer::new(NormalizeProfile::content())
            .normalize_with_encoder(&png_bytes(2000, 500), &mut enc)
            .unwrap();
        assert_eq!(seen, Some((1280, 320)));
        assert_eq!(out.into_bytes(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }
}
