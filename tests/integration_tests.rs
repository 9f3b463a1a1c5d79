// tests/integration_tests.rs
//
// End-to-end normalization through the public API: payload in, JPEG out.

use article_image::engine::MAX_DIMENSION;
use article_image::{
    normalize_content_image, normalize_header_image, CancelToken, ErrorKind, ImageNormalizer,
    NormalizeError, NormalizeProfile, SizeBudget, Source, MAX_ENCODED_BYTES,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::{Cursor, Write};

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

// Deterministic per-pixel noise; compresses badly at any quality
fn noise(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    }))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg).unwrap()
}

mod header_tests {
    use super::*;

    #[test]
    fn test_wide_photo_becomes_1280x720() {
        let png = encode(&gradient(4000, 2000), ImageFormat::Png);
        let out = normalize_header_image(&png).unwrap();

        assert_eq!((out.width, out.height), (1280, 720));
        assert!(out.len() <= MAX_ENCODED_BYTES);
        assert_eq!(decode(&out.data).dimensions(), (1280, 720));
    }

    #[test]
    fn test_tall_photo_becomes_1280x720() {
        let jpeg = encode(&gradient(600, 1800), ImageFormat::Jpeg);
        let out = normalize_header_image(&jpeg).unwrap();
        assert_eq!(decode(&out.data).dimensions(), (1280, 720));
    }

    #[test]
    fn test_small_source_is_upscaled_to_frame() {
        let out = normalize_header_image(&encode(&gradient(160, 90), ImageFormat::Png)).unwrap();
        assert_eq!((out.width, out.height), (1280, 720));
    }

    #[test]
    fn test_already_normalized_header_is_stable() {
        let first = normalize_header_image(&encode(&gradient(1280, 720), ImageFormat::Png)).unwrap();
        let second = normalize_header_image(&first.data).unwrap();
        assert_eq!((second.width, second.height), (1280, 720));
        assert!(second.len() <= MAX_ENCODED_BYTES);
    }

    #[test]
    fn test_noisy_header_still_fits_budget() {
        let png = encode(&noise(1920, 1080), ImageFormat::Png);
        let out = normalize_header_image(&png).unwrap();
        assert!(out.len() <= MAX_ENCODED_BYTES);
    }
}

mod content_tests {
    use super::*;

    #[test]
    fn test_tall_photo_fits_box() {
        let png = encode(&gradient(500, 2000), ImageFormat::Png);
        let out = normalize_content_image(&png).unwrap();
        assert_eq!((out.width, out.height), (320, 1280));
        assert_eq!(decode(&out.data).dimensions(), (320, 1280));
    }

    #[test]
    fn test_wide_photo_fits_box() {
        let out = normalize_content_image(&encode(&gradient(2560, 1440), ImageFormat::Png)).unwrap();
        assert_eq!((out.width, out.height), (1280, 720));
    }

    #[test]
    fn test_small_photo_is_not_upscaled() {
        let out = normalize_content_image(&encode(&gradient(800, 600), ImageFormat::Jpeg)).unwrap();
        assert_eq!((out.width, out.height), (800, 600));
    }

    #[test]
    fn test_transparent_png_is_flattened() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 0])));
        let out = normalize_content_image(&encode(&img, ImageFormat::Png)).unwrap();
        let px = decode(&out.data).to_rgb8().get_pixel(32, 32).0;
        assert!(px.iter().all(|&c| c < 16), "expected black, got {px:?}");
    }

    #[test]
    fn test_webp_input() {
        let webp = encode(&gradient(300, 200), ImageFormat::WebP);
        let out = normalize_content_image(&webp).unwrap();
        assert_eq!((out.width, out.height), (300, 200));
    }
}

mod source_tests {
    use super::*;

    #[test]
    fn test_file_source_matches_memory_source() {
        let png = encode(&gradient(200, 100), ImageFormat::Png);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&png).unwrap();
        file.flush().unwrap();

        let normalizer = ImageNormalizer::new(NormalizeProfile::header());
        let from_file = normalizer
            .normalize_source(&Source::from_path(file.path()))
            .unwrap();
        let from_memory = normalizer.normalize_source(&Source::from_bytes(png)).unwrap();
        assert_eq!(from_file, from_memory);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageNormalizer::new(NormalizeProfile::content())
            .normalize_source(&Source::from_path(dir.path().join("missing.png")))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::FileNotFound { .. }));
    }

    #[test]
    fn test_empty_file_is_a_decode_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = ImageNormalizer::new(NormalizeProfile::content())
            .normalize_source(&Source::from_path(file.path()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_garbage_payload_is_decode_error() {
        let err = normalize_content_image(b"definitely not an image").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_tight_budget_reports_oversize() {
        let profile = NormalizeProfile::header()
            .with_budget(SizeBudget::default().with_max_bytes(2_000));
        let err = ImageNormalizer::new(profile)
            .normalize(&encode(&noise(640, 360), ImageFormat::Png))
            .unwrap_err();

        match err {
            NormalizeError::Oversize { size, limit } => {
                assert_eq!(limit, 2_000);
                assert!(size > limit);
            }
            other => panic!("expected Oversize, got {other:?}"),
        }
    }

    #[test]
    fn test_oversize_message_asks_for_another_image() {
        let err = NormalizeError::oversize(2_000_000, MAX_ENCODED_BYTES);
        assert_eq!(err.kind(), ErrorKind::Oversize);
        assert!(err.to_string().contains("choose a different image"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let err = ImageNormalizer::new(NormalizeProfile::header())
            .with_cancel(token)
            .normalize(&encode(&gradient(64, 64), ImageFormat::Png))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Cancelled { .. }));
    }

    #[test]
    fn test_oversized_dimensions_rejected_before_decode() {
        let png = encode(&gradient(MAX_DIMENSION + 1, 1), ImageFormat::Png);
        let err = normalize_content_image(&png).unwrap_err();
        assert!(matches!(err, NormalizeError::DimensionExceedsLimit { .. }));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
