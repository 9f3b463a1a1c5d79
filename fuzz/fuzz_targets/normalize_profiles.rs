#![no_main]

//! Arbitrary payloads through both normalizers: never panic, and every success
//! honors the frame and byte-budget guarantees.

use article_image::{normalize_content_image, normalize_header_image, MAX_ENCODED_BYTES};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(out) = normalize_header_image(data) {
        assert_eq!((out.width, out.height), (1280, 720));
        assert!(out.len() <= MAX_ENCODED_BYTES);
    }
    if let Ok(out) = normalize_content_image(data) {
        assert!(out.width <= 1280 && out.height <= 1280);
        assert!(out.len() <= MAX_ENCODED_BYTES);
    }
});
