#![no_main]

//! Fuzz target for EXIF orientation handling on arbitrary containers.

use article_image::engine::detect_exif_orientation;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(orientation) = detect_exif_orientation(data) {
        assert!((1..=8).contains(&orientation));
    }
});
