#![no_main]

use article_image::engine::decode_image;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(decoded) = decode_image(data) {
        assert!(decoded.image.width() > 0 && decoded.image.height() > 0);
    }
});
