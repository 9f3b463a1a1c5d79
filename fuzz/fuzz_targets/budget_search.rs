#![no_main]

//! Drives the quality search with a fake encoder whose sizes come from the input.
//! Checks the search never goes below the floor, never exceeds the attempt limit,
//! and never returns an oversized blob.

use arbitrary::{Arbitrary, Unstructured};
use article_image::engine::{encode_within_budget, EngineResult};
use article_image::SizeBudget;
use image::{DynamicImage, RgbImage};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct BudgetSeed {
    max_bytes: u16,
    initial_quality: u8,
    quality_step: u8,
    min_quality: u8,
    max_attempts: u8,
    sizes: Vec<u16>,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let seed = match BudgetSeed::arbitrary(&mut unstructured) {
        Ok(s) => s,
        Err(_) => return,
    };

    let budget = SizeBudget {
        max_bytes: seed.max_bytes as usize,
        initial_quality: seed.initial_quality,
        quality_step: seed.quality_step,
        min_quality: seed.min_quality,
        max_attempts: (seed.max_attempts % 16) as u32,
    };
    let frame = DynamicImage::ImageRgb8(RgbImage::new(1, 1));

    let mut tried = Vec::new();
    let mut encoder = |_: &DynamicImage, q: u8| -> EngineResult<Vec<u8>> {
        let size = seed.sizes.get(tried.len()).copied().unwrap_or(0) as usize;
        tried.push(q);
        Ok(vec![0u8; size])
    };

    let result = encode_within_budget(&frame, &budget, &mut encoder, None);
    if budget.validate().is_err() {
        assert!(result.is_err());
        return;
    }
    assert!(tried.len() as u32 <= budget.max_attempts);
    assert!(tried.iter().skip(1).all(|&q| q >= budget.min_quality));
    if let Ok(out) = result {
        assert!(out.data.len() <= budget.max_bytes);
    }
});
