// src/engine/budget.rs
//
// Size-budgeted encoding: a bounded linear search over JPEG quality.
//
// Quality-to-size is close to monotonic but too uneven to bisect reliably in one
// pass, so the search steps down from the initial quality and stops at the first
// blob that fits, at the attempt limit, or when the next quality would fall
// below the floor.

use crate::engine::common::{check_cancel, CancelToken, EngineResult};
use crate::engine::encoder::encode_jpeg;
use crate::error::NormalizeError;
use crate::ops::SizeBudget;
use image::DynamicImage;
use tracing::{debug, warn};

/// Something that can turn a frame into JPEG bytes at a given quality (percent).
pub trait FrameEncoder {
    fn encode(&mut self, frame: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>>;
}

/// Default encoder: progressive mozjpeg.
#[derive(Clone, Copy, Debug, Default)]
pub struct MozJpegEncoder;

impl FrameEncoder for MozJpegEncoder {
    fn encode(&mut self, frame: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>> {
        encode_jpeg(frame, quality)
    }
}

impl<F> FrameEncoder for F
where
    F: FnMut(&DynamicImage, u8) -> EngineResult<Vec<u8>>,
{
    fn encode(&mut self, frame: &DynamicImage, quality: u8) -> EngineResult<Vec<u8>> {
        self(frame, quality)
    }
}

/// Blob accepted by the budget search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetedJpeg {
    pub data: Vec<u8>,
    /// Quality (percent) of the accepted attempt
    pub quality: u8,
    /// Number of encodes performed
    pub attempts: u32,
}

/// Encode `frame` under `budget`, lowering quality until the blob fits.
///
/// Fails with `EncodeFailed` as soon as the encoder fails, and with `Oversize`
/// when the last blob produced within the policy is still over the ceiling.
pub fn encode_within_budget<E: FrameEncoder>(
    frame: &DynamicImage,
    budget: &SizeBudget,
    encoder: &mut E,
    cancel: Option<&CancelToken>,
) -> EngineResult<BudgetedJpeg> {
    budget.validate()?;

    let mut quality = i32::from(budget.initial_quality);
    let mut last: Option<(Vec<u8>, u8)> = None;
    let mut attempts = 0u32;

    while attempts < budget.max_attempts {
        check_cancel(cancel, "encode")?;

        let q = quality as u8;
        let data = encoder.encode(frame, q)?;
        attempts += 1;
        let size = data.len();
        debug!(attempt = attempts, quality = q, size, limit = budget.max_bytes, "jpeg attempt");
        last = Some((data, q));

        if size <= budget.max_bytes {
            break;
        }
        quality -= i32::from(budget.quality_step);
        if quality < i32::from(budget.min_quality) {
            break;
        }
    }

    let Some((data, quality)) = last else {
        return Err(NormalizeError::encode_failed("no encode attempt was made"));
    };

    if data.len() > budget.max_bytes {
        warn!(
            size = data.len(),
            limit = budget.max_bytes,
            quality,
            attempts,
            "image exceeds the size budget at the lowest allowed quality"
        );
        return Err(NormalizeError::oversize(data.len(), budget.max_bytes));
    }

    Ok(BudgetedJpeg {
        data,
        quality,
        attempts,
    })
}
