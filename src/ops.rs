// src/ops.rs
//
// Normalization profiles.
// These are cheap to create and copy - the expensive work happens in ImageNormalizer.

use crate::error::{NormalizeError, Result};

/// Hard ceiling on an encoded image: 1 MiB.
pub const MAX_ENCODED_BYTES: usize = 1024 * 1024;

/// How the output frame is derived from the source bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    /// Center-crop to the frame's aspect ratio, then resample to exactly `width`x`height`.
    AspectLock { width: u32, height: u32 },

    /// Scale down (never up) until both axes fit, keeping the source ratio.
    FitWithin { max_width: u32, max_height: u32 },
}

/// Quality search policy for the size-budgeted encoder.
///
/// Qualities are integer percent: 92 means 0.92.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeBudget {
    /// Maximum accepted size of the encoded blob in bytes
    pub max_bytes: usize,
    /// Quality of the first attempt
    pub initial_quality: u8,
    /// Quality decrement after an oversize attempt
    pub quality_step: u8,
    /// The search stops once the next quality would drop below this
    pub min_quality: u8,
    /// Upper bound on attempts, floor permitting
    pub max_attempts: u32,
}

impl Default for SizeBudget {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ENCODED_BYTES,
            initial_quality: 92,
            quality_step: 12,
            min_quality: 40,
            max_attempts: 6,
        }
    }
}

impl SizeBudget {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(NormalizeError::invalid_argument(
                "max_bytes",
                "0",
                "the byte ceiling must be positive",
            ));
        }
        if self.initial_quality == 0 || self.initial_quality > 100 {
            return Err(NormalizeError::invalid_argument(
                "initial_quality",
                self.initial_quality.to_string(),
                "quality must be within 1..=100",
            ));
        }
        if self.min_quality > self.initial_quality {
            return Err(NormalizeError::invalid_argument(
                "min_quality",
                self.min_quality.to_string(),
                "the quality floor cannot exceed the initial quality",
            ));
        }
        if self.max_attempts == 0 {
            return Err(NormalizeError::invalid_argument(
                "max_attempts",
                "0",
                "at least one encode attempt is required",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// PROFILES - the two image slots of an article
// =============================================================================

/// Framing plus budget for one kind of article image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizeProfile {
    pub framing: Framing,
    pub budget: SizeBudget,
}

impl NormalizeProfile {
    pub fn new(framing: Framing, budget: SizeBudget) -> Self {
        Self { framing, budget }
    }

    /// Get the built-in profile by name
    pub fn get(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "header" => Ok(Self::header()),
            "content" => Ok(Self::content()),
            _ => Err(NormalizeError::invalid_profile(name.to_string())),
        }
    }

    /// Header profile: exactly 1280x720 (16:9), JPEG <= 1 MiB
    /// Use case: article hero image
    pub fn header() -> Self {
        Self::new(
            Framing::AspectLock {
                width: 1280,
                height: 720,
            },
            SizeBudget::default(),
        )
    }

    /// Content profile: fits 1280x1280, ratio kept, JPEG <= 1 MiB
    /// Use case: image blocks inside the article body
    pub fn content() -> Self {
        Self::new(
            Framing::FitWithin {
                max_width: 1280,
                max_height: 1280,
            },
            SizeBudget::default(),
        )
    }

    pub fn with_budget(mut self, budget: SizeBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let (w, h) = match self.framing {
            Framing::AspectLock { width, height } => (width, height),
            Framing::FitWithin {
                max_width,
                max_height,
            } => (max_width, max_height),
        };
        if w == 0 || h == 0 {
            return Err(NormalizeError::invalid_argument(
                "framing",
                format!("{w}x{h}"),
                "frame dimensions must be positive",
            ));
        }
        self.budget.validate()
    }
}
