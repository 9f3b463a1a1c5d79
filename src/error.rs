// src/error.rs
//
// Errors of a normalization call.
//
// Each error has a category (how the editor reacts) and a kind (decode,
// encode, oversize or other), both derived from the variant.

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy used to decide how the editor surfaces a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by the operator
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Dimension/pixel/I-O limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// The three terminal failure kinds of a normalization call.
///
/// Every [`NormalizeError`] maps onto one of them; errors that cannot happen
/// inside the pipeline proper (bad profile, cancellation, panics) are `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload is not a readable image.
    Decode,
    /// The encoder produced no output.
    Encode,
    /// Every attempt within the quality policy exceeded the byte ceiling.
    Oversize,
    Other,
}

/// article-image error types
#[derive(Debug, Error)]
pub enum NormalizeError {
    // File I/O Errors
    #[error("File not found: {path}")]
    FileNotFound { path: Cow<'static, str> },

    #[error("Failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to memory-map file '{path}': {source}")]
    MmapFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    // Decode Errors
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Transform Errors
    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    // Encode Errors
    #[error("Failed to encode as JPEG: {message}")]
    EncodeFailed { message: Cow<'static, str> },

    #[error(
        "The image is still {size} bytes after compression, over the {limit}-byte limit. \
         Please choose a different image."
    )]
    Oversize { size: usize, limit: usize },

    // Configuration Errors
    #[error("Unknown profile: '{name}'. Available: header, content")]
    InvalidProfile { name: Cow<'static, str> },

    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    // Control Errors
    #[error("Normalization cancelled during {stage}")]
    Cancelled { stage: Cow<'static, str> },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl NormalizeError {
    pub fn file_not_found(path: impl Into<Cow<'static, str>>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn mmap_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::MmapFailed {
            path: path.into(),
            source,
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn encode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::EncodeFailed {
            message: message.into(),
        }
    }

    pub fn oversize(size: usize, limit: usize) -> Self {
        Self::Oversize { size, limit }
    }

    pub fn invalid_profile(name: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidProfile { name: name.into() }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn cancelled(stage: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (the operator can fix it)
    ///
    /// Consistent with category(): UserError and ResourceLimit are recoverable,
    /// CodecError and InternalBug are not.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            // UserError: the operator picks another file or another setting
            Self::FileNotFound { .. }
            | Self::Oversize { .. }
            | Self::InvalidProfile { .. }
            | Self::InvalidArgument { .. }
            | Self::Cancelled { .. } => ErrorCategory::UserError,

            // CodecError: Format/encoding issues
            Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. }
            | Self::ResizeFailed { .. } => ErrorCategory::CodecError,

            // ResourceLimit: dimension limits and I/O pressure
            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::FileReadFailed { .. }
            | Self::MmapFailed { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }

    /// Map onto the decode / encode / oversize failure kinds of a normalizer call.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. }
            | Self::FileReadFailed { .. }
            | Self::MmapFailed { .. }
            | Self::DecodeFailed { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => ErrorKind::Decode,
            Self::EncodeFailed { .. } => ErrorKind::Encode,
            Self::Oversize { .. } => ErrorKind::Oversize,
            Self::ResizeFailed { .. }
            | Self::InvalidProfile { .. }
            | Self::InvalidArgument { .. }
            | Self::Cancelled { .. }
            | Self::InternalPanic { .. } => ErrorKind::Other,
        }
    }
}

impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, NormalizeError>;
