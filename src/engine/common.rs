// src/engine/common.rs
//
// Common utilities shared across engine modules.
// Provides the result alias, the codec panic policy and cooperative cancellation.

use crate::error::NormalizeError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Result type used throughout the engine.
pub type EngineResult<T> = std::result::Result<T, NormalizeError>;

/// Run a codec call, turning a panic into `InternalPanic`.
///
/// mozjpeg reports libjpeg errors by unwinding, and decoders can panic on
/// hostile input. Nothing escapes a normalizer call as a panic.
pub fn run_with_panic_policy<T, F>(label: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            warn!(stage = label, %detail, "codec panicked");
            Err(NormalizeError::internal_panic(format!("{label}: {detail}")))
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a running pipeline.
///
/// Cloning yields a handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Fail with `Cancelled` if the flag is set.
    pub fn check(&self, stage: &'static str) -> EngineResult<()> {
        if self.is_cancelled() {
            return Err(NormalizeError::cancelled(stage));
        }
        Ok(())
    }
}

/// Check an optional token; `None` never cancels.
pub(crate) fn check_cancel(cancel: Option<&CancelToken>, stage: &'static str) -> EngineResult<()> {
    match cancel {
        Some(token) => token.check(stage),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_becomes_internal_error() {
        let result: EngineResult<()> = run_with_panic_policy("test:panic", || panic!("boom"));
        match result {
            Err(NormalizeError::InternalPanic { message }) => {
                assert!(message.contains("test:panic"));
                assert!(message.contains("boom"));
            }
            other => panic!("expected InternalPanic, got {other:?}"),
        }
    }

    #[test]
    fn ok_and_err_pass_through() {
        assert_eq!(run_with_panic_policy("ok", || Ok(7)).unwrap(), 7);
        let err = run_with_panic_policy::<(), _>("err", || {
            Err(NormalizeError::decode_failed("nope"))
        })
        .unwrap_err();
        assert!(matches!(err, NormalizeError::DecodeFailed { .. }));
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(token.check("decode").is_ok());
        handle.cancel();
        assert!(token.is_cancelled());
        let err = token.check("resample").unwrap_err();
        assert!(matches!(err, NormalizeError::Cancelled { ref stage } if stage == "resample"));
        assert!(check_cancel(None, "encode").is_ok());
        assert!(check_cancel(Some(&token), "encode").is_err());
    }
}
