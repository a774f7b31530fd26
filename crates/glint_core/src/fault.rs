//! # Fault Isolation
//!
//! Runs one entry's update or draw so that neither an `Err` nor a panic can
//! abort the surrounding pass.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{EffectError, EffectResult, Phase};

/// Runs `f` for a single entry, converting a panic into
/// [`EffectError::Panicked`].
///
/// The closure is asserted unwind-safe: after a panic the caller only
/// skips the entry for this phase, it never relies on the entry's
/// invariants having been upheld.
pub fn isolate<R>(phase: Phase, f: impl FnOnce() -> EffectResult<R>) -> EffectResult<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(EffectError::Panicked {
            phase,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_passes_through() {
        assert_eq!(isolate(Phase::Update, || Ok(7)), Ok(7));

        let err = isolate::<()>(Phase::Draw, || Err(EffectError::Draw("bad".into())));
        assert_eq!(err, Err(EffectError::Draw("bad".into())));
    }

    #[test]
    fn test_isolate_catches_panic() {
        let result = isolate::<()>(Phase::Update, || panic!("particle exploded"));
        match result {
            Err(EffectError::Panicked { phase, message }) => {
                assert_eq!(phase, Phase::Update);
                assert_eq!(message, "particle exploded");
            }
            other => panic!("expected a caught panic, got {other:?}"),
        }
    }
}
