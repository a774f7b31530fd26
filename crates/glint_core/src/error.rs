//! # Kernel Error Types
//!
//! Two families of errors live here:
//! - [`KernelError`] for slot and pool bookkeeping (exhaustion, bad ids)
//! - [`EffectError`] for failures raised by a single pooled entry while it
//!   updates or draws

use std::fmt;

use thiserror::Error;

/// Errors raised by the bitmap, slot store and pools.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Every slot is in use. Nothing was mutated.
    #[error("exhausted: all {capacity} slots in use")]
    Exhausted {
        /// Total capacity of the structure.
        capacity: usize,
    },

    /// Slot id is outside `[0, capacity)`.
    #[error("slot {slot} out of range for capacity {capacity}")]
    SlotOutOfRange {
        /// The offending slot id.
        slot: usize,
        /// Total capacity of the structure.
        capacity: usize,
    },

    /// Slot id is in range but not currently allocated.
    #[error("slot {0} is not occupied")]
    SlotNotOccupied(usize),
}

/// Result type for kernel bookkeeping operations.
pub type KernelResult<T> = Result<T, KernelError>;

/// The two per-frame phases an entry can fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The update pass.
    Update,
    /// The draw pass.
    Draw,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("update"),
            Self::Draw => f.write_str("draw"),
        }
    }
}

/// Failure of a single pooled entry or handler.
///
/// These never escape a frame pass: the pass logs them, counts them and
/// carries on with the next entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// The entry's update logic reported a failure.
    #[error("update failed: {0}")]
    Update(String),

    /// The entry's draw logic reported a failure.
    #[error("draw failed: {0}")]
    Draw(String),

    /// The draw target refused a request.
    #[error("draw target rejected request: {0}")]
    Target(String),

    /// The handler panicked; the panic was caught at the entry boundary.
    #[error("handler panicked during {phase}: {message}")]
    Panicked {
        /// Phase the panic happened in.
        phase: Phase,
        /// Panic payload, if it was a string.
        message: String,
    },
}

/// Result type for per-entry update/draw logic.
pub type EffectResult<T> = Result<T, EffectError>;
