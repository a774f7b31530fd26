//! # Effects Error Types
//!
//! Failures of the effects context itself. Per-entry failures during a
//! frame are [`glint_core::EffectError`]s and never surface here.

use std::path::PathBuf;

use glint_core::KernelError;
use thiserror::Error;

use crate::hooks::HookPoint;

/// Errors raised while configuring or driving the effects context.
#[derive(Error, Debug)]
pub enum EffectsError {
    /// Slot or pool bookkeeping failed.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Configuration values are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::EffectsConfig`].
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// No layer exists at this index.
    #[error("unknown layer {0}")]
    UnknownLayer(usize),

    /// The layer exists but has a different concrete type.
    #[error("layer {index} is not a {expected}")]
    LayerTypeMismatch {
        /// Layer index.
        index: usize,
        /// Requested type name.
        expected: &'static str,
    },

    /// A layer with this name is already registered.
    #[error("layer name {0:?} already registered")]
    DuplicateLayer(String),

    /// Layers can only be bound to draw hooks.
    #[error("layers cannot be bound to the {0} hook")]
    InvalidHook(HookPoint),

    /// The context was shut down.
    #[error("effects context is shut down")]
    NotRunning,
}

/// Result type for effects context operations.
pub type EffectsResult<T> = Result<T, EffectsError>;
