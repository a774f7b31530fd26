//! # Effects Configuration
//!
//! Capacities for every pool, loaded once at startup from TOML.
//!
//! ```toml
//! max_decals = 8192
//! default_particle_capacity = 256
//! list_capacity_hint = 64
//!
//! [particle_capacity]
//! cloud = 300
//! sparks = 512
//! ```
//!
//! Capacities are fixed for the lifetime of the context; a new config only
//! takes effect through [`crate::EffectsContext::reload`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EffectsError, EffectsResult};

/// Default number of decal slots.
pub const DEFAULT_MAX_DECALS: usize = 8192;

/// Default capacity of a particle pool without an override.
pub const DEFAULT_PARTICLE_CAPACITY: usize = 256;

/// Default pre-size of each active list.
pub const DEFAULT_LIST_CAPACITY_HINT: usize = 64;

/// Pool capacities for the effects context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectsConfig {
    /// Number of decal slots.
    pub max_decals: usize,
    /// Capacity of particle pools without an override.
    pub default_particle_capacity: usize,
    /// Initial size of each active list (not a limit).
    pub list_capacity_hint: usize,
    /// Per-layer pool capacity, keyed by layer name.
    pub particle_capacity: BTreeMap<String, usize>,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            max_decals: DEFAULT_MAX_DECALS,
            default_particle_capacity: DEFAULT_PARTICLE_CAPACITY,
            list_capacity_hint: DEFAULT_LIST_CAPACITY_HINT,
            particle_capacity: BTreeMap::new(),
        }
    }
}

impl EffectsConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`EffectsError::Toml`] for malformed input, then anything
    /// [`Self::validate`] rejects.
    pub fn from_toml_str(source: &str) -> EffectsResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`EffectsError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> EffectsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| EffectsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), max_decals = config.max_decals, "effects config loaded");
        Ok(config)
    }

    /// Rejects zero capacities.
    ///
    /// # Errors
    ///
    /// [`EffectsError::InvalidConfig`] naming the offending value.
    pub fn validate(&self) -> EffectsResult<()> {
        if self.max_decals == 0 {
            return Err(EffectsError::InvalidConfig("max_decals must be > 0".into()));
        }
        if u32::try_from(self.max_decals).is_err() {
            return Err(EffectsError::InvalidConfig(format!(
                "max_decals {} does not fit a 32-bit slot id",
                self.max_decals
            )));
        }
        if self.default_particle_capacity == 0 {
            return Err(EffectsError::InvalidConfig(
                "default_particle_capacity must be > 0".into(),
            ));
        }
        if let Some((name, _)) = self.particle_capacity.iter().find(|(_, c)| **c == 0) {
            return Err(EffectsError::InvalidConfig(format!(
                "particle_capacity.{name} must be > 0"
            )));
        }
        Ok(())
    }

    /// Pool capacity for the layer called `name`.
    #[must_use]
    pub fn capacity_for(&self, name: &str) -> usize {
        self.particle_capacity
            .get(name)
            .copied()
            .unwrap_or(self.default_particle_capacity)
    }

    /// Builder-style override for one layer.
    #[must_use]
    pub fn with_particle_capacity(mut self, name: impl Into<String>, capacity: usize) -> Self {
        self.particle_capacity.insert(name.into(), capacity);
        self
    }

    /// Builder-style decal slot count.
    #[must_use]
    pub fn with_max_decals(mut self, max_decals: usize) -> Self {
        self.max_decals = max_decals;
        self
    }
}
