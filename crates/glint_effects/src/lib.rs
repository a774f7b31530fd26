//! # GLINT Effects
//!
//! Decals and particles built on the [`glint_core`] kernel.
//!
//! ## Module Overview
//!
//! - [`decal`] - fixed-slot decal pool with per-type renderers
//! - [`particle`] - pooled particle emitters
//! - [`context`] - the effects engine: owns every pool, runs the hooks
//! - [`hooks`] - named frame extension points
//! - [`draw`] - draw target abstraction and sprite batching
//! - [`config`] - TOML capacities
//! - [`content`] - reference decal and particle effects
//!
//! ## Example
//!
//! ```rust
//! use glint_effects::content::{self, Spark};
//! use glint_effects::{EffectsConfig, EffectsContext, HookPoint, SpriteBatch, Vec2};
//!
//! let mut ctx = EffectsContext::init(EffectsConfig::default(), content::reference_manifest())?;
//! let sparks = ctx.register_particles::<Spark>("sparks", HookPoint::DrawParticles)?;
//!
//! let mut rng = content::effect_rng(42);
//! content::spawn_spark_burst(ctx.layer_mut(sparks)?, &mut rng, Vec2::ZERO, Vec2::Y, 5);
//!
//! let mut batch = SpriteBatch::with_capacity(64);
//! ctx.run_update()?;
//! for hook in HookPoint::DRAW {
//!     ctx.run_draw(hook, &mut batch)?;
//! }
//! assert_eq!(batch.len(), 10); // body + glow per spark
//! ctx.shutdown();
//! # Ok::<(), glint_effects::EffectsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod content;
pub mod context;
pub mod decal;
pub mod draw;
pub mod error;
pub mod hooks;
pub mod layer;
pub mod math;
pub mod particle;

pub use config::EffectsConfig;
pub use context::{ContextStats, EffectsContext};
pub use decal::{
    DecalDrawStats, DecalManifest, DecalPool, DecalRecord, DecalRenderer, DecalTypeId, FramingData,
};
pub use draw::{DrawRequest, DrawTarget, SpriteBatch, SpriteFlip, SpriteInstance, TextureId, TextureRegion};
pub use error::{EffectsError, EffectsResult};
pub use hooks::HookPoint;
pub use layer::{EffectLayer, LayerId, LayerStats};
pub use math::{Color, TilePoint, Vec2};
pub use particle::{EmitterParticle, ParticleEmitter, ParticleSettings};
