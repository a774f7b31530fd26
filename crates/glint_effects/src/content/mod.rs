//! # Reference Effects
//!
//! A small set of ready-made effects: one decal renderer and three
//! particle types, plus the spawners that emit them in bursts.
//!
//! Texture ids are fixed slots the host maps to real textures.

mod cloud;
mod flame;
mod marker;
mod spark;

pub use cloud::{spawn_cloud_burst, CloudPuff};
pub use flame::{spawn_flame, Flame};
pub use marker::MarkerDecal;
pub use spark::{spawn_spark_burst, Spark};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::context::EffectsContext;
use crate::decal::DecalManifest;
use crate::draw::TextureId;
use crate::error::EffectsResult;
use crate::hooks::HookPoint;
use crate::layer::LayerId;
use crate::math::Vec2;
use crate::particle::ParticleEmitter;

/// Marker decal sprite.
pub const MARKER_TEXTURE: TextureId = TextureId(50);
/// 2x4 spark streak.
pub const SPARK_TEXTURE: TextureId = TextureId(100);
/// Soft round glow.
pub const GLOW_TEXTURE: TextureId = TextureId(101);
/// Cloud puff sprite.
pub const CLOUD_TEXTURE: TextureId = TextureId(102);
/// Flame sheet: 10 columns of progress, 6 rows (3 variants + 3 glows).
pub const FLAME_TEXTURE: TextureId = TextureId(103);

/// Pixel size of [`SPARK_TEXTURE`].
pub const SPARK_SIZE: Vec2 = Vec2::new(4.0, 2.0);
/// Pixel size of [`GLOW_TEXTURE`].
pub const GLOW_SIZE: Vec2 = Vec2::new(64.0, 64.0);
/// Pixel size of [`CLOUD_TEXTURE`].
pub const CLOUD_SIZE: Vec2 = Vec2::new(32.0, 32.0);
/// Pixel size of the whole [`FLAME_TEXTURE`] sheet.
pub const FLAME_SHEET: (u16, u16) = (160, 96);

/// Layer names used by [`register_reference_effects`].
pub mod names {
    /// Spark layer.
    pub const SPARKS: &str = "sparks";
    /// Cloud puff layer.
    pub const CLOUDS: &str = "clouds";
    /// Flame layer.
    pub const FLAMES: &str = "flames";
}

/// Handles to the reference layers.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceLayers {
    /// Sparks, drawn with particles.
    pub sparks: LayerId<ParticleEmitter<Spark>>,
    /// Cloud puffs, drawn with particles.
    pub clouds: LayerId<ParticleEmitter<CloudPuff>>,
    /// Flames, drawn on top.
    pub flames: LayerId<ParticleEmitter<Flame>>,
}

/// Manifest with every reference decal renderer.
#[must_use]
pub fn reference_manifest() -> DecalManifest {
    DecalManifest::new().with(MarkerDecal)
}

/// Registers the three reference particle layers.
///
/// # Errors
///
/// Whatever [`EffectsContext::register_particles`] reports.
pub fn register_reference_effects(context: &mut EffectsContext) -> EffectsResult<ReferenceLayers> {
    Ok(ReferenceLayers {
        sparks: context.register_particles::<Spark>(names::SPARKS, HookPoint::DrawParticles)?,
        clouds: context.register_particles::<CloudPuff>(names::CLOUDS, HookPoint::DrawParticles)?,
        flames: context.register_particles::<Flame>(names::FLAMES, HookPoint::DrawOverlay)?,
    })
}

/// Generator handed to the spawners.
pub type EffectRng = ChaCha8Rng;

/// Deterministic generator for spawners.
#[must_use]
pub fn effect_rng(seed: u64) -> EffectRng {
    ChaCha8Rng::seed_from_u64(seed)
}
