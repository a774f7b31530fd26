//! # Effects Context
//!
//! Owns the decal pool and every particle layer. The host creates one at
//! startup, registers its layers, then drives it from its frame loop:
//!
//! ```text
//! init(config, manifest)
//!   register_particles::<T>(name, hook) ...
//! per frame:
//!   run_update()
//!   run_draw(DrawDecals, target)     decal pool, then layers bound here
//!   run_draw(DrawParticles, target)
//!   run_draw(DrawOverlay, target)
//! shutdown()
//! ```
//!
//! Nothing here is global; two contexts never share a pool.

use glint_core::SlotId;

use crate::config::EffectsConfig;
use crate::decal::{DecalDrawStats, DecalManifest, DecalPool, DecalRecord};
use crate::draw::DrawTarget;
use crate::error::{EffectsError, EffectsResult};
use crate::hooks::HookPoint;
use crate::layer::{EffectLayer, LayerId, LayerStats};
use crate::particle::{EmitterParticle, ParticleEmitter};

/// A layer and the draw hook it is bound to.
struct Binding {
    hook: HookPoint,
    layer: Box<dyn EffectLayer>,
}

/// Counters for the current frame, reset by [`EffectsContext::run_update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// Frames started since init.
    pub frames: u64,
    /// Update phase totals.
    pub update: LayerStats,
    /// Draw totals over every hook run this frame.
    pub draw: LayerStats,
    /// Decal pass of this frame.
    pub decals: DecalDrawStats,
}

/// The effects engine.
pub struct EffectsContext {
    config: EffectsConfig,
    decals: DecalPool,
    layers: Vec<Binding>,
    running: bool,
    stats: ContextStats,
}

impl EffectsContext {
    /// Validates `config` and builds the decal pool from `manifest`.
    ///
    /// # Errors
    ///
    /// [`EffectsError::InvalidConfig`] if the capacities are unusable.
    pub fn init(config: EffectsConfig, manifest: DecalManifest) -> EffectsResult<Self> {
        config.validate()?;

        let decals = DecalPool::new(config.max_decals, manifest);
        tracing::info!(
            max_decals = config.max_decals,
            decal_renderers = decals.renderers().len(),
            "effects context initialized"
        );

        Ok(Self {
            config,
            decals,
            layers: Vec::new(),
            running: true,
            stats: ContextStats::default(),
        })
    }

    /// Creates a particle emitter named `name`, sized from the config, and
    /// binds it to `hook`.
    ///
    /// # Errors
    ///
    /// - [`EffectsError::NotRunning`] after shutdown
    /// - [`EffectsError::InvalidHook`] for [`HookPoint::Update`]
    /// - [`EffectsError::DuplicateLayer`] if the name is taken
    pub fn register_particles<T: EmitterParticle>(
        &mut self,
        name: &str,
        hook: HookPoint,
    ) -> EffectsResult<LayerId<ParticleEmitter<T>>> {
        let emitter = ParticleEmitter::<T>::from_config(name, &self.config);
        self.register_layer(emitter, hook)
    }

    /// Binds a host-provided layer to `hook`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register_particles`].
    pub fn register_layer<L: EffectLayer>(
        &mut self,
        layer: L,
        hook: HookPoint,
    ) -> EffectsResult<LayerId<L>> {
        self.check_binding(layer.name(), hook)?;

        let index = self.layers.len();
        tracing::debug!(layer = layer.name(), %hook, index, "layer registered");
        self.layers.push(Binding {
            hook,
            layer: Box::new(layer),
        });
        Ok(LayerId::new(index))
    }

    fn check_binding(&self, name: &str, hook: HookPoint) -> EffectsResult<()> {
        self.ensure_running()?;
        if !hook.is_draw() {
            return Err(EffectsError::InvalidHook(hook));
        }
        if self.layers.iter().any(|b| b.layer.name() == name) {
            return Err(EffectsError::DuplicateLayer(name.to_string()));
        }
        Ok(())
    }

    /// Typed access to a registered layer.
    ///
    /// # Errors
    ///
    /// [`EffectsError::UnknownLayer`] or [`EffectsError::LayerTypeMismatch`].
    pub fn layer<L: EffectLayer>(&self, id: LayerId<L>) -> EffectsResult<&L> {
        let binding = self
            .layers
            .get(id.index())
            .ok_or(EffectsError::UnknownLayer(id.index()))?;
        binding
            .layer
            .as_any()
            .downcast_ref::<L>()
            .ok_or(EffectsError::LayerTypeMismatch {
                index: id.index(),
                expected: std::any::type_name::<L>(),
            })
    }

    /// Typed mutable access to a registered layer.
    ///
    /// # Errors
    ///
    /// [`EffectsError::UnknownLayer`] or [`EffectsError::LayerTypeMismatch`].
    pub fn layer_mut<L: EffectLayer>(&mut self, id: LayerId<L>) -> EffectsResult<&mut L> {
        let binding = self
            .layers
            .get_mut(id.index())
            .ok_or(EffectsError::UnknownLayer(id.index()))?;
        binding
            .layer
            .as_any_mut()
            .downcast_mut::<L>()
            .ok_or(EffectsError::LayerTypeMismatch {
                index: id.index(),
                expected: std::any::type_name::<L>(),
            })
    }

    /// The decal pool.
    #[must_use]
    pub const fn decals(&self) -> &DecalPool {
        &self.decals
    }

    /// The decal pool, mutably.
    pub fn decals_mut(&mut self) -> &mut DecalPool {
        &mut self.decals
    }

    /// Places a decal, dropping it when every slot is taken.
    ///
    /// # Errors
    ///
    /// [`EffectsError::NotRunning`] after shutdown.
    pub fn place_decal(&mut self, record: DecalRecord) -> EffectsResult<Option<SlotId>> {
        self.ensure_running()?;
        Ok(self.decals.try_add(record))
    }

    /// Frees a decal slot and hands back its record.
    ///
    /// # Errors
    ///
    /// [`EffectsError::NotRunning`] after shutdown, or
    /// [`EffectsError::Kernel`] if the slot is out of range or free.
    pub fn remove_decal(&mut self, id: SlotId) -> EffectsResult<DecalRecord> {
        self.ensure_running()?;
        Ok(self.decals.remove(id)?)
    }

    /// Update hook: starts a frame and updates every layer in
    /// registration order.
    ///
    /// # Errors
    ///
    /// [`EffectsError::NotRunning`] after shutdown.
    pub fn run_update(&mut self) -> EffectsResult<LayerStats> {
        self.ensure_running()?;

        self.stats = ContextStats {
            frames: self.stats.frames + 1,
            ..ContextStats::default()
        };

        let mut total = LayerStats::default();
        for binding in &mut self.layers {
            total = total.merged(binding.layer.update());
        }

        self.stats.update = total;
        Ok(total)
    }

    /// A draw hook: at [`HookPoint::DrawDecals`] the decal pool draws
    /// first, then every layer bound to `hook` in registration order.
    ///
    /// # Errors
    ///
    /// - [`EffectsError::NotRunning`] after shutdown
    /// - [`EffectsError::InvalidHook`] for [`HookPoint::Update`]
    pub fn run_draw(
        &mut self,
        hook: HookPoint,
        target: &mut (dyn DrawTarget + 'static),
    ) -> EffectsResult<LayerStats> {
        self.ensure_running()?;
        if !hook.is_draw() {
            return Err(EffectsError::InvalidHook(hook));
        }

        let mut total = LayerStats::default();

        if hook == HookPoint::DrawDecals {
            let decals = self.decals.draw(target);
            self.stats.decals = decals;
            total = total.merged(LayerStats {
                drawn: decals.drawn,
                skipped: decals.skipped_unknown + decals.skipped_inactive,
                failures: decals.failed,
                ..LayerStats::default()
            });
        }

        for binding in self.layers.iter_mut().filter(|b| b.hook == hook) {
            total = total.merged(binding.layer.draw(target));
        }

        self.stats.draw = self.stats.draw.merged(total);
        Ok(total)
    }

    /// Returns every pooled instance, frees every decal and stops the
    /// context. Registrations are kept for inspection. Idempotent.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        for binding in &mut self.layers {
            binding.layer.clear();
        }
        self.decals.clear();
        self.running = false;
        tracing::info!(frames = self.stats.frames, "effects context shut down");
    }

    /// Rebuilds every pool with the capacities in `config`, keeping
    /// registrations. Live decals and particles are dropped.
    ///
    /// # Errors
    ///
    /// [`EffectsError::NotRunning`] after shutdown, or
    /// [`EffectsError::InvalidConfig`]; on error nothing changes.
    pub fn reload(&mut self, config: EffectsConfig) -> EffectsResult<()> {
        self.ensure_running()?;
        config.validate()?;

        self.decals.resize(config.max_decals);
        for binding in &mut self.layers {
            binding.layer.reload(&config);
        }
        tracing::info!(
            max_decals = config.max_decals,
            layers = self.layers.len(),
            "effects context reloaded"
        );
        self.config = config;
        Ok(())
    }

    fn ensure_running(&self) -> EffectsResult<()> {
        if self.running {
            Ok(())
        } else {
            Err(EffectsError::NotRunning)
        }
    }

    /// False after [`Self::shutdown`].
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Counters for the current frame.
    #[must_use]
    pub const fn stats(&self) -> ContextStats {
        self.stats
    }

    /// Number of registered layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer names with their hooks, in registration order.
    pub fn layer_names(&self) -> impl Iterator<Item = (&str, HookPoint)> + '_ {
        self.layers.iter().map(|b| (b.layer.name(), b.hook))
    }

    /// Live particles and queued spawns over all layers.
    #[must_use]
    pub fn live_particles(&self) -> usize {
        self.layers.iter().map(|b| b.layer.live_count()).sum()
    }
}

impl std::fmt::Debug for EffectsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectsContext")
            .field("running", &self.running)
            .field("decals", &self.decals)
            .field("layers", &self.layers.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawRequest, TextureId};
    use crate::math::Vec2;
    use crate::particle::ParticleSettings;
    use glint_core::{EffectResult, Lifecycle, Particle, Poolable};
    use std::any::Any;

    #[derive(Default)]
    struct Blip(u32);

    impl Poolable for Blip {}

    impl Particle for Blip {
        type Settings = ParticleSettings;
        type Target = dyn DrawTarget;

        fn update(&mut self, _settings: &mut ParticleSettings) -> EffectResult<Lifecycle> {
            Ok(Lifecycle::Alive)
        }

        fn draw(&self, _settings: &ParticleSettings, target: &mut Self::Target) -> EffectResult<()> {
            target.draw(&DrawRequest::new(TextureId(self.0), Vec2::ZERO))
        }
    }

    /// Host layer that draws one fixed request per frame.
    struct Banner;

    impl EffectLayer for Banner {
        fn name(&self) -> &str {
            "banner"
        }
        fn update(&mut self) -> LayerStats {
            LayerStats::default()
        }
        fn draw(&mut self, target: &mut (dyn DrawTarget + 'static)) -> LayerStats {
            let drawn = u32::from(target.draw(&DrawRequest::new(TextureId(999), Vec2::ZERO)).is_ok());
            LayerStats {
                drawn,
                ..LayerStats::default()
            }
        }
        fn live_count(&self) -> usize {
            1
        }
        fn clear(&mut self) {}
        fn reload(&mut self, _config: &EffectsConfig) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn context() -> EffectsContext {
        EffectsContext::init(EffectsConfig::default().with_max_decals(16), DecalManifest::new())
            .unwrap()
    }

    #[test]
    fn test_layers_draw_at_their_hook_only() {
        let mut ctx = context();
        let blips = ctx
            .register_particles::<Blip>("blips", HookPoint::DrawParticles)
            .unwrap();
        ctx.register_layer(Banner, HookPoint::DrawOverlay).unwrap();
        ctx.layer_mut(blips).unwrap().spawn(|b| b.0 = 7);

        ctx.run_update().unwrap();
        let mut out: Vec<DrawRequest> = Vec::new();
        ctx.run_draw(HookPoint::DrawDecals, &mut out).unwrap();
        assert!(out.is_empty());

        ctx.run_draw(HookPoint::DrawParticles, &mut out).unwrap();
        ctx.run_draw(HookPoint::DrawOverlay, &mut out).unwrap();
        let textures: Vec<u32> = out.iter().map(|r| r.texture.0).collect();
        assert_eq!(textures, vec![7, 999]);
        assert_eq!(ctx.stats().draw.drawn, 2);
    }

    #[test]
    fn test_registration_errors() {
        let mut ctx = context();
        ctx.register_particles::<Blip>("blips", HookPoint::DrawParticles)
            .unwrap();

        assert!(matches!(
            ctx.register_particles::<Blip>("blips", HookPoint::DrawOverlay),
            Err(EffectsError::DuplicateLayer(ref name)) if name == "blips"
        ));
        assert!(matches!(
            ctx.register_layer(Banner, HookPoint::Update),
            Err(EffectsError::InvalidHook(HookPoint::Update))
        ));
        let mut out: Vec<DrawRequest> = Vec::new();
        assert!(matches!(
            ctx.run_draw(HookPoint::Update, &mut out),
            Err(EffectsError::InvalidHook(_))
        ));
    }

    #[test]
    fn test_layer_type_mismatch() {
        let mut ctx = context();
        let banner = ctx.register_layer(Banner, HookPoint::DrawOverlay).unwrap();
        let wrong: LayerId<ParticleEmitter<Blip>> = LayerId::new(banner.index());

        assert!(ctx.layer(banner).is_ok());
        assert!(matches!(
            ctx.layer(wrong),
            Err(EffectsError::LayerTypeMismatch { index: 0, .. })
        ));
        assert!(matches!(
            ctx.layer(LayerId::<Banner>::new(5)),
            Err(EffectsError::UnknownLayer(5))
        ));
    }

    #[test]
    fn test_shutdown_stops_frames() {
        let mut ctx = context();
        let blips = ctx
            .register_particles::<Blip>("blips", HookPoint::DrawParticles)
            .unwrap();
        ctx.layer_mut(blips).unwrap().spawn(|_| {});
        ctx.place_decal(DecalRecord::new(0, crate::math::TilePoint::default()))
            .unwrap();

        ctx.shutdown();
        ctx.shutdown();

        assert!(!ctx.is_running());
        assert_eq!(ctx.live_particles(), 0);
        assert_eq!(ctx.decals().active_count(), 0);
        assert!(matches!(ctx.run_update(), Err(EffectsError::NotRunning)));
        assert!(matches!(
            ctx.reload(EffectsConfig::default()),
            Err(EffectsError::NotRunning)
        ));
    }

    #[test]
    fn test_reload_applies_new_capacities() {
        let mut ctx = context();
        let blips = ctx
            .register_particles::<Blip>("blips", HookPoint::DrawParticles)
            .unwrap();

        let config = EffectsConfig::default()
            .with_max_decals(4)
            .with_particle_capacity("blips", 2);
        ctx.reload(config).unwrap();

        assert_eq!(ctx.decals().capacity(), 4);
        let emitter = ctx.layer_mut(blips).unwrap();
        assert_eq!(emitter.pool().capacity(), 2);
        assert!(emitter.spawn(|_| {}));
        assert!(emitter.spawn(|_| {}));
        assert!(!emitter.spawn(|_| {}));
    }

    #[test]
    fn test_invalid_reload_changes_nothing() {
        let mut ctx = context();
        assert!(ctx.reload(EffectsConfig::default().with_max_decals(0)).is_err());
        assert_eq!(ctx.decals().capacity(), 16);
    }

    #[test]
    fn test_remove_decal_reports_kernel_errors() {
        let config = EffectsConfig::default().with_max_decals(2);
        let mut ctx = EffectsContext::init(config, DecalManifest::new()).unwrap();
        let record = DecalRecord::new(3, crate::math::TilePoint::new(4, 4));
        let id = ctx.place_decal(record).unwrap().unwrap();

        assert_eq!(ctx.remove_decal(id).unwrap(), record);
        assert!(matches!(
            ctx.remove_decal(id),
            Err(EffectsError::Kernel(glint_core::KernelError::SlotNotOccupied(0)))
        ));
        assert!(matches!(
            ctx.remove_decal(SlotId::new(9)),
            Err(EffectsError::Kernel(glint_core::KernelError::SlotOutOfRange { .. }))
        ));
        assert_eq!(ctx.decals().active_count(), 0);
    }
}
