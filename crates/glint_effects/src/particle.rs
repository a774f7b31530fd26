//! # Particle Emitters
//!
//! A [`ParticleEmitter`] pairs one [`ObjectPool`] with the
//! [`ActiveListRenderer`] that owns its live instances. Each particle
//! type gets its own emitter, registered with the context as a layer.

use std::any::Any;

use glint_core::{ActiveListRenderer, ObjectPool, Particle, PoolStats, Pooled};

use crate::config::EffectsConfig;
use crate::draw::DrawTarget;
use crate::layer::{EffectLayer, LayerStats};
use crate::math::Vec2;

/// State shared by every particle of one emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleSettings {
    /// Added to every particle position at draw time (usually the
    /// negated camera position).
    pub anchor_position: Vec2,
}

/// A particle type that can live in an emitter.
pub trait EmitterParticle:
    Particle<Settings = ParticleSettings, Target = dyn DrawTarget> + Default + 'static
{
}

impl<T> EmitterParticle for T where
    T: Particle<Settings = ParticleSettings, Target = dyn DrawTarget> + Default + 'static
{
}

/// Pool plus active list for one particle type.
///
/// ```text
/// request / spawn ──► ObjectPool ──► ActiveListRenderer ──┐
///        ▲                                                │
///        └──────────── compaction returns expired ◄───────┘
/// ```
pub struct ParticleEmitter<T: Particle> {
    name: String,
    pool: ObjectPool<T>,
    renderer: ActiveListRenderer<T>,
}

impl<T: EmitterParticle> ParticleEmitter<T> {
    /// Creates an emitter with a pool of `capacity` instances.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize, list_capacity_hint: usize) -> Self {
        Self {
            name: name.into(),
            pool: ObjectPool::new(capacity),
            renderer: ActiveListRenderer::new(ParticleSettings::default(), list_capacity_hint),
        }
    }

    /// Creates an emitter sized by `config` for the layer called `name`.
    #[must_use]
    pub fn from_config(name: impl Into<String>, config: &EffectsConfig) -> Self {
        let name = name.into();
        let capacity = config.capacity_for(&name);
        Self::new(name, capacity, config.list_capacity_hint)
    }

    /// Takes a reset instance from the pool, or `None` when exhausted.
    ///
    /// Hand it back through [`Self::add`]; an instance that is never added
    /// does not return to the pool.
    pub fn request(&mut self) -> Option<Pooled<T>> {
        self.pool.request()
    }

    /// Queues an instance for the next update.
    ///
    /// Instances requested from another emitter are dropped on expiry
    /// if this pool has no room for them.
    pub fn add(&mut self, particle: Pooled<T>) {
        self.renderer.add(particle);
    }

    /// Requests, initialises and queues one particle.
    ///
    /// Returns `false` when the pool is exhausted.
    pub fn spawn(&mut self, init: impl FnOnce(&mut T)) -> bool {
        self.renderer.spawn(&mut self.pool, init)
    }

    /// Moves the draw anchor.
    pub fn set_anchor(&mut self, anchor_position: Vec2) {
        self.renderer.settings_mut().anchor_position = anchor_position;
    }

    /// Shared settings.
    #[must_use]
    pub fn settings(&self) -> &ParticleSettings {
        self.renderer.settings()
    }

    /// Live particles in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.renderer.iter()
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderer.len()
    }

    /// True when nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderer.is_empty()
    }

    /// Particles waiting for their first update.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.renderer.queued_len()
    }

    /// The backing pool.
    #[must_use]
    pub const fn pool(&self) -> &ObjectPool<T> {
        &self.pool
    }

    /// Pool traffic counters.
    #[must_use]
    pub const fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl<T: EmitterParticle> EffectLayer for ParticleEmitter<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self) -> LayerStats {
        LayerStats::from_update(self.renderer.update(&mut self.pool))
    }

    fn draw(&mut self, target: &mut (dyn DrawTarget + 'static)) -> LayerStats {
        LayerStats::from_draw(self.renderer.draw(target))
    }

    fn live_count(&self) -> usize {
        self.renderer.len() + self.renderer.queued_len()
    }

    fn clear(&mut self) {
        self.renderer.clear(&mut self.pool);
    }

    fn reload(&mut self, config: &EffectsConfig) {
        let settings = *self.renderer.settings();
        let capacity = config.capacity_for(&self.name);
        self.pool = ObjectPool::new(capacity);
        self.renderer = ActiveListRenderer::new(settings, config.list_capacity_hint);
        tracing::debug!(layer = %self.name, capacity, "particle emitter rebuilt");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Particle> std::fmt::Debug for ParticleEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleEmitter")
            .field("name", &self.name)
            .field("pool", &self.pool)
            .field("renderer", &self.renderer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawRequest, TextureId};
    use glint_core::{EffectResult, Lifecycle, Poolable};

    #[derive(Default)]
    struct Ember {
        position: Vec2,
        ttl: u32,
    }

    impl Poolable for Ember {}

    impl Particle for Ember {
        type Settings = ParticleSettings;
        type Target = dyn DrawTarget;

        fn update(&mut self, _settings: &mut ParticleSettings) -> EffectResult<Lifecycle> {
            self.ttl = self.ttl.saturating_sub(1);
            Ok(if self.ttl == 0 {
                Lifecycle::Expired
            } else {
                Lifecycle::Alive
            })
        }

        fn draw(&self, settings: &ParticleSettings, target: &mut Self::Target) -> EffectResult<()> {
            target.draw(&DrawRequest::new(
                TextureId(1),
                self.position + settings.anchor_position,
            ))
        }
    }

    #[test]
    fn test_emitter_draws_with_anchor() {
        let mut emitter: ParticleEmitter<Ember> = ParticleEmitter::new("embers", 4, 4);
        emitter.spawn(|e| {
            e.position = Vec2::new(10.0, 10.0);
            e.ttl = 3;
        });
        emitter.set_anchor(Vec2::new(-5.0, 0.0));

        let mut out: Vec<DrawRequest> = Vec::new();
        EffectLayer::update(&mut emitter);
        let stats = EffectLayer::draw(&mut emitter, &mut out);

        assert_eq!(stats.drawn, 1);
        assert_eq!(out[0].position, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_request_then_add() {
        let mut emitter: ParticleEmitter<Ember> = ParticleEmitter::new("embers", 1, 1);
        let mut ember = emitter.request().unwrap();
        ember.ttl = 1;
        assert!(emitter.request().is_none());
        emitter.add(ember);
        assert_eq!(emitter.queued_len(), 1);

        let stats = EffectLayer::update(&mut emitter);
        assert_eq!(stats.removed, 1);
        assert_eq!(emitter.pool().free_count(), 1);
        assert!(emitter.request().is_some());
    }

    #[test]
    fn test_reload_resizes_pool_and_keeps_anchor() {
        let mut emitter: ParticleEmitter<Ember> = ParticleEmitter::new("embers", 2, 2);
        emitter.set_anchor(Vec2::new(1.0, 2.0));
        emitter.spawn(|e| e.ttl = 10);

        let config = EffectsConfig::default().with_particle_capacity("embers", 7);
        emitter.reload(&config);

        assert_eq!(emitter.pool().capacity(), 7);
        assert_eq!(emitter.live_count(), 0);
        assert_eq!(emitter.settings().anchor_position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_clear_returns_instances() {
        let mut emitter: ParticleEmitter<Ember> = ParticleEmitter::from_config(
            "embers",
            &EffectsConfig::default().with_particle_capacity("embers", 3),
        );
        for _ in 0..3 {
            assert!(emitter.spawn(|e| e.ttl = 10));
        }
        EffectLayer::update(&mut emitter);
        emitter.clear();
        assert_eq!(emitter.live_count(), 0);
        assert_eq!(emitter.pool().free_count(), 3);
    }
}
