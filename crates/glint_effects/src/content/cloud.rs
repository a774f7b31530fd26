use std::f32::consts::TAU;

use glint_core::{EffectResult, Lifecycle, Particle, Poolable};
use rand::Rng;

use super::{CLOUD_SIZE, CLOUD_TEXTURE};
use crate::draw::{DrawRequest, DrawTarget};
use crate::math::{Color, Vec2};
use crate::particle::{ParticleEmitter, ParticleSettings};

/// A puff of cloud that drifts, spins, fades and shrinks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CloudPuff {
    /// Current position.
    pub position: Vec2,
    /// Velocity per tick, damped every tick.
    pub velocity: Vec2,
    /// Current size.
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Rotation added per tick.
    pub rotation_speed: f32,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
}

impl Poolable for CloudPuff {
    fn on_acquire(&mut self) {
        *self = Self {
            alpha: 1.0,
            ..Self::default()
        };
    }
}

impl Particle for CloudPuff {
    type Settings = ParticleSettings;
    type Target = dyn DrawTarget;

    fn update(&mut self, _settings: &mut ParticleSettings) -> EffectResult<Lifecycle> {
        self.position += self.velocity;
        self.velocity *= 0.94;
        self.rotation += self.rotation_speed;
        self.scale *= 0.97;
        self.alpha -= 0.03;

        if self.alpha <= 0.0 || self.scale <= 0.1 {
            Ok(Lifecycle::Expired)
        } else {
            Ok(Lifecycle::Alive)
        }
    }

    fn draw(&self, settings: &ParticleSettings, target: &mut Self::Target) -> EffectResult<()> {
        let mut request = DrawRequest::new(CLOUD_TEXTURE, self.position + settings.anchor_position);
        request.color = Color::WHITE.scaled(self.alpha);
        request.rotation = self.rotation;
        request.origin = CLOUD_SIZE * 0.5;
        request.scale = Vec2::splat(self.scale);
        target.draw(&request)
    }
}

/// Puffs `count` clouds out of `origin`, pushed opposite to the carrier's
/// velocity. Returns how many spawned.
pub fn spawn_cloud_burst(
    emitter: &mut ParticleEmitter<CloudPuff>,
    rng: &mut impl Rng,
    origin: Vec2,
    carrier_velocity: Vec2,
    count: usize,
) -> usize {
    let mut spawned = 0;
    for _ in 0..count {
        // Uniform point in a 4x2 ellipse.
        let angle: f32 = rng.gen_range(0.0..TAU);
        let radius = rng.gen::<f32>().sqrt();
        let mut velocity = Vec2::new(angle.cos() * 4.0, angle.sin() * 2.0) * radius;
        velocity.y -= carrier_velocity.y * 0.8;
        velocity.x -= carrier_velocity.x * 0.4;

        let scale: f32 = rng.gen_range(0.5..2.0);
        let rotation: f32 = rng.gen_range(0.0..TAU);
        let rotation_speed: f32 = rng.gen_range(-0.1..0.1);

        let ok = emitter.spawn(|puff| {
            puff.position = origin;
            puff.velocity = velocity;
            puff.scale = scale;
            puff.rotation = rotation;
            puff.rotation_speed = rotation_speed;
        });
        if !ok {
            break;
        }
        spawned += 1;
    }
    spawned
}
