use std::f32::consts::{FRAC_PI_4, TAU};

use glint_core::{EffectResult, Lifecycle, Particle, Poolable};
use rand::Rng;

use super::{GLOW_SIZE, GLOW_TEXTURE, SPARK_SIZE, SPARK_TEXTURE};
use crate::draw::{DrawRequest, DrawTarget};
use crate::math::{Color, Vec2};
use crate::particle::{ParticleEmitter, ParticleSettings};

/// Speed above which a spark is pulled back toward it.
const MAX_SPEED: f32 = 24.0;

/// A tiny glowing streak thrown off by impacts.
///
/// Shrinks fast while big, then slowly once under `0.1`; heavier sparks
/// linger longer. Dies below `0.01`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spark {
    /// Current position.
    pub position: Vec2,
    /// Velocity per tick.
    pub velocity: Vec2,
    /// Acceleration per tick, before scale damping.
    pub gravity: Vec2,
    /// Body color.
    pub tint: Color,
    /// Additive glow color.
    pub glow: Color,
    /// Weight in `[0, 1]`: slows decay.
    pub mass: f32,
    /// Current size; also the remaining life.
    pub scale: f32,
    /// Trailing end of the streak.
    end_position: Vec2,
}

impl Spark {
    /// Trailing end of the streak.
    #[must_use]
    pub const fn end_position(&self) -> Vec2 {
        self.end_position
    }

    /// Sets position and trail end together.
    pub fn place(&mut self, position: Vec2) {
        self.position = position;
        self.end_position = position;
    }
}

impl Poolable for Spark {
    fn on_acquire(&mut self) {
        *self = Self::default();
    }
}

impl Particle for Spark {
    type Settings = ParticleSettings;
    type Target = dyn DrawTarget;

    fn update(&mut self, _settings: &mut ParticleSettings) -> EffectResult<Lifecycle> {
        self.position += self.velocity;
        self.velocity += self.gravity * (0.5 - self.scale * 0.5);
        if self.velocity.length() > MAX_SPEED {
            let capped = self.velocity.normalize_or(Vec2::ZERO) * MAX_SPEED;
            self.velocity = self.velocity.lerp(capped, 0.4);
        }

        let mut trail_catch_up = 0.2;
        if self.scale < 0.1 {
            self.scale *= 0.9 + self.mass.clamp(0.0, 1.0) * 0.01;
            trail_catch_up = 0.5;
        } else {
            self.scale *= 0.4 + (self.mass * 0.5).clamp(0.0, 0.5);
        }

        self.end_position = self
            .end_position
            .lerp(self.position - self.velocity, trail_catch_up);

        if self.scale < 0.01 {
            Ok(Lifecycle::Expired)
        } else {
            Ok(Lifecycle::Alive)
        }
    }

    fn draw(&self, settings: &ParticleSettings, target: &mut Self::Target) -> EffectResult<()> {
        // Snap heading to one of 8 directions.
        let heading = (self.position - self.end_position).angle();
        let rotation = (heading / TAU * 8.0).round() / 8.0 * TAU;
        let fade = (self.scale / 0.05).clamp(0.0, 1.0);

        let snapped = Vec2::new(
            (self.position.x / 2.0).round() * 2.0,
            (self.position.y / 2.0).round() * 2.0,
        );
        let position = snapped + settings.anchor_position;
        let length = self.position.distance(self.end_position);
        let stretch = Vec2::new(1.1 + length * 0.15, 1.0) * (1.0 + self.mass * 0.01);

        let mut body = DrawRequest::new(SPARK_TEXTURE, position);
        body.color = self.tint.scaled(fade);
        body.rotation = rotation;
        body.origin = SPARK_SIZE * 0.5;
        body.scale = stretch;
        target.draw(&body)?;

        let mut glow = DrawRequest::new(GLOW_TEXTURE, position);
        glow.color = self.glow.with_alpha(0).scaled(fade);
        glow.rotation = rotation;
        glow.origin = GLOW_SIZE * 0.5;
        glow.scale = Vec2::new(0.06 * stretch.x, 0.12 * stretch.y);
        target.draw(&glow)
    }
}

/// Throws `count` sparks back against `direction`, each within 45 degrees
/// of the reversed heading at 3-7 px per tick. Returns how many spawned.
pub fn spawn_spark_burst(
    emitter: &mut ParticleEmitter<Spark>,
    rng: &mut impl Rng,
    origin: Vec2,
    direction: Vec2,
    count: usize,
) -> usize {
    let heading = direction.normalize_or(Vec2::ZERO);
    let mut spawned = 0;
    for _ in 0..count {
        let spread: f32 = rng.gen_range(-FRAC_PI_4..=FRAC_PI_4);
        let speed: f32 = rng.gen_range(3.0..7.0);
        let scale: f32 = rng.gen_range(0.9..1.1);
        let ok = emitter.spawn(|spark| {
            spark.place(origin);
            spark.velocity = -(heading.rotated(spread) * speed);
            spark.gravity = Vec2::Y;
            spark.tint = Color::YELLOW;
            spark.glow = Color::RED;
            spark.mass = 0.2;
            spark.scale = scale;
        });
        if !ok {
            break;
        }
        spawned += 1;
    }
    spawned
}
