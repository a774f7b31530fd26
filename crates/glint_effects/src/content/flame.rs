use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glint_core::{EffectError, EffectResult, Lifecycle, Particle, Poolable};
use rand::Rng;

use super::{FLAME_SHEET, FLAME_TEXTURE};
use crate::draw::{DrawRequest, DrawTarget, SpriteFlip, TextureRegion};
use crate::math::{Color, Vec2};
use crate::particle::{ParticleEmitter, ParticleSettings};

/// Progress columns in the flame sheet.
const FRAME_COUNT: u16 = 10;
/// Rows in the flame sheet: three shapes, then their glows.
const SHEET_ROWS: u16 = 6;
/// Default lifetime in ticks.
pub const DEFAULT_FLAME_LIFETIME: u32 = 20;
/// Default fraction of velocity lost per tick.
pub const DEFAULT_FLAME_LOSS: f32 = 0.15;

/// A short-lived flame lick that plays through a sprite sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Flame {
    /// Current position.
    pub position: Vec2,
    /// Velocity per tick.
    pub velocity: Vec2,
    /// Outer color.
    pub tint: Color,
    /// Inner glow color.
    pub inside_tint: Color,
    /// Base size.
    pub scale: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Fraction of velocity lost per tick.
    pub loss_per_frame: f32,
    /// Ticks lived.
    pub lifetime: u32,
    /// Ticks until expiry.
    pub max_lifetime: u32,
    /// Sheet row `0..6`; `> 3` also mirrors the sprite.
    pub variant: u8,
}

impl Flame {
    /// Fraction of life used, `0..=1`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.max_lifetime == 0 {
            1.0
        } else {
            (self.lifetime as f32 / self.max_lifetime as f32).min(1.0)
        }
    }
}

impl Poolable for Flame {
    fn on_acquire(&mut self) {
        *self = Self {
            loss_per_frame: DEFAULT_FLAME_LOSS,
            max_lifetime: DEFAULT_FLAME_LIFETIME,
            ..Self::default()
        };
    }
}

impl Particle for Flame {
    type Settings = ParticleSettings;
    type Target = dyn DrawTarget;

    fn update(&mut self, _settings: &mut ParticleSettings) -> EffectResult<Lifecycle> {
        self.position += self.velocity;
        self.velocity *= 1.0 - self.loss_per_frame;
        self.velocity.y -= 0.03;
        self.scale *= 0.99;

        self.lifetime += 1;
        if self.lifetime >= self.max_lifetime {
            Ok(Lifecycle::Expired)
        } else {
            Ok(Lifecycle::Alive)
        }
    }

    fn draw(&self, settings: &ParticleSettings, target: &mut Self::Target) -> EffectResult<()> {
        if self.max_lifetime == 0 {
            return Err(EffectError::Draw("flame spawned without a lifetime".into()));
        }

        let progress = self.progress();
        // progress is within 0..=1
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let column = ((progress * f32::from(FRAME_COUNT)) as u16).min(FRAME_COUNT - 1);
        let shape = u16::from(self.variant % 3);
        let (sheet_width, sheet_height) = FLAME_SHEET;
        let frame = TextureRegion::frame(sheet_width, sheet_height, FRAME_COUNT, SHEET_ROWS, column, shape);
        let glow = TextureRegion::frame(sheet_width, sheet_height, FRAME_COUNT, SHEET_ROWS, column, shape + 3);

        let mut request = DrawRequest::new(FLAME_TEXTURE, self.position + settings.anchor_position);
        request.rotation = self.rotation;
        request.origin = frame.center();
        request.scale = Vec2::splat(self.scale * progress.cbrt());
        request.flip = if self.variant > 3 {
            SpriteFlip::Horizontal
        } else {
            SpriteFlip::None
        };

        request.region = Some(frame);
        request.color = self.tint;
        target.draw(&request)?;

        request.region = Some(glow);
        request.color = self.inside_tint;
        target.draw(&request)
    }
}

/// Spawns one flame moving along `velocity`, its sprite turned to the
/// nearest 45 degrees of its heading. Returns `false` when the pool is
/// exhausted.
pub fn spawn_flame(
    emitter: &mut ParticleEmitter<Flame>,
    rng: &mut impl Rng,
    position: Vec2,
    velocity: Vec2,
    scale: f32,
) -> bool {
    let variant: u8 = rng.gen_range(0..6);
    let rotation = (velocity.angle() / FRAC_PI_4).round() * FRAC_PI_4 + FRAC_PI_2;
    emitter.spawn(|flame| {
        flame.position = position;
        flame.velocity = velocity;
        flame.tint = Color::rgba(255, 140, 40, 255);
        flame.inside_tint = Color::rgba(255, 240, 160, 255);
        flame.scale = scale;
        flame.rotation = rotation;
        flame.loss_per_frame = DEFAULT_FLAME_LOSS;
        flame.max_lifetime = DEFAULT_FLAME_LIFETIME;
        flame.variant = variant;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::effect_rng;
    use crate::layer::EffectLayer;

    fn flame() -> Flame {
        Flame {
            scale: 1.0,
            max_lifetime: 4,
            loss_per_frame: DEFAULT_FLAME_LOSS,
            ..Flame::default()
        }
    }

    #[test]
    fn test_flame_expires_after_max_lifetime() {
        let mut flame = flame();
        let mut settings = ParticleSettings::default();
        for _ in 0..3 {
            assert_eq!(flame.update(&mut settings).unwrap(), Lifecycle::Alive);
        }
        assert_eq!(flame.update(&mut settings).unwrap(), Lifecycle::Expired);
        assert!((flame.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_draw_walks_the_sheet() {
        let mut flame = flame();
        flame.variant = 4;
        flame.lifetime = 2;

        let mut out: Vec<DrawRequest> = Vec::new();
        flame.draw(&ParticleSettings::default(), &mut out).unwrap();

        // Half-way: column 5 of 10, shape 1 and its glow row 4.
        assert_eq!(out[0].region, Some(TextureRegion::new(80, 16, 16, 16)));
        assert_eq!(out[1].region, Some(TextureRegion::new(80, 64, 16, 16)));
        assert_eq!(out[0].flip, SpriteFlip::Horizontal);
    }

    #[test]
    fn test_draw_without_lifetime_fails() {
        let flame = Flame::default();
        let mut out: Vec<DrawRequest> = Vec::new();
        assert!(matches!(
            flame.draw(&ParticleSettings::default(), &mut out),
            Err(EffectError::Draw(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_spawn_flame_sets_lifetime() {
        let mut emitter: ParticleEmitter<Flame> = ParticleEmitter::new("flames", 1, 1);
        let mut rng = effect_rng(3);
        assert!(spawn_flame(&mut emitter, &mut rng, Vec2::ZERO, Vec2::new(1.0, 0.0), 1.0));
        assert!(!spawn_flame(&mut emitter, &mut rng, Vec2::ZERO, Vec2::ZERO, 1.0));
        assert_eq!(emitter.queued_len(), 1);
    }

    #[test]
    fn test_only_variants_above_three_flip() {
        let mut out: Vec<DrawRequest> = Vec::new();
        for variant in 0..6 {
            let mut flame = flame();
            flame.variant = variant;
            flame.draw(&ParticleSettings::default(), &mut out).unwrap();
        }

        let flipped: Vec<bool> = out
            .iter()
            .step_by(2)
            .map(|r| r.flip == SpriteFlip::Horizontal)
            .collect();
        assert_eq!(flipped, vec![false, false, false, false, true, true]);
    }

    #[test]
    fn test_reused_flame_starts_fresh() {
        let mut emitter: ParticleEmitter<Flame> = ParticleEmitter::new("flames", 1, 1);
        let mut rng = effect_rng(4);
        assert!(spawn_flame(&mut emitter, &mut rng, Vec2::new(9.0, 9.0), Vec2::new(1.0, 0.0), 2.0));
        for _ in 0..=DEFAULT_FLAME_LIFETIME {
            EffectLayer::update(&mut emitter);
        }
        assert!(emitter.is_empty());

        let reused = emitter.request().unwrap();
        assert_eq!(
            *reused,
            Flame {
                loss_per_frame: DEFAULT_FLAME_LOSS,
                max_lifetime: DEFAULT_FLAME_LIFETIME,
                ..Flame::default()
            }
        );
    }
}
