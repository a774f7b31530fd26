//! # Draw Targets
//!
//! Effects never talk to a GPU. They hand [`DrawRequest`]s to a
//! [`DrawTarget`] supplied by the host, which may batch them, forward
//! them to a sprite renderer, or just record them.

use bytemuck::{Pod, Zeroable};
use glint_core::{EffectError, EffectResult};

use crate::math::{Color, Vec2};

/// Opaque texture handle owned by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Source rectangle inside a texture, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureRegion {
    /// Left edge
    pub x: u16,
    /// Top edge
    pub y: u16,
    /// Width
    pub width: u16,
    /// Height
    pub height: u16,
}

impl TextureRegion {
    /// Creates a region.
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cell `(column, row)` of a sheet split into equal frames.
    #[must_use]
    pub const fn frame(
        sheet_width: u16,
        sheet_height: u16,
        columns: u16,
        rows: u16,
        column: u16,
        row: u16,
    ) -> Self {
        let width = sheet_width / columns;
        let height = sheet_height / rows;
        Self::new(column * width, row * height, width, height)
    }

    /// Center of the region, relative to its top-left corner.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(f32::from(self.width) / 2.0, f32::from(self.height) / 2.0)
    }
}

/// Horizontal/vertical mirroring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpriteFlip {
    /// Draw as-is.
    #[default]
    None,
    /// Mirror around the vertical axis.
    Horizontal,
    /// Mirror around the horizontal axis.
    Vertical,
}

/// A single sprite draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRequest {
    /// Texture to sample.
    pub texture: TextureId,
    /// Screen position of the origin.
    pub position: Vec2,
    /// Source rectangle; `None` draws the whole texture.
    pub region: Option<TextureRegion>,
    /// Tint.
    pub color: Color,
    /// Rotation in radians around `origin`.
    pub rotation: f32,
    /// Pivot in texture pixels.
    pub origin: Vec2,
    /// Per-axis scale.
    pub scale: Vec2,
    /// Mirroring.
    pub flip: SpriteFlip,
}

impl DrawRequest {
    /// Untinted, unrotated, unscaled draw of `texture` at `position`.
    #[must_use]
    pub const fn new(texture: TextureId, position: Vec2) -> Self {
        Self {
            texture,
            position,
            region: None,
            color: Color::WHITE,
            rotation: 0.0,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            flip: SpriteFlip::None,
        }
    }
}

/// Sink accepting draw requests.
pub trait DrawTarget {
    /// Queues or executes one draw.
    ///
    /// # Errors
    ///
    /// Implementations may refuse a request; the caller skips the entry
    /// that issued it.
    fn draw(&mut self, request: &DrawRequest) -> EffectResult<()>;
}

/// Per-instance data for a sprite draw, laid out for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Position (xy) + scale (zw).
    pub position_scale: [f32; 4],
    /// Origin (xy) + rotation (z) + flip mode (w).
    pub origin_rotation_flip: [f32; 4],
    /// Source region x, y, width, height in pixels.
    pub region: [f32; 4],
    /// Tint RGBA, normalized.
    pub color: [f32; 4],
    /// Texture id, whole-texture flag, padding.
    pub texture: [u32; 4],
}

impl SpriteInstance {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Packs a draw request.
    #[must_use]
    pub fn from_request(request: &DrawRequest) -> Self {
        let flip = match request.flip {
            SpriteFlip::None => 0.0,
            SpriteFlip::Horizontal => 1.0,
            SpriteFlip::Vertical => 2.0,
        };
        let (region, whole) = match request.region {
            Some(r) => (
                [
                    f32::from(r.x),
                    f32::from(r.y),
                    f32::from(r.width),
                    f32::from(r.height),
                ],
                0,
            ),
            None => ([0.0; 4], 1),
        };

        Self {
            position_scale: [
                request.position.x,
                request.position.y,
                request.scale.x,
                request.scale.y,
            ],
            origin_rotation_flip: [request.origin.x, request.origin.y, request.rotation, flip],
            region,
            color: request.color.to_f32(),
            texture: [request.texture.0, whole, 0, 0],
        }
    }
}

/// Recording target that packs every request into upload-ready instances.
///
/// The host drains it once per frame (`as_bytes` then `clear`).
#[derive(Debug, Default)]
pub struct SpriteBatch {
    instances: Vec<SpriteInstance>,
    limit: Option<usize>,
}

impl SpriteBatch {
    /// Creates an unbounded batch with room for `capacity` sprites.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            limit: None,
        }
    }

    /// Creates a batch that refuses draws past `limit` sprites.
    #[must_use]
    pub fn bounded(limit: usize) -> Self {
        Self {
            instances: Vec::with_capacity(limit),
            limit: Some(limit),
        }
    }

    /// Recorded instances, in draw order.
    #[must_use]
    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    /// Raw bytes for an instance buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Number of recorded sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Forgets recorded sprites, keeps the allocation.
    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

impl DrawTarget for SpriteBatch {
    fn draw(&mut self, request: &DrawRequest) -> EffectResult<()> {
        if self.limit.is_some_and(|limit| self.instances.len() >= limit) {
            return Err(EffectError::Target(format!(
                "sprite batch full at {} instances",
                self.instances.len()
            )));
        }
        self.instances.push(SpriteInstance::from_request(request));
        Ok(())
    }
}

impl DrawTarget for Vec<DrawRequest> {
    fn draw(&mut self, request: &DrawRequest) -> EffectResult<()> {
        self.push(*request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_batch_packs_requests() {
        let mut batch = SpriteBatch::with_capacity(4);
        let mut request = DrawRequest::new(TextureId(9), Vec2::new(10.0, 20.0));
        request.region = Some(TextureRegion::new(0, 8, 8, 8));
        request.flip = SpriteFlip::Horizontal;
        batch.draw(&request).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.as_bytes().len(), SpriteInstance::SIZE);

        let instance = batch.instances()[0];
        assert_eq!(instance.position_scale, [10.0, 20.0, 1.0, 1.0]);
        assert_eq!(instance.region, [0.0, 8.0, 8.0, 8.0]);
        assert_eq!(instance.texture, [9, 0, 0, 0]);
        assert_eq!(instance.origin_rotation_flip[3], 1.0);
    }

    #[test]
    fn test_bounded_batch_rejects_overflow() {
        let mut batch = SpriteBatch::bounded(1);
        let request = DrawRequest::new(TextureId(0), Vec2::ZERO);
        assert!(batch.draw(&request).is_ok());
        assert!(matches!(batch.draw(&request), Err(EffectError::Target(_))));

        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.draw(&request).is_ok());
    }

    #[test]
    fn test_frame_region() {
        let region = TextureRegion::frame(80, 36, 10, 6, 3, 2);
        assert_eq!(region, TextureRegion::new(24, 12, 8, 6));
        assert_eq!(region.center(), Vec2::new(4.0, 3.0));
    }
}
