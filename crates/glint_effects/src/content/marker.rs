use glint_core::EffectResult;

use super::MARKER_TEXTURE;
use crate::decal::{DecalRecord, DecalRenderer, DecalTypeId};
use crate::draw::{DrawRequest, DrawTarget};

/// Debug decal (type 0): draws the marker sprite centered on its tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerDecal;

impl MarkerDecal {
    /// Type served.
    pub const TYPE: DecalTypeId = 0;
}

impl DecalRenderer for MarkerDecal {
    fn decal_type(&self) -> DecalTypeId {
        Self::TYPE
    }

    fn draw(&self, record: &DecalRecord, target: &mut dyn DrawTarget) -> EffectResult<()> {
        let mut request = DrawRequest::new(MARKER_TEXTURE, record.position.to_world_center());
        request.region = record.framing.region();
        request.rotation = record.rotation;
        request.scale = record.scale;
        if let Some(region) = request.region {
            request.origin = region.center();
        }
        target.draw(&request)
    }
}
