//! # Decal Pool
//!
//! Up to `max_decals` static marks anchored to tiles. Records live in a
//! [`SlotStore`] and each is drawn by the [`DecalRenderer`] registered for
//! its type.
//!
//! ```text
//! DecalPool
//! ├── SlotStore<DecalRecord>     records by slot id
//! │   └── OccupancyBitmap        which slots are live
//! └── TypeRegistry<u16, Box<dyn DecalRenderer>>
//!
//! draw: for each occupied slot (ascending)
//!         inactive       -> skip
//!         unknown type   -> skip
//!         renderer.draw  -> isolated; failure skips this record only
//! ```

use glint_core::{
    isolate, EffectResult, Keyed, KernelResult, Phase, SlotId, SlotStore, TypeRegistry,
};

use crate::draw::{DrawTarget, TextureRegion};
use crate::math::{TilePoint, Vec2};

/// Key selecting a decal renderer.
pub type DecalTypeId = u16;

/// Which part of a sprite sheet a decal uses.
///
/// An all-zero framing means "the whole texture".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FramingData {
    /// Left edge of the frame.
    pub frame_x: u16,
    /// Top edge of the frame.
    pub frame_y: u16,
    /// Frame width.
    pub frame_width: u16,
    /// Frame height.
    pub frame_height: u16,
}

impl FramingData {
    /// Creates framing data.
    #[must_use]
    pub const fn new(frame_x: u16, frame_y: u16, frame_width: u16, frame_height: u16) -> Self {
        Self {
            frame_x,
            frame_y,
            frame_width,
            frame_height,
        }
    }

    /// Source region, or `None` for the whole texture.
    #[must_use]
    pub const fn region(self) -> Option<TextureRegion> {
        if self.frame_width == 0 || self.frame_height == 0 {
            None
        } else {
            Some(TextureRegion::new(
                self.frame_x,
                self.frame_y,
                self.frame_width,
                self.frame_height,
            ))
        }
    }
}

/// One decal, stored by value in its slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecalRecord {
    /// Hidden records keep their slot but are not drawn.
    pub active: bool,
    /// Selects the renderer.
    pub type_id: DecalTypeId,
    /// Anchor tile.
    pub position: TilePoint,
    /// Rotation in radians.
    pub rotation: f32,
    /// Per-axis scale.
    pub scale: Vec2,
    /// Sprite sheet frame.
    pub framing: FramingData,
}

impl DecalRecord {
    /// Active, unrotated, unit-scale decal of `type_id` at `position`.
    #[must_use]
    pub const fn new(type_id: DecalTypeId, position: TilePoint) -> Self {
        Self {
            active: true,
            type_id,
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
            framing: FramingData::new(0, 0, 0, 0),
        }
    }

    /// Sets the rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the sheet frame.
    #[must_use]
    pub const fn with_framing(mut self, framing: FramingData) -> Self {
        self.framing = framing;
        self
    }
}

/// Draws every decal of one type.
pub trait DecalRenderer {
    /// The type this renderer serves.
    fn decal_type(&self) -> DecalTypeId;

    /// Draws one record.
    ///
    /// # Errors
    ///
    /// A failure skips this record for the current frame.
    fn draw(&self, record: &DecalRecord, target: &mut dyn DrawTarget) -> EffectResult<()>;
}

impl Keyed<DecalTypeId> for dyn DecalRenderer {
    fn key(&self) -> DecalTypeId {
        self.decal_type()
    }
}

/// Startup list of decal renderers.
///
/// Applied in order, so a later renderer for the same type replaces an
/// earlier one.
#[derive(Default)]
pub struct DecalManifest {
    renderers: Vec<Box<dyn DecalRenderer>>,
}

impl DecalManifest {
    /// Empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a renderer.
    #[must_use]
    pub fn with(mut self, renderer: impl DecalRenderer + 'static) -> Self {
        self.renderers.push(Box::new(renderer));
        self
    }

    /// Adds an already boxed renderer.
    pub fn push(&mut self, renderer: Box<dyn DecalRenderer>) {
        self.renderers.push(renderer);
    }

    /// Number of entries (duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    /// True when nothing was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    fn into_registry(self) -> TypeRegistry<DecalTypeId, Box<dyn DecalRenderer>> {
        self.renderers
            .into_iter()
            .fold(TypeRegistry::<DecalTypeId, _>::builder(), |builder, renderer| {
                builder.with_keyed(renderer)
            })
            .build()
    }
}

impl std::fmt::Debug for DecalManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.renderers.iter().map(|r| r.decal_type()))
            .finish()
    }
}

/// Counters for one decal draw pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecalDrawStats {
    /// Records drawn.
    pub drawn: u32,
    /// Records whose type has no renderer.
    pub skipped_unknown: u32,
    /// Records hidden with `active = false`.
    pub skipped_inactive: u32,
    /// Records whose renderer failed or panicked.
    pub failed: u32,
}

/// Fixed-capacity decal storage plus the renderers that draw it.
pub struct DecalPool {
    records: SlotStore<DecalRecord>,
    renderers: TypeRegistry<DecalTypeId, Box<dyn DecalRenderer>>,
    last: DecalDrawStats,
}

impl DecalPool {
    /// Creates a pool with `capacity` slots and the renderers in `manifest`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize, manifest: DecalManifest) -> Self {
        let renderers = manifest.into_registry();
        tracing::debug!(capacity, renderers = renderers.len(), "decal pool created");
        Self {
            records: SlotStore::new(capacity),
            renderers,
            last: DecalDrawStats::default(),
        }
    }

    /// Registers a renderer after construction. Returns the one it replaced.
    pub fn register_renderer(
        &mut self,
        renderer: Box<dyn DecalRenderer>,
    ) -> Option<Box<dyn DecalRenderer>> {
        self.renderers.register_keyed(renderer)
    }

    /// Stores `record` in the lowest free slot and marks it active.
    ///
    /// # Errors
    ///
    /// [`glint_core::KernelError::Exhausted`] when every slot is taken;
    /// nothing is stored.
    pub fn add(&mut self, mut record: DecalRecord) -> KernelResult<SlotId> {
        record.active = true;
        self.records.insert(record)
    }

    /// Like [`Self::add`], but silently drops the decal when full.
    pub fn try_add(&mut self, record: DecalRecord) -> Option<SlotId> {
        match self.add(record) {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::trace!(%error, type_id = record.type_id, "decal dropped");
                None
            }
        }
    }

    /// Frees a slot and returns its record.
    ///
    /// # Errors
    ///
    /// Fails if the slot is out of range or not occupied.
    pub fn remove(&mut self, id: SlotId) -> KernelResult<DecalRecord> {
        self.records.remove(id)
    }

    /// Record in an occupied slot.
    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&DecalRecord> {
        self.records.get(id)
    }

    /// Record in an occupied slot, mutably.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut DecalRecord> {
        self.records.get_mut(id)
    }

    /// Shows or hides a decal without freeing its slot.
    ///
    /// # Errors
    ///
    /// Fails if the slot is out of range or not occupied.
    pub fn set_active(&mut self, id: SlotId, active: bool) -> KernelResult<()> {
        self.records.try_get(id)?;
        if let Some(record) = self.records.get_mut(id) {
            record.active = active;
        }
        Ok(())
    }

    /// Draws every active record with a known type, in ascending slot order.
    pub fn draw(&mut self, target: &mut dyn DrawTarget) -> DecalDrawStats {
        let mut stats = DecalDrawStats::default();

        for (id, record) in self.records.iter() {
            if !record.active {
                stats.skipped_inactive += 1;
                continue;
            }
            let Some(renderer) = self.renderers.resolve(record.type_id) else {
                stats.skipped_unknown += 1;
                tracing::trace!(slot = %id, type_id = record.type_id, "no renderer for decal type");
                continue;
            };

            match isolate(Phase::Draw, || renderer.draw(record, target)) {
                Ok(()) => stats.drawn += 1,
                Err(error) => {
                    stats.failed += 1;
                    tracing::debug!(slot = %id, type_id = record.type_id, %error, "decal skipped during draw");
                }
            }
        }

        self.last = stats;
        stats
    }

    /// Occupied slots, ascending.
    pub fn active_ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.records.active_ids()
    }

    /// Occupied slots and their records, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &DecalRecord)> + '_ {
        self.records.iter()
    }

    /// Number of occupied slots.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.records.len()
    }

    /// Total slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Registered renderers.
    #[must_use]
    pub const fn renderers(&self) -> &TypeRegistry<DecalTypeId, Box<dyn DecalRenderer>> {
        &self.renderers
    }

    /// Counters from the last draw.
    #[must_use]
    pub const fn last_stats(&self) -> DecalDrawStats {
        self.last
    }

    /// Frees every slot.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Replaces storage with `capacity` empty slots, keeping renderers.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn resize(&mut self, capacity: usize) {
        self.records = SlotStore::new(capacity);
        self.last = DecalDrawStats::default();
    }
}

impl std::fmt::Debug for DecalPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecalPool")
            .field("capacity", &self.capacity())
            .field("active", &self.active_count())
            .field("renderers", &self.renderers)
            .finish()
    }
}
