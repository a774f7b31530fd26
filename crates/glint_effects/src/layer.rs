//! # Effect Layers
//!
//! A layer is anything the context updates and draws once per frame:
//! particle emitters, and whatever the host registers itself. The context
//! stores them as trait objects and hands back typed [`LayerId`]s for
//! later access.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use glint_core::TickStats;

use crate::config::EffectsConfig;
use crate::draw::DrawTarget;

/// Per-layer counters for one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayerStats {
    /// Entries updated.
    pub updated: u32,
    /// Entries retired and returned to their pool.
    pub removed: u32,
    /// Entries drawn.
    pub drawn: u32,
    /// Records skipped because no handler serves their type.
    pub skipped: u32,
    /// Entries that failed (error or panic) and were skipped.
    pub failures: u32,
}

impl LayerStats {
    /// Sums two sets of counters.
    #[must_use]
    pub const fn merged(self, other: Self) -> Self {
        Self {
            updated: self.updated + other.updated,
            removed: self.removed + other.removed,
            drawn: self.drawn + other.drawn,
            skipped: self.skipped + other.skipped,
            failures: self.failures + other.failures,
        }
    }

    /// Update-phase counters of an active list pass.
    #[must_use]
    pub const fn from_update(stats: TickStats) -> Self {
        Self {
            updated: stats.updated,
            removed: stats.removed,
            drawn: 0,
            skipped: 0,
            failures: stats.update_failures,
        }
    }

    /// Draw-phase counters of an active list pass.
    #[must_use]
    pub const fn from_draw(stats: TickStats) -> Self {
        Self {
            updated: 0,
            removed: 0,
            drawn: stats.drawn,
            skipped: 0,
            failures: stats.draw_failures,
        }
    }
}

/// Something the context updates and draws every frame.
pub trait EffectLayer: Any {
    /// Name used for config lookups and logs.
    fn name(&self) -> &str;

    /// Update phase.
    fn update(&mut self) -> LayerStats;

    /// Draw phase.
    fn draw(&mut self, target: &mut (dyn DrawTarget + 'static)) -> LayerStats;

    /// Number of live entries.
    fn live_count(&self) -> usize;

    /// Drops every live entry (returning pooled instances).
    fn clear(&mut self);

    /// Rebuilds storage for a new configuration. Live entries are dropped.
    fn reload(&mut self, config: &EffectsConfig);

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Typed handle to a layer registered with the context.
pub struct LayerId<L> {
    index: usize,
    _marker: PhantomData<fn() -> L>,
}

impl<L> LayerId<L> {
    pub(crate) const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Registration index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl<L> Clone for LayerId<L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<L> Copy for LayerId<L> {}

impl<L> PartialEq for LayerId<L> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<L> Eq for LayerId<L> {}

impl<L> fmt::Debug for LayerId<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_counters_split() {
        let tick = TickStats {
            updated: 4,
            removed: 1,
            drawn: 3,
            update_failures: 2,
            draw_failures: 1,
        };
        let update = LayerStats::from_update(tick);
        let draw = LayerStats::from_draw(tick);
        assert_eq!((update.updated, update.drawn, update.failures), (4, 0, 2));
        assert_eq!((draw.updated, draw.drawn, draw.failures), (0, 3, 1));
        assert_eq!(update.merged(draw).failures, 3);
    }

    #[test]
    fn test_layer_id_is_copy() {
        let id: LayerId<String> = LayerId::new(3);
        let copy = id;
        assert_eq!(id, copy);
        assert_eq!(format!("{copy:?}"), "LayerId(3)");
    }
}
