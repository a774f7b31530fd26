//! # Hook Points
//!
//! Named places in the host frame where the effects context runs. The
//! host calls them in this order every frame:
//!
//! ```text
//! Update ──► DrawDecals ──► DrawParticles ──► DrawOverlay
//! ```
//!
//! Layers are bound to one draw hook at registration time; every layer is
//! updated at [`HookPoint::Update`].

use std::fmt;

/// An extension point in the host frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookPoint {
    /// After the host's world update. Every layer updates here.
    Update,
    /// Behind entities, in front of tiles. The decal pool draws here.
    DrawDecals,
    /// With the host's dust/particle pass.
    DrawParticles,
    /// Last, on top of everything.
    DrawOverlay,
}

impl HookPoint {
    /// Draw hooks, in frame order.
    pub const DRAW: [Self; 3] = [Self::DrawDecals, Self::DrawParticles, Self::DrawOverlay];

    /// True for hooks that draw.
    #[must_use]
    pub const fn is_draw(self) -> bool {
        !matches!(self, Self::Update)
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Update => "update",
            Self::DrawDecals => "draw-decals",
            Self::DrawParticles => "draw-particles",
            Self::DrawOverlay => "draw-overlay",
        };
        f.write_str(name)
    }
}
