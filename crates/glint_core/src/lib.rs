//! # GLINT Core
//!
//! The pooling kernel behind GLINT's decals and particles:
//! - Bounded record storage with no per-frame heap allocation
//! - O(1) amortized acquire and release
//! - Iteration over *active* records only
//! - Per-type handler dispatch through a small integer key
//!
//! ## Architecture Rules
//!
//! 1. **Fixed capacity** - pools never grow; exhaustion drops the request
//! 2. **Single frame thread** - no locks, correctness comes from phase order
//! 3. **Fault isolation** - one failing entry never aborts a pass
//!
//! ## Example
//!
//! ```rust
//! use glint_core::OccupancyBitmap;
//!
//! let mut slots = OccupancyBitmap::new(2);
//! let a = slots.acquire().unwrap();
//! let b = slots.acquire().unwrap();
//! slots.release(a).unwrap();
//! assert_eq!(slots.acquire().unwrap(), a);
//! assert_eq!(slots.active_ids().collect::<Vec<_>>(), vec![a, b]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod active_list;
pub mod error;
pub mod fault;
pub mod memory;
pub mod registry;

pub use active_list::{ActiveListRenderer, InstanceState, Lifecycle, Particle, TickStats};
pub use error::{EffectError, EffectResult, KernelError, KernelResult, Phase};
pub use fault::isolate;
pub use memory::{
    ActiveIds, ObjectPool, OccupancyBitmap, PoolStats, Poolable, Pooled, SlotId, SlotStore,
};
pub use registry::{Keyed, RegistryBuilder, TypeRegistry};
