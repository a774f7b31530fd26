//! # Memory Management
//!
//! Fixed-capacity storage for the per-frame effect records.
//!
//! ## Design Philosophy
//!
//! All capacity is decided once at startup. During a frame:
//! - No heap allocations once pools are warm
//! - Exhaustion drops the request instead of growing
//! - Predictable, flat latency

mod bitmap;
mod pool;
mod slot_store;

pub use bitmap::{ActiveIds, OccupancyBitmap, SlotId, Word, WORD_BITS};
pub use pool::{ObjectPool, PoolStats, Poolable, Pooled};
pub use slot_store::SlotStore;
