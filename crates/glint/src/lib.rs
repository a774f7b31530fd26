//! # GLINT
//!
//! Pooled decals and particles for a frame-driven host.
//!
//! - [`kernel`] (`glint_core`) - the kernel: occupancy bitmap, slot store, object
//!   pool, active list renderer, type registry
//! - [`effects`] (`glint_effects`) - decal pool, particle emitters, effects context
//! - [`frame_loop`] - runs every hook once per frame, in order
//! - [`logging`] - subscriber setup for binaries
//!
//! ## Example
//!
//! ```rust
//! use glint::frame_loop::{FrameDriver, FrameDriverConfig};
//! use glint::effects::{content, EffectsConfig, EffectsContext, SpriteBatch};
//!
//! let mut context = EffectsContext::init(EffectsConfig::default(), content::reference_manifest())?;
//! content::register_reference_effects(&mut context)?;
//!
//! let mut driver = FrameDriver::new(context, FrameDriverConfig::default());
//! let mut batch = SpriteBatch::with_capacity(256);
//! driver.run_frame(&mut batch)?;
//! assert_eq!(driver.frame_count(), 1);
//! # Ok::<(), glint::effects::EffectsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod frame_loop;
pub mod logging;

pub use glint_core as kernel;
pub use glint_effects as effects;

pub use frame_loop::{FrameDriver, FrameDriverConfig, FrameStats, FrameStatsAccumulator};
