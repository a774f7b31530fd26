//! # GLINT Frame Driver
//!
//! Runs the effects context once per rendered frame, always in the same
//! order:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. UPDATE          every layer, registration order                  │
//! │    └─ compaction returns expired particles to their pools           │
//! │                                                                     │
//! │ 2. DRAW DECALS     decal pool (ascending slots), then its layers    │
//! │                                                                     │
//! │ 3. DRAW PARTICLES  layers bound to the particle pass                │
//! │                                                                     │
//! │ 4. DRAW OVERLAY    layers drawn on top of everything                │
//! │                                                                     │
//! │ 5. END FRAME       record timing, warn when over budget             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use glint_effects::{
    DrawTarget, EffectsContext, EffectsResult, HookPoint, LayerStats,
};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Frame time above which a warning is logged.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Configuration for the frame driver.
#[derive(Clone, Debug)]
pub struct FrameDriverConfig {
    /// Frames slower than this are counted as over budget.
    pub frame_budget: Duration,
    /// Frames slower than this are logged at `warn`.
    pub warn_threshold: Duration,
    /// Log frame budget warnings.
    pub enable_timing_logs: bool,
}

impl Default for FrameDriverConfig {
    fn default() -> Self {
        Self {
            frame_budget: TARGET_FRAME_TIME,
            warn_threshold: MAX_FRAME_TIME,
            enable_timing_logs: true,
        }
    }
}

/// Timing and counters for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number, starting at 0.
    pub frame: u64,
    /// Whole frame in microseconds.
    pub total_us: u64,
    /// Update hook in microseconds.
    pub update_us: u64,
    /// Decal hook in microseconds.
    pub decals_us: u64,
    /// Particle hook in microseconds.
    pub particles_us: u64,
    /// Overlay hook in microseconds.
    pub overlay_us: u64,
    /// Update phase counters.
    pub update: LayerStats,
    /// Draw counters over all draw hooks.
    pub draw: LayerStats,
}

/// Owns an [`EffectsContext`] and drives it frame by frame.
pub struct FrameDriver {
    context: EffectsContext,
    config: FrameDriverConfig,
    frame_count: u64,
    last: FrameStats,
    stats_accumulator: FrameStatsAccumulator,
}

impl FrameDriver {
    /// Creates a driver around an initialised context.
    #[must_use]
    pub fn new(context: EffectsContext, config: FrameDriverConfig) -> Self {
        Self {
            context,
            stats_accumulator: FrameStatsAccumulator::new(config.frame_budget),
            config,
            frame_count: 0,
            last: FrameStats::default(),
        }
    }

    /// Runs one full frame into `target`.
    ///
    /// # Errors
    ///
    /// [`glint_effects::EffectsError::NotRunning`] once the context is shut
    /// down. Per-entry failures never surface here; they show up in the
    /// returned counters.
    pub fn run_frame(&mut self, target: &mut (dyn DrawTarget + 'static)) -> EffectsResult<FrameStats> {
        let frame_start = Instant::now();

        let update = self.context.run_update()?;
        let update_us = elapsed_us(frame_start);

        let mut draw = LayerStats::default();
        let mut hook_us = [0u64; 3];
        for (slot, hook) in HookPoint::DRAW.into_iter().enumerate() {
            let hook_start = Instant::now();
            draw = draw.merged(self.context.run_draw(hook, target)?);
            hook_us[slot] = elapsed_us(hook_start);
        }

        let stats = FrameStats {
            frame: self.frame_count,
            total_us: elapsed_us(frame_start),
            update_us,
            decals_us: hook_us[0],
            particles_us: hook_us[1],
            overlay_us: hook_us[2],
            update,
            draw,
        };
        self.end_frame(stats);
        Ok(stats)
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.last = stats;
        self.stats_accumulator.record(stats);

        if stats.update.failures + stats.draw.failures > 0 {
            tracing::debug!(
                frame = stats.frame,
                update_failures = stats.update.failures,
                draw_failures = stats.draw.failures,
                "entries skipped this frame"
            );
        }

        if self.config.enable_timing_logs
            && u128::from(stats.total_us) > self.config.warn_threshold.as_micros()
        {
            tracing::warn!(
                frame = stats.frame,
                frame_us = stats.total_us,
                budget_us = self.stats_accumulator.budget_us,
                "frame exceeded budget"
            );
        }
    }

    /// Shuts the context down. Later frames fail with `NotRunning`.
    pub fn shutdown(&mut self) {
        self.context.shutdown();
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Stats of the last completed frame.
    #[must_use]
    pub const fn last_frame(&self) -> FrameStats {
        self.last
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }

    /// The driven context.
    #[must_use]
    pub const fn context(&self) -> &EffectsContext {
        &self.context
    }

    /// The driven context, mutably (spawning, decal placement, reload).
    pub fn context_mut(&mut self) -> &mut EffectsContext {
        &mut self.context
    }

    /// Consumes the driver and hands the context back.
    #[must_use]
    pub fn into_context(self) -> EffectsContext {
        self.context
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("frame_count", &self.frame_count)
            .field("config", &self.config)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn elapsed_us(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of update hook times.
    pub update_us_sum: u64,
    /// Sum of draw hook times.
    pub draw_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Entries that failed, over all frames.
    pub failures: u64,
    /// Entries drawn, over all frames.
    pub drawn: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator with the given frame budget.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            update_us_sum: 0,
            draw_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            failures: 0,
            drawn: 0,
            budget_us: u64::try_from(budget.as_micros()).unwrap_or(u64::MAX),
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.update_us_sum += stats.update_us;
        self.draw_us_sum += stats.decals_us + stats.particles_us + stats.overlay_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.failures += u64::from(stats.update.failures + stats.draw.failures);
        self.drawn += u64::from(stats.draw.drawn);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a one-line summary at `info`.
    pub fn log_summary(&self) {
        tracing::info!(
            frames = self.frames_recorded,
            avg_ms = format_args!("{:.3}", self.avg_frame_ms()),
            avg_fps = format_args!("{:.1}", self.avg_fps()),
            min_us = if self.frames_recorded == 0 { 0 } else { self.min_frame_us },
            max_us = self.max_frame_us,
            over_budget = self.frames_over_budget,
            drawn = self.drawn,
            failures = self.failures,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new(TARGET_FRAME_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_effects::{DecalManifest, EffectsConfig};

    fn driver() -> FrameDriver {
        let context = EffectsContext::init(EffectsConfig::default(), DecalManifest::new()).unwrap();
        FrameDriver::new(context, FrameDriverConfig::default())
    }

    #[test]
    fn test_driver_creation() {
        let driver = driver();
        assert_eq!(driver.frame_count(), 0);
        assert!(driver.context().is_running());
    }

    #[test]
    fn test_frame_numbers_advance() {
        let mut driver = driver();
        let mut out: Vec<glint_effects::DrawRequest> = Vec::new();

        let first = driver.run_frame(&mut out).unwrap();
        let second = driver.run_frame(&mut out).unwrap();

        assert_eq!((first.frame, second.frame), (0, 1));
        assert_eq!(driver.frame_count(), 2);
        assert_eq!(driver.stats().frames_recorded, 2);
        assert_eq!(driver.context().stats().frames, 2);
    }

    #[test]
    fn test_accumulator_budget() {
        let mut acc = FrameStatsAccumulator::new(Duration::from_micros(100));
        acc.record(FrameStats {
            total_us: 50,
            ..FrameStats::default()
        });
        acc.record(FrameStats {
            total_us: 150,
            ..FrameStats::default()
        });

        assert_eq!(acc.frames_over_budget, 1);
        assert_eq!((acc.min_frame_us, acc.max_frame_us), (50, 150));
        assert!((acc.avg_frame_ms() - 0.1).abs() < 1e-9);
        assert!((acc.over_budget_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = FrameStatsAccumulator::default();
        assert_eq!(acc.avg_fps(), 0.0);
        assert_eq!(acc.over_budget_ratio(), 0.0);
    }
}
