//! # Effects Soak
//!
//! Runs the reference effects for a fixed number of frames with periodic
//! bursts and decal placement, then logs pool and frame statistics.
//!
//! ```text
//! effects_soak [CONFIG.toml] [FRAMES]
//! ```
//!
//! Without arguments it loads `config/effects.toml` from the crate and runs
//! 3600 frames (one minute at 60 FPS, unthrottled).

use std::path::PathBuf;
use std::process::ExitCode;

use glint::effects::content::{self, EffectRng, ReferenceLayers};
use glint::effects::{
    DecalRecord, EffectsConfig, EffectsContext, EffectsError, EffectsResult, SpriteBatch,
    TilePoint, Vec2,
};
use glint::frame_loop::{FrameDriver, FrameDriverConfig};
use glint::logging;

/// Frames run when no count is given.
const DEFAULT_FRAMES: u64 = 3600;

/// Seed for every spawner.
const SEED: u64 = 0x6C69_6E74;

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "soak run failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> EffectsResult<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map_or_else(
        || PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/effects.toml"),
        PathBuf::from,
    );
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| EffectsError::InvalidConfig(format!("frame count {raw:?}: {e}")))?,
        None => DEFAULT_FRAMES,
    };

    let config = EffectsConfig::from_toml_file(&config_path)?;
    let mut context = EffectsContext::init(config, content::reference_manifest())?;
    let layers = content::register_reference_effects(&mut context)?;

    let mut driver = FrameDriver::new(context, FrameDriverConfig::default());
    let mut rng = content::effect_rng(SEED);
    let mut batch = SpriteBatch::with_capacity(4096);

    tracing::info!(frames, config = %config_path.display(), "soak started");

    for frame in 0..frames {
        spawn_frame_effects(driver.context_mut(), layers, &mut rng, frame)?;
        batch.clear();
        driver.run_frame(&mut batch)?;

        if frame % 600 == 599 {
            let context = driver.context();
            tracing::info!(
                frame,
                sprites = batch.len(),
                live_particles = context.live_particles(),
                decals = context.decals().active_count(),
                "soak progress"
            );
        }
    }

    driver.stats().log_summary();
    report_pools(driver.context(), layers)?;
    driver.shutdown();
    Ok(())
}

/// Sparks every 10 frames, a cloud burst every 30, a flame every frame and
/// a decal every 5. Once the pools fill, requests are dropped.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn spawn_frame_effects(
    context: &mut EffectsContext,
    layers: ReferenceLayers,
    rng: &mut EffectRng,
    frame: u64,
) -> EffectsResult<()> {
    let t = frame as f32 / 60.0;
    let origin = Vec2::new(400.0 + t.sin() * 200.0, 300.0);

    if frame % 10 == 0 {
        let sparks = context.layer_mut(layers.sparks)?;
        content::spawn_spark_burst(sparks, rng, origin, Vec2::from_angle(t), 5);
    }
    if frame % 30 == 0 {
        let clouds = context.layer_mut(layers.clouds)?;
        content::spawn_cloud_burst(clouds, rng, origin, Vec2::new(0.0, 6.0), 15);
    }

    let flames = context.layer_mut(layers.flames)?;
    content::spawn_flame(flames, rng, origin, Vec2::new(0.5, -1.0), 1.0);

    if frame % 5 == 0 {
        let x = (frame / 5 % 512) as i32;
        let record = DecalRecord::new(content::MarkerDecal::TYPE, TilePoint::new(x, 20));
        context.place_decal(record)?;
    }
    Ok(())
}

fn report_pools(context: &EffectsContext, layers: ReferenceLayers) -> EffectsResult<()> {
    let sparks = context.layer(layers.sparks)?.pool_stats();
    let clouds = context.layer(layers.clouds)?.pool_stats();
    let flames = context.layer(layers.flames)?.pool_stats();

    tracing::info!(
        requested = sparks.requested,
        reused = sparks.reused,
        dropped = sparks.dropped,
        "spark pool"
    );
    tracing::info!(
        requested = clouds.requested,
        reused = clouds.reused,
        dropped = clouds.dropped,
        "cloud pool"
    );
    tracing::info!(
        requested = flames.requested,
        reused = flames.reused,
        dropped = flames.dropped,
        "flame pool"
    );
    tracing::info!(
        decals = context.decals().active_count(),
        capacity = context.decals().capacity(),
        "decal pool"
    );
    Ok(())
}
