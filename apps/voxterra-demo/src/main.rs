//! Voxterra Headless Demo
//!
//! Flies a viewer across procedurally generated terrain without a window:
//! chunks stream in and out around it, a pillar is built and water poured
//! on the way, a ruin is placed, and the world is saved and reloaded at the
//! end.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p voxterra-demo -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--seed <N>`: World generation seed (default: 12345)
//! - `--load-distance <N>`: Load distance in chunks (default: 4)
//! - `--ticks <N>`: Number of simulation ticks (default: 240)
//! - `--save <NAME>`: Save slot written and reloaded at the end (default: demo)
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod params;

use anyhow::Context as _;
use glam::Vec3;
use tracing::{info, warn};
use voxterra_app::{init_logging, run_headless, Engine, EngineConfig, StreamingConfig};
use voxterra_core::coords::WorldPos;
use voxterra_core::types::{Rgba, Voxel};
use voxterra_structure::Rotation;

use crate::params::DemoParams;

const TICK_SECONDS: f32 = 1.0 / 20.0;
const TARGET_TPS: u32 = 240;
/// Horizontal viewer speed in voxels per tick.
const FLY_SPEED: f32 = 2.0;
/// Viewer height above the terrain surface.
const FLY_HEIGHT: i32 = 24;

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    init_logging();
    let params = DemoParams::from_args();
    info!(?params, "starting demo");

    let config = EngineConfig::default()
        .with_seed(params.seed)
        .with_dimension("overworld", "grassland")
        .with_streaming(StreamingConfig::default().with_load_distance(params.load_distance));
    let mut engine = Engine::new(config).context("building engine")?;

    let pillar_tick = params.ticks / 4;
    let water_tick = params.ticks / 2;
    let ruin_tick = params.ticks * 3 / 4;
    let mut pillar_top = None;

    let summary = run_headless(&mut engine, params.ticks, TICK_SECONDS, Some(TARGET_TPS), |engine, tick| {
        let x = tick as f32 * FLY_SPEED;
        let surface = surface_y(engine, x as i64, 0);
        engine.set_viewer_position(Vec3::new(x, (surface + FLY_HEIGHT) as f32, 8.0));

        let ahead = WorldPos::new(x as i64 + 16, 0, 8);
        if tick == pillar_tick {
            let ground = surface_y(engine, ahead.x, ahead.z);
            let top = build_pillar(engine, ahead.x, ground, ahead.z, 6);
            info!(?top, "built pillar");
            pillar_top = Some(top);
        } else if tick == water_tick {
            let ground = surface_y(engine, ahead.x, ahead.z);
            let source = WorldPos::new(ahead.x, i64::from(ground) + 4, ahead.z);
            engine.set_voxel(source, Voxel::liquid(Rgba::new(40, 90, 200, 160)));
            info!(?source, "poured water");
        } else if tick == ruin_tick {
            let ground = surface_y(engine, ahead.x, ahead.z);
            let origin = WorldPos::new(ahead.x, i64::from(ground) + 1, ahead.z);
            match engine.place_structure("watchtower_ruin", origin, Rotation::East) {
                Ok(changed) => info!(?origin, changed, "placed ruin"),
                Err(e) => warn!(error = %e, "could not place ruin"),
            }
        }
    });

    let chunks = engine.active_dimension().map_or(0, |d| d.len());
    info!(
        ticks = summary.ticks,
        loaded = summary.loaded,
        unloaded = summary.unloaded,
        rebuilt = summary.rebuilt,
        water = summary.water_processed,
        mobs = summary.mobs_spawned,
        chunks,
        live_geometry = engine.backend().live_count(),
        triangles = engine.backend().total_triangles(),
        objects = engine.entities().object_count(),
        "fly-through finished"
    );

    let status = engine.save(&params.save);
    if !status.success {
        anyhow::bail!("save failed: {}", status.message);
    }
    let status = engine.load(&params.save);
    if !status.success {
        anyhow::bail!("reload failed: {}", status.message);
    }
    if let Some(top) = pillar_top {
        let kept = engine.get_voxel(top) == pillar_voxel();
        info!(?top, kept, "pillar after reload");
    }

    engine.shutdown();
    Ok(())
}

fn pillar_voxel() -> Voxel {
    Voxel::solid(Rgba::rgb(200, 40, 40))
}

/// Top terrain voxel of a column in the active dimension.
fn surface_y(engine: &Engine, x: i64, z: i64) -> i32 {
    engine
        .active_dimension()
        .map_or(0, |d| d.generator().terrain_height(x, z))
}

/// Stack `height` voxels on the surface; returns the topmost.
fn build_pillar(engine: &mut Engine, x: i64, ground: i32, z: i64, height: i64) -> WorldPos {
    let mut top = WorldPos::new(x, i64::from(ground), z);
    for dy in 1..=height {
        top = WorldPos::new(x, i64::from(ground) + dy, z);
        engine.set_voxel(top, pillar_voxel());
    }
    top
}

fn print_help() {
    eprintln!(
        "Voxterra Headless Demo

USAGE:
    cargo run -p voxterra-demo -- [OPTIONS]

OPTIONS:
    --seed <N>              World generation seed (default: 12345)
    --load-distance <N>     Load distance in chunks (default: 4)
    --ticks <N>             Number of simulation ticks (default: 240)
    --save <NAME>           Save slot written and reloaded at the end (default: demo)
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log level (e.g., info, debug, trace)"
    );
}
