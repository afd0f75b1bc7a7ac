//! Logging setup and the headless tick loop.

use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::EnvFilter;
use voxterra_mesh::GeometryBackend;

use crate::engine::{Engine, TickReport};

/// Install the global tracing subscriber, filtered by `RUST_LOG`
/// (default `info`). Calling it twice is harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Totals of a [`run_headless`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub ticks: u64,
    pub loaded: usize,
    pub unloaded: usize,
    pub rebuilt: usize,
    pub water_processed: usize,
    pub mobs_spawned: usize,
    pub elapsed: Duration,
}

impl HeadlessSummary {
    fn add(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.loaded += report.streaming.loaded;
        self.unloaded += report.streaming.unloaded;
        self.rebuilt += report.streaming.rebuilt;
        self.water_processed += report.water_processed;
        self.mobs_spawned += report.mobs_spawned;
    }
}

/// Drive `engine` for `ticks` fixed steps of `dt` seconds.
///
/// `before_tick` runs ahead of every update with the tick index, which is
/// where a host moves the viewer or edits the world. With `target_tps` set
/// the loop sleeps to hold that rate.
pub fn run_headless<B, F>(
    engine: &mut Engine<B>,
    ticks: u64,
    dt: f32,
    target_tps: Option<u32>,
    mut before_tick: F,
) -> HeadlessSummary
where
    B: GeometryBackend,
    F: FnMut(&mut Engine<B>, u64),
{
    let target_tick_time = target_tps
        .filter(|&tps| tps > 0)
        .map(|tps| Duration::from_secs_f64(1.0 / f64::from(tps)));
    let start = Instant::now();
    let mut summary = HeadlessSummary::default();

    for tick in 0..ticks {
        let tick_start = Instant::now();
        before_tick(engine, tick);
        let report = engine.update(dt);
        summary.add(&report);

        if let Some(target) = target_tick_time {
            let spent = tick_start.elapsed();
            if spent < target {
                std::thread::sleep(target - spent);
            }
        }
    }

    summary.elapsed = start.elapsed();
    info!(
        ticks = summary.ticks,
        loaded = summary.loaded,
        rebuilt = summary.rebuilt,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "headless run finished"
    );
    summary
}
