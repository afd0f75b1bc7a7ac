//! Area spawner state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voxterra_core::coords::WorldPos;
use voxterra_world::noise::{hash2, mix64, str_hash};
use voxterra_world::SpawnerRequest;

/// Runs the mob entries of one architecture structure.
///
/// Each entry spawns `initial_count` mobs when the spawner starts and then
/// tops up by one every `interval` seconds while fewer than `max_count` are
/// alive.
#[derive(Debug, Clone)]
pub struct AreaSpawner {
    request: SpawnerRequest,
    timers: Vec<f32>,
    started: bool,
    rng: ChaCha8Rng,
}

impl AreaSpawner {
    pub fn new(seed: u64, request: SpawnerRequest) -> Self {
        let a = request.anchor;
        let base = mix64(seed ^ str_hash(&request.structure_id)) ^ mix64(a.y as u64);
        let rng = ChaCha8Rng::seed_from_u64(hash2(base, a.x, a.z, 0x7370_6177));
        Self {
            timers: vec![0.0; request.mobs.len()],
            request,
            started: false,
            rng,
        }
    }

    pub fn request(&self) -> &SpawnerRequest {
        &self.request
    }

    pub fn anchor(&self) -> WorldPos {
        self.request.anchor
    }

    /// Random voxel inside the inclusive spawn box.
    pub fn sample_position(&mut self) -> WorldPos {
        let (min, max) = (self.request.min, self.request.max);
        WorldPos::new(
            self.rng.gen_range(min.x.min(max.x)..=max.x.max(min.x)),
            self.rng.gen_range(min.y.min(max.y)..=max.y.max(min.y)),
            self.rng.gen_range(min.z.min(max.z)..=max.z.max(min.z)),
        )
    }

    /// Advance timers by `dt` and return how many mobs of each entry to
    /// spawn, given how many of each are currently alive.
    pub fn advance(&mut self, dt: f32, alive: &[u32]) -> Vec<u32> {
        let dt = dt.max(0.0);
        if !self.started {
            self.started = true;
            return self
                .request
                .mobs
                .iter()
                .map(|m| m.initial_count.min(m.max_count))
                .collect();
        }

        let mut out = vec![0; self.request.mobs.len()];
        for (i, mob) in self.request.mobs.iter().enumerate() {
            let live = alive.get(i).copied().unwrap_or(0);
            if mob.interval <= 0.0 || live >= mob.max_count {
                self.timers[i] = 0.0;
                continue;
            }
            self.timers[i] += dt;
            if self.timers[i] >= mob.interval {
                self.timers[i] -= mob.interval;
                out[i] = 1;
            }
        }
        out
    }
}
