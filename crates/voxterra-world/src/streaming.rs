//! Chunk streaming around a viewer.
//!
//! Each tick the streamer applies finished meshes, unloads chunks that left
//! the desired set (farthest first), loads chunks that entered it (nearest
//! first) and schedules rebuilds of dirty chunks, all under per-tick budgets.
//! The desired set is recomputed only when the viewer's chunk changes or a
//! refresh is forced.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use hashbrown::HashSet;
use tracing::{debug, error, trace, warn};
use voxterra_core::coords::ChunkPos;
use voxterra_core::math::Frustum;
use voxterra_mesh::{
    apply_mesh, build_mesh, release_geometry, GeometryBackend, MeshJob, MeshScheduler, MeshStrategy,
    MeshWorkResult,
};

use crate::dimension::Dimension;

/// Priority entry for chunk loading queue.
#[derive(Debug, Clone, Copy)]
struct LoadPriority {
    pos: ChunkPos,
    /// Squared distance to the viewer's chunk (lower = higher priority).
    distance_sq: i64,
}

impl PartialEq for LoadPriority {
    fn eq(&self, other: &Self) -> bool {
        self.distance_sq == other.distance_sq
    }
}

impl Eq for LoadPriority {}

impl PartialOrd for LoadPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LoadPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (closer chunks have higher priority)
        other.distance_sq.cmp(&self.distance_sq)
    }
}

/// Configuration for chunk streaming behavior.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Load radius in chunks (Euclidean, chunk space).
    pub load_distance: f32,
    /// Lowest chunk Y ever loaded.
    pub min_chunk_y: i32,
    /// Highest chunk Y ever loaded.
    pub max_chunk_y: i32,
    /// Maximum chunks generated per tick.
    pub max_loads_per_tick: usize,
    /// Maximum chunks unloaded per tick.
    pub max_unloads_per_tick: usize,
    /// Maximum mesh rebuilds scheduled (or run) per tick.
    pub max_rebuilds_per_tick: usize,
    /// Drop chunks outside the viewer frustum from the desired set.
    pub frustum_culling: bool,
    /// World units the chunk box is grown by before the frustum test.
    pub frustum_padding: f32,
    pub mesh_strategy: MeshStrategy,
    /// Mesh on a worker thread instead of inside `update`.
    pub async_meshing: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_distance: 6.0,
            min_chunk_y: -1,
            max_chunk_y: 8,
            max_loads_per_tick: 8,
            max_unloads_per_tick: 16,
            max_rebuilds_per_tick: 8,
            frustum_culling: false,
            frustum_padding: 16.0,
            mesh_strategy: MeshStrategy::Greedy,
            async_meshing: true,
        }
    }
}

impl StreamingConfig {
    pub fn with_load_distance(mut self, chunks: f32) -> Self {
        self.load_distance = chunks.max(0.0);
        self
    }

    pub fn with_vertical_range(mut self, min_chunk_y: i32, max_chunk_y: i32) -> Self {
        self.min_chunk_y = min_chunk_y.min(max_chunk_y);
        self.max_chunk_y = max_chunk_y.max(min_chunk_y);
        self
    }

    /// Set the per-tick load, unload and rebuild budgets.
    pub fn with_budgets(mut self, loads: usize, unloads: usize, rebuilds: usize) -> Self {
        self.max_loads_per_tick = loads;
        self.max_unloads_per_tick = unloads;
        self.max_rebuilds_per_tick = rebuilds;
        self
    }

    pub fn with_frustum_culling(mut self, enabled: bool, padding: f32) -> Self {
        self.frustum_culling = enabled;
        self.frustum_padding = padding;
        self
    }

    pub fn with_mesh_strategy(mut self, strategy: MeshStrategy) -> Self {
        self.mesh_strategy = strategy;
        self
    }

    pub fn with_async_meshing(mut self, enabled: bool) -> Self {
        self.async_meshing = enabled;
        self
    }
}

/// Where the streamer centers its desired set.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub position: Vec3,
    pub frustum: Option<Frustum>,
}

impl Viewer {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            frustum: None,
        }
    }

    #[must_use]
    pub fn with_frustum(mut self, frustum: Frustum) -> Self {
        self.frustum = Some(frustum);
        self
    }
}

/// What one streaming tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamingReport {
    pub loaded: usize,
    pub unloaded: usize,
    /// Meshes applied to chunks this tick.
    pub rebuilt: usize,
    /// Desired chunks still waiting to load.
    pub pending_loads: usize,
    pub in_flight_meshes: usize,
}

/// Loads, unloads and remeshes chunks around an injected viewer.
pub struct ChunkStreamer {
    config: StreamingConfig,
    viewer: Option<Viewer>,
    load_queue: BinaryHeap<LoadPriority>,
    desired: HashSet<ChunkPos>,
    last_center: Option<ChunkPos>,
    refresh: bool,
    /// Background mesher; `None` runs meshing inside `update`.
    scheduler: Option<MeshScheduler>,
}

impl std::fmt::Debug for ChunkStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStreamer")
            .field("config", &self.config)
            .field("viewer", &self.viewer)
            .field("desired", &self.desired.len())
            .field("pending", &self.load_queue.len())
            .field("async", &self.scheduler.is_some())
            .finish_non_exhaustive()
    }
}

impl ChunkStreamer {
    /// Create a streamer. With `async_meshing` set, a mesh worker thread is
    /// spawned; if that fails the streamer meshes synchronously.
    pub fn new(config: StreamingConfig) -> Self {
        let scheduler = if config.async_meshing {
            match MeshScheduler::spawn(config.mesh_strategy) {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    warn!(error = %e, "failed to spawn mesh worker, meshing synchronously");
                    None
                }
            }
        } else {
            None
        };
        Self {
            config,
            viewer: None,
            load_queue: BinaryHeap::new(),
            desired: HashSet::new(),
            last_center: None,
            refresh: false,
            scheduler,
        }
    }

    /// Check if meshing runs on a worker thread.
    pub fn is_async(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Get the streaming configuration.
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Register the viewer the desired set follows.
    pub fn set_viewer(&mut self, viewer: Viewer) {
        self.viewer = Some(viewer);
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    /// Recompute the desired set on the next tick even if the viewer stayed
    /// in the same chunk.
    pub fn force_refresh(&mut self) {
        self.refresh = true;
    }

    /// Get the number of chunks waiting to be loaded.
    pub fn pending_count(&self) -> usize {
        self.load_queue.len()
    }

    /// Get the number of mesh jobs on the worker.
    pub fn in_flight_count(&self) -> usize {
        self.scheduler.as_ref().map_or(0, MeshScheduler::in_flight)
    }

    /// Whether a chunk is in the current desired set.
    pub fn is_desired(&self, pos: ChunkPos) -> bool {
        self.desired.contains(&pos)
    }

    /// Check if the viewer has moved to a different chunk.
    fn center_changed(&self, new_center: ChunkPos) -> bool {
        match self.last_center {
            Some(old) => old != new_center,
            None => true,
        }
    }

    /// Recompute the desired set and rebuild the load queue around `center`.
    fn rebuild_desired(&mut self, center: ChunkPos, viewer: &Viewer, dimension: &Dimension) {
        self.desired.clear();
        self.load_queue.clear();

        let r = self.config.load_distance;
        let ri = r.ceil() as i32;
        let r_sq = f64::from(r) * f64::from(r);
        let frustum = viewer.frustum.filter(|_| self.config.frustum_culling);

        for dy in -ri..=ri {
            let y = center.y + dy;
            if y < self.config.min_chunk_y || y > self.config.max_chunk_y {
                continue;
            }
            for dz in -ri..=ri {
                for dx in -ri..=ri {
                    let pos = ChunkPos::new(center.x + dx, y, center.z + dz);
                    let distance_sq = pos.distance_sq(center);
                    if distance_sq as f64 > r_sq {
                        continue;
                    }
                    // The viewer's immediate surroundings stay loaded whatever it faces.
                    if let Some(frustum) = &frustum {
                        let aabb = pos.world_aabb().expanded(self.config.frustum_padding);
                        if distance_sq > 2 && !frustum.test_aabb(&aabb) {
                            continue;
                        }
                    }
                    self.desired.insert(pos);
                    if !dimension.contains(pos) {
                        self.load_queue.push(LoadPriority { pos, distance_sq });
                    }
                }
            }
        }
        debug!(
            ?center,
            desired = self.desired.len(),
            queued = self.load_queue.len(),
            "rebuilt desired set"
        );
    }

    /// Unload chunks outside the desired set, farthest first.
    fn unload_distant(
        &mut self,
        center: ChunkPos,
        dimension: &mut Dimension,
        backend: &mut dyn GeometryBackend,
    ) -> usize {
        let mut candidates: Vec<_> = dimension
            .positions()
            .into_iter()
            .filter(|pos| !self.desired.contains(pos))
            .collect();
        candidates.sort_unstable_by_key(|pos| std::cmp::Reverse((pos.distance_sq(center), *pos)));
        candidates.truncate(self.config.max_unloads_per_tick);

        let mut unloaded = 0;
        for pos in candidates {
            // A job reading this chunk's snapshot finishes before the chunk goes away.
            if let Some(scheduler) = self.scheduler.as_mut() {
                if scheduler.is_in_flight(pos) {
                    scheduler.wait_for(pos);
                }
            }
            if let Some(mut chunk) = dimension.unload_chunk(pos) {
                release_geometry(&mut chunk, backend);
                unloaded += 1;
            }
        }
        unloaded
    }

    /// Generate queued chunks, nearest first.
    fn load_pending(&mut self, dimension: &mut Dimension) -> usize {
        let mut loaded = 0;
        while loaded < self.config.max_loads_per_tick {
            let Some(entry) = self.load_queue.pop() else {
                break;
            };
            if !dimension.contains(entry.pos) {
                dimension.get_or_create_chunk(entry.pos);
                loaded += 1;
            }
        }
        loaded
    }

    fn apply_results(
        results: Vec<MeshWorkResult>,
        dimension: &mut Dimension,
        backend: &mut dyn GeometryBackend,
    ) -> usize {
        let mut rebuilt = 0;
        for result in results {
            let Some(chunk) = dimension.get_chunk_mut(result.pos) else {
                continue;
            };
            match result.outcome {
                Ok(mesh) => {
                    apply_mesh(chunk, &mesh, result.revision, backend);
                    rebuilt += 1;
                }
                Err(e) => error!(error = %e, pos = ?result.pos, "dropping failed mesh"),
            }
        }
        rebuilt
    }

    /// Dirty loaded chunks to rebuild this tick, nearest first.
    fn rebuild_candidates(&self, center: ChunkPos, dimension: &Dimension) -> Vec<ChunkPos> {
        let mut dirty: Vec<_> = dimension
            .dirty_chunks()
            .into_iter()
            .filter(|&pos| {
                self.scheduler
                    .as_ref()
                    .map_or(true, |s| !s.is_in_flight(pos))
            })
            .collect();
        dirty.sort_unstable_by_key(|pos| (pos.distance_sq(center), *pos));
        dirty.truncate(self.config.max_rebuilds_per_tick);
        dirty
    }

    fn schedule_rebuilds(
        &mut self,
        center: ChunkPos,
        dimension: &mut Dimension,
        backend: &mut dyn GeometryBackend,
    ) -> usize {
        let candidates = self.rebuild_candidates(center, dimension);
        if candidates.is_empty() {
            return 0;
        }

        if let Some(scheduler) = self.scheduler.as_mut() {
            let jobs: Vec<_> = candidates
                .into_iter()
                .filter_map(|pos| {
                    let revision = dimension.get_chunk(pos)?.revision();
                    let input = dimension.mesh_input(pos)?;
                    Some(MeshJob { input, revision })
                })
                .collect();
            let rejected = scheduler.submit(jobs);
            if !rejected.is_empty() {
                trace!(count = rejected.len(), "mesh jobs deferred to next tick");
            }
            return 0;
        }

        let mut rebuilt = 0;
        for pos in candidates {
            let Some(input) = dimension.mesh_input(pos) else {
                continue;
            };
            let mesh = build_mesh(&input, self.config.mesh_strategy);
            if let Some(chunk) = dimension.get_chunk_mut(pos) {
                let revision = chunk.revision();
                apply_mesh(chunk, &mesh, revision, backend);
                rebuilt += 1;
            }
        }
        rebuilt
    }

    /// Advance streaming by one tick.
    pub fn update(&mut self, dimension: &mut Dimension, backend: &mut dyn GeometryBackend) -> StreamingReport {
        let mut report = StreamingReport::default();

        if let Some(scheduler) = self.scheduler.as_mut() {
            let results = scheduler.poll();
            report.rebuilt += Self::apply_results(results, dimension, backend);
        }

        let Some(viewer) = self.viewer else {
            report.in_flight_meshes = self.in_flight_count();
            return report;
        };
        let center = ChunkPos::containing(viewer.position);

        if self.refresh || self.center_changed(center) {
            self.rebuild_desired(center, &viewer, dimension);
            self.last_center = Some(center);
            self.refresh = false;
        }

        report.unloaded = self.unload_distant(center, dimension, backend);
        report.loaded = self.load_pending(dimension);
        report.rebuilt += self.schedule_rebuilds(center, dimension, backend);
        report.pending_loads = self.load_queue.len();
        report.in_flight_meshes = self.in_flight_count();

        trace!(?report, "streaming tick");
        report
    }

    /// Wait for every outstanding mesh job and apply the results.
    pub fn drain(&mut self, dimension: &mut Dimension, backend: &mut dyn GeometryBackend) -> usize {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return 0;
        };
        let results = scheduler.drain();
        Self::apply_results(results, dimension, backend)
    }

    /// Forget the desired set and queue, e.g. after switching dimension.
    ///
    /// Outstanding mesh jobs are discarded after completing.
    pub fn reset(&mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.drain();
        }
        self.desired.clear();
        self.load_queue.clear();
        self.last_center = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{FlatGenerator, GeneratorSettings};
    use glam::Mat4;
    use voxterra_core::coords::WorldPos;
    use voxterra_core::types::{Rgba, Voxel};
    use voxterra_mesh::RecordingBackend;

    fn flat() -> Dimension {
        Dimension::new("flat", Box::new(FlatGenerator::new(1, &GeneratorSettings::default())))
    }

    fn sync_config() -> StreamingConfig {
        StreamingConfig::default()
            .with_load_distance(2.0)
            .with_vertical_range(0, 4)
            .with_budgets(1000, 1000, 1000)
            .with_async_meshing(false)
    }

    #[test]
    fn load_priority_ordering() {
        let mut heap = BinaryHeap::new();
        for (x, d) in [(10, 100), (1, 1), (5, 25)] {
            heap.push(LoadPriority {
                pos: ChunkPos::new(x, 0, 0),
                distance_sq: d,
            });
        }

        // Closest should come first
        assert_eq!(heap.pop().unwrap().distance_sq, 1);
        assert_eq!(heap.pop().unwrap().distance_sq, 25);
        assert_eq!(heap.pop().unwrap().distance_sq, 100);
    }

    #[test]
    fn no_viewer_no_work() {
        let mut streamer = ChunkStreamer::new(sync_config());
        let mut dim = flat();
        let report = streamer.update(&mut dim, &mut RecordingBackend::new());
        assert_eq!(report, StreamingReport::default());
        assert!(dim.is_empty());
    }

    #[test]
    fn loads_a_sphere_and_meshes_it() {
        let mut streamer = ChunkStreamer::new(sync_config());
        let mut dim = flat();
        let mut backend = RecordingBackend::new();
        streamer.set_viewer(Viewer::at(Vec3::new(8.0, 40.0, 8.0)));

        let report = streamer.update(&mut dim, &mut backend);
        // Radius 2 around (0, 2, 0): 33 chunks, all inside the vertical range.
        assert_eq!(report.loaded, 33);
        assert_eq!(report.pending_loads, 0);
        assert!(report.rebuilt > 0);
        assert!(dim.positions().iter().all(|p| p.distance_sq(ChunkPos::new(0, 2, 0)) <= 4));

        // Nothing left to do once everything is loaded and clean.
        streamer.update(&mut dim, &mut backend);
        let idle = streamer.update(&mut dim, &mut backend);
        assert_eq!((idle.loaded, idle.unloaded, idle.rebuilt), (0, 0, 0));
        assert!(dim.dirty_chunks().is_empty());
    }

    #[test]
    fn budgets_bound_each_tick() {
        let config = sync_config().with_budgets(5, 1000, 3);
        let mut streamer = ChunkStreamer::new(config);
        let mut dim = flat();
        let mut backend = RecordingBackend::new();
        streamer.set_viewer(Viewer::at(Vec3::new(8.0, 40.0, 8.0)));

        let report = streamer.update(&mut dim, &mut backend);
        assert_eq!(report.loaded, 5);
        assert_eq!(report.pending_loads, 28);
        assert!(report.rebuilt <= 3);
        // The nearest chunk is loaded first.
        assert!(dim.contains(ChunkPos::new(0, 2, 0)));
    }

    #[test]
    fn moving_away_unloads_farthest_first() {
        let config = sync_config().with_budgets(1000, 4, 1000);
        let mut streamer = ChunkStreamer::new(config);
        let mut dim = flat();
        let mut backend = RecordingBackend::new();
        streamer.set_viewer(Viewer::at(Vec3::new(8.0, 40.0, 8.0)));
        streamer.update(&mut dim, &mut backend);
        let live = backend.live_count();
        assert!(live > 0);

        streamer.set_viewer(Viewer::at(Vec3::new(8.0 + 16.0 * 3.0, 40.0, 8.0)));
        let report = streamer.update(&mut dim, &mut backend);
        assert_eq!(report.unloaded, 4);
        // The chunks farthest from the new center, on the -X side, went first.
        assert!(!dim.contains(ChunkPos::new(-2, 2, 0)));
        assert!(backend.released_count() > 0);
    }

    #[test]
    fn edits_trigger_rebuilds() {
        let mut streamer = ChunkStreamer::new(sync_config());
        let mut dim = flat();
        let mut backend = RecordingBackend::new();
        streamer.set_viewer(Viewer::at(Vec3::new(8.0, 40.0, 8.0)));
        streamer.update(&mut dim, &mut backend);
        streamer.update(&mut dim, &mut backend);

        dim.set_voxel(WorldPos::new(4, 33, 4), Voxel::solid(Rgba::RED));
        let report = streamer.update(&mut dim, &mut backend);
        assert_eq!(report.rebuilt, 1);
    }

    #[test]
    fn desired_set_only_changes_with_center() {
        let mut streamer = ChunkStreamer::new(sync_config());
        let mut dim = flat();
        let mut backend = RecordingBackend::new();
        streamer.set_viewer(Viewer::at(Vec3::new(8.0, 40.0, 8.0)));
        streamer.update(&mut dim, &mut backend);

        // Turn the viewer around inside the same chunk: nothing is recomputed
        // even though frustum culling would now exclude chunks.
        streamer.config.frustum_culling = true;
        let proj = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(8.0, 40.0, 8.0), Vec3::new(100.0, 40.0, 8.0), Vec3::Y);
        streamer.set_viewer(
            Viewer::at(Vec3::new(9.0, 41.0, 9.0)).with_frustum(Frustum::from_view_projection(proj * view)),
        );
        let report = streamer.update(&mut dim, &mut backend);
        assert_eq!(report.unloaded, 0);

        streamer.force_refresh();
        let report = streamer.update(&mut dim, &mut backend);
        assert!(report.unloaded > 0);
        assert!(dim.contains(ChunkPos::new(2, 2, 0)));
        assert!(!dim.contains(ChunkPos::new(-2, 2, 0)));
    }

    #[test]
    fn async_meshing_eventually_cleans_everything() {
        let config = sync_config().with_async_meshing(true);
        let mut streamer = ChunkStreamer::new(config);
        let mut dim = flat();
        let mut backend = RecordingBackend::new();
        streamer.set_viewer(Viewer::at(Vec3::new(8.0, 40.0, 8.0)));

        for _ in 0..200 {
            streamer.update(&mut dim, &mut backend);
            if dim.len() == 33 && dim.dirty_chunks().is_empty() && streamer.in_flight_count() == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        streamer.drain(&mut dim, &mut backend);
        assert!(streamer.is_async());
        assert_eq!(dim.len(), 33);
        assert_eq!(streamer.in_flight_count(), 0);
        assert_eq!(backend.live_count(), 33);
    }
}
