//! The engine context.

use std::sync::Arc;

use anyhow::Context as _;
use glam::Vec3;
use tracing::{info, warn};
use voxterra_core::coords::WorldPos;
use voxterra_core::types::{BlockPalette, Voxel};
use voxterra_core::Error;
use voxterra_entity::EntityWorld;
use voxterra_mesh::{release_geometry, GeometryBackend, RecordingBackend};
use voxterra_save::{SaveManager, SaveStatus};
use voxterra_structure::{Rotation, StructureRegistry};
use voxterra_voxel::EntityRecord;
use voxterra_world::{
    ChunkStreamer, Dimension, GeneratorRegistry, GeneratorSettings, StreamingReport, StructurePlacement,
    StructurePlacer, Viewer, WaterSimulator, World,
};

use crate::config::EngineConfig;

/// What one [`Engine::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub streaming: StreamingReport,
    /// Water queue entries settled.
    pub water_processed: usize,
    pub mobs_spawned: usize,
}

/// Owns every engine subsystem; the only writer of world state.
pub struct Engine<B: GeometryBackend = RecordingBackend> {
    config: EngineConfig,
    world: World,
    streamer: ChunkStreamer,
    water: WaterSimulator,
    entities: EntityWorld,
    backend: B,
    saves: SaveManager,
    ticks: u64,
}

impl<B: GeometryBackend> std::fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("world", &self.world)
            .field("streamer", &self.streamer)
            .field("entities", &self.entities)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Engine<RecordingBackend> {
    /// Build an engine that records geometry in memory.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        Self::with_backend(config, RecordingBackend::new())
    }
}

impl<B: GeometryBackend> Engine<B> {
    /// Build registries, the world and the startup dimension.
    pub fn with_backend(config: EngineConfig, backend: B) -> anyhow::Result<Self> {
        let palette = BlockPalette::standard();
        let mut structures = StructureRegistry::with_builtins(&palette);
        if let Some(dir) = &config.structure_dir {
            if let Err(e) = structures.load_dir(dir, &palette) {
                warn!(dir = %dir.display(), error = %e, "structure directory unavailable");
            }
        }
        let settings = GeneratorSettings {
            palette: Arc::new(palette),
            structures: Arc::new(structures),
            terrain: config.terrain.clone(),
            placement: config.placement.clone(),
        };

        let mut world = World::new(config.seed, GeneratorRegistry::with_defaults(settings));
        world
            .create_dimension(&config.dimension_id, &config.generator_id)
            .with_context(|| format!("creating dimension '{}'", config.dimension_id))?;

        info!(
            seed = config.seed,
            dimension = %config.dimension_id,
            generator = %config.generator_id,
            "engine ready"
        );

        Ok(Self {
            streamer: ChunkStreamer::new(config.streaming.clone()),
            water: WaterSimulator::new(config.water),
            entities: EntityWorld::new(config.seed),
            saves: SaveManager::new(config.save.clone()),
            config,
            world,
            backend,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn active_dimension(&self) -> Option<&Dimension> {
        self.world.active_dimension()
    }

    pub fn entities(&self) -> &EntityWorld {
        &self.entities
    }

    pub fn streamer(&self) -> &ChunkStreamer {
        &self.streamer
    }

    pub fn water(&self) -> &WaterSimulator {
        &self.water
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn saves(&self) -> &SaveManager {
        &self.saves
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Register the viewer streaming follows.
    pub fn set_viewer(&mut self, viewer: Viewer) {
        self.streamer.set_viewer(viewer);
    }

    pub fn set_viewer_position(&mut self, position: Vec3) {
        let frustum = self.streamer.viewer().and_then(|v| v.frustum);
        self.streamer.set_viewer(Viewer { position, frustum });
    }

    /// Advance the engine by `dt` seconds: streaming (including finished
    /// meshes), then water, then entities.
    pub fn update(&mut self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        let Some(dimension) = self.world.active_dimension_mut() else {
            return report;
        };

        report.streaming = self.streamer.update(dimension, &mut self.backend);
        let events = dimension.take_events();
        self.water.handle_events(&events);
        report.water_processed = self.water.tick(dimension);
        self.entities.handle_events(events);
        report.mobs_spawned = self.entities.update(dt);

        self.ticks += 1;
        report
    }

    /// Voxel in the active dimension; Air when unloaded.
    pub fn get_voxel(&self, pos: WorldPos) -> Voxel {
        self.world
            .active_dimension()
            .map_or(Voxel::AIR, |d| d.get_voxel(pos))
    }

    /// Edit a voxel in the active dimension and wake nearby water.
    pub fn set_voxel(&mut self, pos: WorldPos, voxel: Voxel) -> bool {
        let Some(dimension) = self.world.active_dimension_mut() else {
            return false;
        };
        let changed = dimension.set_voxel(pos, voxel);
        if changed {
            self.water.notify_changed(dimension, pos);
        }
        changed
    }

    /// Stamp a registered structure into the active dimension as an edit.
    pub fn place_structure(&mut self, id: &str, origin: WorldPos, rotation: Rotation) -> voxterra_core::Result<usize> {
        let Some(structure) = self.world.registry().settings().structures.resolve(id) else {
            warn!(structure = id, "unknown structure");
            return Err(Error::UnknownStructure(id.to_string()));
        };
        let Some(dimension) = self.world.active_dimension_mut() else {
            return Err(Error::NoActiveDimension);
        };
        let placement = StructurePlacement::new(structure, origin, rotation);
        Ok(StructurePlacer::place(dimension, &placement))
    }

    /// Remove the persistent object at `pos` from both its chunk and the
    /// entity store.
    pub fn remove_entity_at(&mut self, pos: WorldPos) -> Option<EntityRecord> {
        let dimension = self.world.active_dimension_mut()?;
        let from_chunk = dimension
            .get_chunk_mut(pos.chunk_pos())
            .and_then(|c| c.remove_entity_at(pos));
        let from_store = self.entities.remove_at(pos);
        from_chunk.or(from_store)
    }

    /// Drop all loaded chunks of the active dimension and the entities and
    /// water work tied to them. Edits are retained by the dimension.
    fn unload_active(&mut self) {
        if let Some(dimension) = self.world.active_dimension_mut() {
            self.streamer.drain(dimension, &mut self.backend);
            for mut chunk in dimension.unload_all() {
                release_geometry(&mut chunk, &mut self.backend);
            }
            dimension.take_events();
        }
        self.streamer.reset();
        self.water.clear();
        self.entities.clear();
    }

    /// Switch to another dimension, creating it with `generator_id` if needed.
    pub fn switch_dimension(&mut self, id: &str, generator_id: &str) -> voxterra_core::Result<()> {
        if !self.world.registry().contains(generator_id) && self.world.dimension(id).is_none() {
            warn!(generator = generator_id, "unknown generator");
            return Err(Error::UnknownGenerator(generator_id.to_string()));
        }
        self.unload_active();
        self.world.create_dimension(id, generator_id)?;
        self.world.set_active(id)?;
        self.streamer.force_refresh();
        info!(dimension = id, "switched dimension");
        Ok(())
    }

    /// Save the world under `name`.
    pub fn save(&mut self, name: &str) -> SaveStatus {
        self.saves.save(name, &self.world)
    }

    /// Load `name`. On failure a fresh world is generated from the
    /// configured seed.
    pub fn load(&mut self, name: &str) -> SaveStatus {
        self.unload_active();
        let dims: Vec<String> = self.world.dimension_ids();
        for id in dims {
            if let Some(dimension) = self.world.dimension_mut(&id) {
                for mut chunk in dimension.unload_all() {
                    release_geometry(&mut chunk, &mut self.backend);
                }
            }
        }

        let status = self.saves.load(name, &mut self.world);
        if !status.success || self.world.active_dimension().is_none() {
            warn!(name, "starting a fresh world");
            self.world.reseed(self.config.seed);
            if let Err(e) = self
                .world
                .create_dimension(&self.config.dimension_id, &self.config.generator_id)
            {
                warn!(error = %e, "fresh world has no dimension");
            }
        }
        self.entities = EntityWorld::new(self.world.seed());
        self.streamer.force_refresh();
        status
    }

    /// Wait for outstanding mesh jobs and release every chunk's geometry.
    pub fn shutdown(&mut self) {
        self.unload_active();
        for id in self.world.dimension_ids() {
            if let Some(dimension) = self.world.dimension_mut(&id) {
                for mut chunk in dimension.unload_all() {
                    release_geometry(&mut chunk, &mut self.backend);
                }
            }
        }
        info!(ticks = self.ticks, "engine shut down");
    }
}
