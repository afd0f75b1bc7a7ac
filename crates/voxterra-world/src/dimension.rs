//! Sparse chunk store bound to one generator.

use hashbrown::HashMap;
use tracing::{debug, trace};
use voxterra_core::coords::{ChunkPos, Face, WorldPos};
use voxterra_core::types::{Rgba, Voxel};
use voxterra_mesh::MeshInput;
use voxterra_structure::MobEntry;
use voxterra_voxel::{Chunk, ChunkDiff, EntityRecord};

use crate::generation::Generator;
use crate::placer::{entity_records, merge_section, spawner_request};

/// Area spawner announced by an architecture structure.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnerRequest {
    pub structure_id: String,
    /// World position of the structure origin; the spawner lives and dies
    /// with the chunk containing it.
    pub anchor: WorldPos,
    /// Inclusive spawn box.
    pub min: WorldPos,
    pub max: WorldPos,
    pub mobs: Vec<MobEntry>,
}

/// Something the entity subsystem has to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum DimensionEvent {
    /// A persistent object should exist.
    EntitySpawned(EntityRecord),
    /// The chunk's entity list was restored from a diff; it replaces
    /// whatever the entity subsystem holds for that chunk.
    ChunkEntitiesReset { chunk: ChunkPos, records: Vec<EntityRecord> },
    /// An architecture structure was merged.
    SpawnerPlaced(SpawnerRequest),
    /// A chunk left memory together with everything anchored to it.
    ChunkUnloaded(ChunkPos),
}

/// A world dimension: loaded chunks plus the generator that fills new ones.
///
/// A chunk present in the map is always fully generated, structures
/// included. Modified chunks that are unloaded keep their diff so that
/// regenerating them restores the edits.
pub struct Dimension {
    id: String,
    generator: Box<dyn Generator>,
    chunks: HashMap<ChunkPos, Chunk>,
    retained: HashMap<ChunkPos, ChunkDiff>,
    events: Vec<DimensionEvent>,
}

impl std::fmt::Debug for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dimension")
            .field("id", &self.id)
            .field("generator", &self.generator.generator_id())
            .field("chunks", &self.chunks.len())
            .field("retained", &self.retained.len())
            .finish_non_exhaustive()
    }
}

impl Dimension {
    pub fn new(id: impl Into<String>, generator: Box<dyn Generator>) -> Self {
        Self {
            id: id.into(),
            generator,
            chunks: HashMap::new(),
            retained: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    /// Ambient tint of this dimension.
    pub fn sky_color(&self) -> Rgba {
        self.generator.sky_color()
    }

    /// Run terrain generation and baseline structure merging for `pos`.
    fn generate(&mut self, pos: ChunkPos) -> Chunk {
        let mut chunk = Chunk::new(pos);
        self.generator.generate_chunk_terrain(&mut chunk);

        for placement in self.generator.structures_touching_chunk(pos) {
            if !placement.intersects_chunk(pos) {
                continue;
            }
            let rotated = placement.rotated_structure();
            merge_section(&mut chunk, &rotated, placement.origin);
            for record in entity_records(&rotated, placement.origin) {
                if record.position.chunk_pos() == pos {
                    chunk.add_entity(record);
                }
            }
            if placement.origin.chunk_pos() == pos {
                if let Some(request) = spawner_request(&rotated, placement.origin) {
                    self.events.push(DimensionEvent::SpawnerPlaced(request));
                }
            }
        }

        if let Some(diff) = self.retained.remove(&pos) {
            chunk.apply_diff(&diff);
            self.events.push(DimensionEvent::ChunkEntitiesReset {
                chunk: pos,
                records: diff.entities,
            });
        } else {
            self.events
                .extend(chunk.entities().iter().cloned().map(DimensionEvent::EntitySpawned));
        }

        chunk.mark_dirty();
        trace!(dimension = %self.id, ?pos, "generated chunk");
        chunk
    }

    /// The chunk at `pos`, generating it first if it is not loaded.
    ///
    /// Creating a chunk dirties its six face neighbors, whose boundary faces
    /// may now be hidden.
    pub fn get_or_create_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        if !self.chunks.contains_key(&pos) {
            let chunk = self.generate(pos);
            for neighbor in pos.neighbors() {
                if let Some(n) = self.chunks.get_mut(&neighbor) {
                    n.mark_dirty();
                }
            }
            self.chunks.insert(pos, chunk);
        }
        self.chunks.entry(pos).or_insert_with(|| Chunk::new(pos))
    }

    /// Loaded chunk at `pos`; never generates.
    pub fn get_chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn get_chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    /// Check if a chunk is loaded.
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Remove a chunk, keeping its diff if it carries modifications.
    ///
    /// Returns the chunk so the caller can release its geometry. Neighbors
    /// are dirtied since their faces toward it are exposed again.
    pub fn unload_chunk(&mut self, pos: ChunkPos) -> Option<Chunk> {
        let chunk = self.chunks.remove(&pos)?;
        if chunk.has_modifications() {
            self.retained.insert(pos, chunk.diff());
        }
        for neighbor in pos.neighbors() {
            if let Some(n) = self.chunks.get_mut(&neighbor) {
                n.mark_dirty();
            }
        }
        self.events.push(DimensionEvent::ChunkUnloaded(pos));
        trace!(dimension = %self.id, ?pos, "unloaded chunk");
        Some(chunk)
    }

    /// Unload every chunk; returns them for geometry release.
    pub fn unload_all(&mut self) -> Vec<Chunk> {
        let mut positions = self.positions();
        positions.sort_unstable();
        let chunks: Vec<_> = positions
            .into_iter()
            .filter_map(|pos| self.unload_chunk(pos))
            .collect();
        debug!(dimension = %self.id, count = chunks.len(), "unloaded all chunks");
        chunks
    }

    /// Voxel at a world position; Air when its chunk is not loaded.
    pub fn get_voxel(&self, pos: WorldPos) -> Voxel {
        let (chunk, local) = pos.split();
        self.chunks
            .get(&chunk)
            .map_or(Voxel::AIR, |c| c.get(local))
    }

    /// Edit a voxel. A no-op when its chunk is not loaded.
    ///
    /// Dirties the owning chunk and every face neighbor sharing the edited
    /// boundary. Returns whether the value changed.
    pub fn set_voxel(&mut self, pos: WorldPos, voxel: Voxel) -> bool {
        let (chunk_pos, local) = pos.split();
        let Some(chunk) = self.chunks.get_mut(&chunk_pos) else {
            return false;
        };
        if !chunk.set(local, voxel) {
            return false;
        }
        for face in Face::ALL {
            if local.is_on_face(face) {
                if let Some(n) = self.chunks.get_mut(&chunk_pos.neighbor(face)) {
                    n.mark_dirty();
                }
            }
        }
        true
    }

    /// Apply a saved diff on top of the chunk's regenerated baseline.
    pub fn apply_diff(&mut self, pos: ChunkPos, diff: &ChunkDiff) {
        self.retained.remove(&pos);
        self.get_or_create_chunk(pos).apply_diff(diff);
        self.events.push(DimensionEvent::ChunkEntitiesReset {
            chunk: pos,
            records: diff.entities.clone(),
        });
    }

    /// Every chunk that differs from its baseline, loaded or retained,
    /// sorted by position.
    pub fn diffs(&self) -> Vec<(ChunkPos, ChunkDiff)> {
        let mut out: Vec<_> = self
            .chunks
            .iter()
            .filter(|(_, c)| c.has_modifications())
            .map(|(&pos, c)| (pos, c.diff()))
            .chain(
                self.retained
                    .iter()
                    .filter(|(_, d)| !d.is_empty())
                    .map(|(&pos, d)| (pos, d.clone())),
            )
            .collect();
        out.sort_unstable_by_key(|(pos, _)| *pos);
        out
    }

    /// Get all loaded chunk positions.
    pub fn positions(&self) -> Vec<ChunkPos> {
        self.chunks.keys().copied().collect()
    }

    /// Loaded chunks whose mesh is out of date.
    pub fn dirty_chunks(&self) -> Vec<ChunkPos> {
        self.chunks
            .iter()
            .filter(|(_, c)| c.is_dirty())
            .map(|(&pos, _)| pos)
            .collect()
    }

    pub fn mark_dirty(&mut self, pos: ChunkPos) {
        if let Some(chunk) = self.chunks.get_mut(&pos) {
            chunk.mark_dirty();
        }
    }

    /// Loaded face neighbors in [`Face::ALL`] order.
    pub fn neighbors_of(&self, pos: ChunkPos) -> [Option<&Chunk>; 6] {
        Face::ALL.map(|face| self.chunks.get(&pos.neighbor(face)))
    }

    /// Value snapshot of a chunk and its borders for meshing.
    pub fn mesh_input(&self, pos: ChunkPos) -> Option<MeshInput> {
        let chunk = self.chunks.get(&pos)?;
        Some(MeshInput::from_chunk(chunk, self.neighbors_of(pos)))
    }

    pub(crate) fn push_event(&mut self, event: DimensionEvent) {
        self.events.push(event);
    }

    /// Drain queued events in the order they happened.
    pub fn take_events(&mut self) -> Vec<DimensionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get the number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if no chunks are loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate loaded chunks.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    /// Get total memory usage of all chunks.
    pub fn memory_usage(&self) -> usize {
        self.chunks.values().map(Chunk::memory_usage).sum()
    }
}
