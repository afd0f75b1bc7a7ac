//! Chunk data structure for voxel world storage.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use voxterra_core::constants::CHUNK_VOLUME;
use voxterra_core::coords::{ChunkPos, LocalPos, WorldPos};
use voxterra_core::types::{Facing, Voxel};

/// Opaque handle to geometry owned by the render/collision backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// A persistent object anchored to a chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity type id understood by the entity subsystem.
    pub entity_id: String,
    /// Voxel the entity stands in.
    pub position: WorldPos,
    /// Horizontal facing.
    pub facing: Facing,
}

impl EntityRecord {
    /// Create a new record.
    pub fn new(entity_id: impl Into<String>, position: WorldPos, facing: Facing) -> Self {
        Self {
            entity_id: entity_id.into(),
            position,
            facing,
        }
    }
}

/// Everything that distinguishes a chunk from its regenerated baseline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkDiff {
    /// Modified positions and their values, sorted by index.
    pub voxels: Vec<(LocalPos, Voxel)>,
    /// Entities anchored to the chunk.
    pub entities: Vec<EntityRecord>,
}

impl ChunkDiff {
    /// Whether the diff carries nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty() && self.entities.is_empty()
    }
}

/// A single chunk of voxel data (16x16x16 voxels).
///
/// Besides the dense voxel array the chunk tracks which local positions were
/// changed after generation, whether its mesh is out of date, the backend
/// geometry it currently owns and the entities anchored to it.
#[derive(Clone, Debug)]
pub struct Chunk {
    pos: ChunkPos,
    voxels: Box<[Voxel]>,
    modified: HashSet<LocalPos>,
    dirty: bool,
    revision: u64,
    render: Option<GeometryHandle>,
    collision: Option<GeometryHandle>,
    entities: Vec<EntityRecord>,
}

impl Chunk {
    /// Create a new all-air chunk at the given position.
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            voxels: vec![Voxel::AIR; CHUNK_VOLUME].into_boxed_slice(),
            modified: HashSet::new(),
            dirty: true,
            revision: 0,
            render: None,
            collision: None,
            entities: Vec::new(),
        }
    }

    /// Position in chunk coordinates.
    #[inline]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Voxel at a local position.
    #[inline]
    pub fn get(&self, local: LocalPos) -> Voxel {
        self.voxels[local.to_index()]
    }

    /// Voxel at signed local coordinates, `None` when outside this chunk.
    ///
    /// Callers resolve `None` through the owning dimension.
    #[inline]
    pub fn get_checked(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        LocalPos::checked(x, y, z).map(|local| self.get(local))
    }

    /// Write a voxel as part of the procedural baseline.
    ///
    /// Does not record a modification; used by terrain generators.
    #[inline]
    pub fn set_generated(&mut self, local: LocalPos, voxel: Voxel) {
        self.voxels[local.to_index()] = voxel;
    }

    /// Write a voxel as a modification of the baseline.
    ///
    /// Records the position in the modified set and marks the chunk dirty.
    /// Returns `true` when the stored value changed.
    pub fn set(&mut self, local: LocalPos, voxel: Voxel) -> bool {
        let slot = &mut self.voxels[local.to_index()];
        if *slot == voxel {
            return false;
        }
        *slot = voxel;
        self.modified.insert(local);
        self.mark_dirty();
        true
    }

    /// All voxels in [`LocalPos::to_index`] order.
    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Capture the modified voxels and entities.
    pub fn diff(&self) -> ChunkDiff {
        ChunkDiff {
            voxels: self.modified_voxels(),
            entities: self.entities.clone(),
        }
    }

    /// Re-apply a diff on top of a freshly generated baseline.
    ///
    /// Voxels go through [`Chunk::set`] so they are recorded as modified
    /// again; a diff value equal to the baseline is still recorded. The
    /// diff's entity list replaces the current one.
    pub fn apply_diff(&mut self, diff: &ChunkDiff) {
        for &(local, voxel) in &diff.voxels {
            if !self.set(local, voxel) {
                self.modified.insert(local);
            }
        }
        self.entities.clone_from(&diff.entities);
        self.mark_dirty();
    }

    /// Check if this chunk is empty (all air).
    pub fn is_empty(&self) -> bool {
        self.voxels.iter().all(Voxel::is_air)
    }

    /// Count voxels matching a predicate.
    pub fn count_where(&self, predicate: impl Fn(&Voxel) -> bool) -> usize {
        self.voxels.iter().filter(|v| predicate(v)).count()
    }

    /// Whether the mesh is out of date.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the mesh as out of date.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Flag the mesh as matching the voxel data.
    #[inline]
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Counter bumped every time the chunk is dirtied.
    ///
    /// A mesh built from a snapshot taken at revision `r` is current only
    /// while the chunk is still at `r`.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark clean only if nothing dirtied the chunk since `revision`.
    pub fn mark_clean_at(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.dirty = false;
            true
        } else {
            false
        }
    }

    /// Whether anything here differs from a fresh regeneration.
    pub fn has_modifications(&self) -> bool {
        !self.modified.is_empty() || !self.entities.is_empty()
    }

    /// Number of modified positions.
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }

    /// Whether a local position was modified since generation.
    pub fn is_modified(&self, local: LocalPos) -> bool {
        self.modified.contains(&local)
    }

    /// Modified positions with their current values, sorted by position.
    pub fn modified_voxels(&self) -> Vec<(LocalPos, Voxel)> {
        let mut out: Vec<_> = self
            .modified
            .iter()
            .map(|&local| (local, self.get(local)))
            .collect();
        out.sort_unstable_by_key(|(local, _)| local.to_index());
        out
    }

    /// Forget all recorded modifications (voxels keep their values).
    pub fn clear_modifications(&mut self) {
        self.modified.clear();
    }

    /// Current render geometry handle.
    #[inline]
    pub fn render_handle(&self) -> Option<GeometryHandle> {
        self.render
    }

    /// Current collision geometry handle.
    #[inline]
    pub fn collision_handle(&self) -> Option<GeometryHandle> {
        self.collision
    }

    /// Replace the geometry handles after a rebuild.
    pub fn set_geometry(&mut self, render: Option<GeometryHandle>, collision: Option<GeometryHandle>) {
        self.render = render;
        self.collision = collision;
    }

    /// Detach the geometry handles so the caller can release them.
    pub fn take_geometry(&mut self) -> (Option<GeometryHandle>, Option<GeometryHandle>) {
        (self.render.take(), self.collision.take())
    }

    /// Entities anchored to this chunk.
    #[inline]
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Anchor an entity to this chunk.
    pub fn add_entity(&mut self, record: EntityRecord) {
        self.entities.push(record);
    }

    /// Remove the entity standing at a world position, if any.
    pub fn remove_entity_at(&mut self, position: WorldPos) -> Option<EntityRecord> {
        let index = self.entities.iter().position(|e| e.position == position)?;
        Some(self.entities.remove(index))
    }

    /// Replace the anchored entity list wholesale.
    pub fn replace_entities(&mut self, records: Vec<EntityRecord>) -> Vec<EntityRecord> {
        std::mem::replace(&mut self.entities, records)
    }

    /// Iterate all local positions in index order.
    pub fn local_positions() -> impl Iterator<Item = LocalPos> {
        (0..CHUNK_VOLUME).map(LocalPos::from_index)
    }

    /// Get memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.voxels.len() * std::mem::size_of::<Voxel>()
            + self.modified.capacity() * std::mem::size_of::<LocalPos>()
            + self.entities.capacity() * std::mem::size_of::<EntityRecord>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxterra_core::types::Rgba;

    fn red() -> Voxel {
        Voxel::solid(Rgba::RED)
    }

    #[test]
    fn new_chunk_is_empty_and_dirty() {
        let chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        assert!(chunk.is_empty());
        assert!(chunk.is_dirty());
        assert!(!chunk.has_modifications());
    }

    #[test]
    fn generated_writes_are_not_modifications() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set_generated(LocalPos::new(1, 2, 3), red());
        assert_eq!(chunk.get(LocalPos::new(1, 2, 3)), red());
        assert!(!chunk.has_modifications());
    }

    #[test]
    fn set_records_modification_and_dirties() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.mark_clean();

        assert!(chunk.set(LocalPos::new(4, 4, 4), red()));
        assert!(chunk.is_dirty());
        assert!(chunk.is_modified(LocalPos::new(4, 4, 4)));
        assert_eq!(chunk.modified_count(), 1);

        // Writing the same value again is a no-op.
        chunk.mark_clean();
        assert!(!chunk.set(LocalPos::new(4, 4, 4), red()));
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn out_of_range_lookup_is_none() {
        let chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        assert!(chunk.get_checked(-1, 0, 0).is_none());
        assert!(chunk.get_checked(0, 0, 16).is_none());
        assert_eq!(chunk.get_checked(15, 15, 15), Some(Voxel::AIR));
    }

    #[test]
    fn modified_voxels_are_sorted() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set(LocalPos::new(0, 0, 5), red());
        chunk.set(LocalPos::new(3, 0, 0), red());
        chunk.set(LocalPos::new(0, 1, 0), red());
        let order: Vec<_> = chunk.modified_voxels().iter().map(|(p, _)| *p).collect();
        assert_eq!(
            order,
            vec![LocalPos::new(3, 0, 0), LocalPos::new(0, 1, 0), LocalPos::new(0, 0, 5)]
        );
    }

    #[test]
    fn entities_count_as_modifications() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        let at = WorldPos::new(2, 3, 4);
        chunk.add_entity(EntityRecord::new("lantern", at, Facing::East));
        assert!(chunk.has_modifications());

        let removed = chunk.remove_entity_at(at).map(|e| e.entity_id);
        assert_eq!(removed.as_deref(), Some("lantern"));
        assert!(!chunk.has_modifications());
    }

    #[test]
    fn diff_roundtrips_onto_fresh_chunk() {
        let pos = ChunkPos::new(1, 0, 0);
        let mut edited = Chunk::new(pos);
        edited.set(LocalPos::new(0, 0, 0), red());
        edited.set(LocalPos::new(5, 6, 7), Voxel::AIR);
        edited.set(LocalPos::new(5, 6, 7), red());
        edited.add_entity(EntityRecord::new("sign", WorldPos::new(17, 1, 1), Facing::West));
        let diff = edited.diff();
        assert_eq!(diff.voxels.len(), 2);

        let mut fresh = Chunk::new(pos);
        fresh.apply_diff(&diff);
        assert_eq!(fresh.voxels(), edited.voxels());
        assert_eq!(fresh.diff(), diff);
        assert!(fresh.is_dirty());
    }

    #[test]
    fn diff_equal_to_baseline_is_still_recorded() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set_generated(LocalPos::new(1, 1, 1), red());
        let diff = ChunkDiff {
            voxels: vec![(LocalPos::new(1, 1, 1), red())],
            entities: Vec::new(),
        };
        chunk.apply_diff(&diff);
        assert!(chunk.is_modified(LocalPos::new(1, 1, 1)));
    }

    #[test]
    fn stale_revision_keeps_chunk_dirty() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        let taken = chunk.revision();
        chunk.set(LocalPos::new(1, 1, 1), red());
        assert!(!chunk.mark_clean_at(taken));
        assert!(chunk.is_dirty());
        assert!(chunk.mark_clean_at(chunk.revision()));
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn geometry_handles_swap() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.set_geometry(Some(GeometryHandle(1)), Some(GeometryHandle(2)));
        assert_eq!(chunk.render_handle(), Some(GeometryHandle(1)));
        let (render, collision) = chunk.take_geometry();
        assert_eq!((render, collision), (Some(GeometryHandle(1)), Some(GeometryHandle(2))));
        assert!(chunk.render_handle().is_none());
    }
}
