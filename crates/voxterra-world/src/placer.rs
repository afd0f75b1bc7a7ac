//! Merging placed structures into chunks.

use tracing::debug;
use voxterra_core::coords::WorldPos;
use voxterra_structure::StructureData;
use voxterra_voxel::{Chunk, EntityRecord};

use crate::dimension::{Dimension, DimensionEvent, SpawnerRequest};
use crate::placement::StructurePlacement;

/// Merge the part of a rotated structure that falls inside `chunk` as part
/// of its procedural baseline.
///
/// Only solid cells of the template overwrite; Air and liquid cells leave
/// the chunk untouched. Nothing is recorded as a modification. Returns how many voxels
/// changed value.
pub fn merge_section(chunk: &mut Chunk, rotated: &StructureData, origin: WorldPos) -> usize {
    let pos = chunk.pos();
    let mut changed = 0;
    for (local, voxel) in rotated.solid_cells() {
        let world = origin.offset(i64::from(local.x), i64::from(local.y), i64::from(local.z));
        let (chunk_pos, local) = world.split();
        if chunk_pos == pos && chunk.get(local) != voxel {
            chunk.set_generated(local, voxel);
            changed += 1;
        }
    }
    if changed > 0 {
        chunk.mark_dirty();
    }
    changed
}

/// Entity placements of a rotated structure in world coordinates.
pub fn entity_records(rotated: &StructureData, origin: WorldPos) -> Vec<EntityRecord> {
    rotated
        .placements()
        .iter()
        .map(|p| {
            let position = origin.offset(i64::from(p.local.x), i64::from(p.local.y), i64::from(p.local.z));
            EntityRecord::new(p.entity_id.clone(), position, p.facing)
        })
        .collect()
}

/// Area-spawner request of an architecture structure, in world coordinates.
pub fn spawner_request(rotated: &StructureData, origin: WorldPos) -> Option<SpawnerRequest> {
    let info = rotated.architecture()?;
    if info.mobs.is_empty() {
        return None;
    }
    let at = |v: glam::IVec3| origin.offset(i64::from(v.x), i64::from(v.y), i64::from(v.z));
    Some(SpawnerRequest {
        structure_id: rotated.id().to_string(),
        anchor: origin,
        min: at(info.spawn_min),
        max: at(info.spawn_max),
        mobs: info.mobs.clone(),
    })
}

/// Stamps structures into a dimension as world edits.
#[derive(Debug, Default)]
pub struct StructurePlacer;

impl StructurePlacer {
    /// Merge a placement into every chunk it touches.
    ///
    /// Missing chunks are created first, so a structure spilling past the
    /// loaded area is complete once placed. Entity placements are anchored
    /// to their chunks and announced; an architecture structure also
    /// announces its spawner. Returns how many voxels changed.
    pub fn place(dimension: &mut Dimension, placement: &StructurePlacement) -> usize {
        let rotated = placement.rotated_structure();
        for pos in placement.chunks() {
            dimension.get_or_create_chunk(pos);
        }
        let mut changed = 0;
        for (local, voxel) in rotated.solid_cells() {
            let world = placement
                .origin
                .offset(i64::from(local.x), i64::from(local.y), i64::from(local.z));
            if dimension.set_voxel(world, voxel) {
                changed += 1;
            }
        }

        for record in entity_records(&rotated, placement.origin) {
            let pos = record.position.chunk_pos();
            dimension.get_or_create_chunk(pos).add_entity(record.clone());
            dimension.push_event(DimensionEvent::EntitySpawned(record));
        }
        if let Some(request) = spawner_request(&rotated, placement.origin) {
            dimension.push_event(DimensionEvent::SpawnerPlaced(request));
        }

        debug!(
            structure = placement.id(),
            origin = ?placement.origin,
            rotation = ?placement.rotation,
            changed,
            "placed structure"
        );
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec3, UVec3};
    use voxterra_core::coords::{ChunkPos, LocalPos};
    use voxterra_core::types::{Facing, Rgba, Voxel};
    use voxterra_structure::{EntityPlacement, StructureKind};

    fn red_cube() -> StructureData {
        StructureData::new("red", StructureKind::Environment, UVec3::splat(3), vec![Voxel::solid(Rgba::RED); 27]).unwrap()
    }

    #[test]
    fn baseline_merge_records_nothing() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        chunk.mark_clean();
        let changed = merge_section(&mut chunk, &red_cube(), WorldPos::new(1, 1, 1));
        assert_eq!(changed, 27);
        assert!(!chunk.has_modifications());
        assert!(chunk.is_dirty());
        assert_eq!(merge_section(&mut chunk, &red_cube(), WorldPos::new(1, 1, 1)), 0);
    }

    #[test]
    fn air_cells_preserve_terrain() {
        let stone = Voxel::solid(Rgba::rgb(128, 128, 128));
        let mut voxels = vec![Voxel::AIR; 8];
        voxels[0] = Voxel::solid(Rgba::RED);
        let hollow = StructureData::new("hollow", StructureKind::Environment, UVec3::splat(2), voxels).unwrap();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        for local in Chunk::local_positions() {
            chunk.set_generated(local, stone);
        }
        merge_section(&mut chunk, &hollow, WorldPos::new(4, 4, 4));
        assert_eq!(chunk.get(LocalPos::new(4, 4, 4)), Voxel::solid(Rgba::RED));
        assert_eq!(chunk.get(LocalPos::new(5, 5, 5)), stone);
    }

    #[test]
    fn liquid_cells_preserve_terrain() {
        let stone = Voxel::solid(Rgba::rgb(128, 128, 128));
        let mut voxels = vec![Voxel::AIR; 8];
        voxels[0] = Voxel::liquid(Rgba::new(40, 90, 200, 160));
        let pond = StructureData::new("pond", StructureKind::Environment, UVec3::splat(2), voxels).unwrap();
        let mut chunk = Chunk::new(ChunkPos::new(0, 0, 0));
        for local in Chunk::local_positions() {
            chunk.set_generated(local, stone);
        }
        assert_eq!(merge_section(&mut chunk, &pond, WorldPos::new(4, 4, 4)), 0);
        assert_eq!(chunk.get(LocalPos::new(4, 4, 4)), stone);
    }

    #[test]
    fn only_the_section_inside_the_chunk_is_merged() {
        let mut chunk = Chunk::new(ChunkPos::new(1, 0, 0));
        let changed = merge_section(&mut chunk, &red_cube(), WorldPos::new(14, 0, 0));
        // x = 16 is the only slab of the cube inside chunk x = 1.
        assert_eq!(changed, 9);
        assert_eq!(chunk.get(LocalPos::new(0, 2, 2)), Voxel::solid(Rgba::RED));
    }

    #[test]
    fn entity_and_spawner_positions_are_world_space() {
        let structure = red_cube()
            .with_placement(EntityPlacement {
                entity_id: "lantern".into(),
                local: IVec3::new(2, 1, 0),
                facing: Facing::North,
            })
            .unwrap()
            .with_architecture(voxterra_structure::ArchitectureInfo {
                spawn_min: IVec3::new(-1, 0, -1),
                spawn_max: IVec3::new(3, 2, 3),
                mobs: vec![voxterra_structure::MobEntry {
                    mob_id: "bat".into(),
                    initial_count: 1,
                    max_count: 3,
                    interval: 5.0,
                }],
            });
        let origin = WorldPos::new(100, 40, -20);
        let records = entity_records(&structure, origin);
        assert_eq!(records[0].position, WorldPos::new(102, 41, -20));
        let request = spawner_request(&structure, origin).unwrap();
        assert_eq!(request.min, WorldPos::new(99, 40, -21));
        assert_eq!(request.max, WorldPos::new(103, 42, -17));
        assert_eq!(request.anchor, origin);
    }
}
