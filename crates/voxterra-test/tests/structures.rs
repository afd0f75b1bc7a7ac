//! Structure rotation, placement grids and stamping into a dimension.

use std::sync::Arc;

use glam::{IVec3, UVec3};
use voxterra_core::coords::{ChunkPos, WorldPos};
use voxterra_core::types::{Facing, Rgba, Voxel};
use voxterra_structure::{EntityPlacement, Rotation, StructureData, StructureKind};
use voxterra_test::{grassland_dimension, red_cube, void_dimension};
use voxterra_world::{DimensionEvent, GeneratorSettings, StructurePlacement, StructurePlacer};

/// A lopsided 3x2x4 template whose cells are all distinguishable.
fn lopsided() -> StructureData {
    let size = UVec3::new(3, 2, 4);
    let mut voxels = Vec::new();
    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                let v = if (x + z) % 3 == 0 && y == 1 {
                    Voxel::AIR
                } else {
                    Voxel::solid(Rgba::rgb((x * 60) as u8, (y * 100) as u8, (z * 50) as u8))
                };
                voxels.push(v);
            }
        }
    }
    StructureData::new("lopsided", StructureKind::Environment, size, voxels)
        .unwrap()
        .with_placement(EntityPlacement {
            entity_id: "lantern".into(),
            local: IVec3::new(2, 1, 0),
            facing: Facing::East,
        })
        .unwrap()
        .with_placement(EntityPlacement {
            entity_id: "sign".into(),
            local: IVec3::new(0, 0, 3),
            facing: Facing::North,
        })
        .unwrap()
}

#[test]
fn four_quarter_turns_are_the_identity() {
    let original = lopsided();
    let mut turned = original.clone();
    for step in 1..=4 {
        turned = turned.rotated(Rotation::East);
        if step < 4 {
            assert_ne!(turned, original, "{step} quarter turns should differ");
        }
    }
    assert_eq!(turned, original);
}

#[test]
fn composed_rotations_match_direct_ones() {
    let original = lopsided();
    for a in Rotation::ALL {
        for b in Rotation::ALL {
            assert_eq!(original.rotated(a).rotated(b), original.rotated(a.then(b)));
        }
    }
}

#[test]
fn rotation_moves_cells_and_facings_together() {
    let east = lopsided().rotated(Rotation::East);
    assert_eq!(east.size(), UVec3::new(4, 2, 3));
    // (x, z) -> (sz - 1 - z, x) for one clockwise step.
    let lantern = east.placements().iter().find(|p| p.entity_id == "lantern").unwrap();
    assert_eq!(lantern.local, IVec3::new(3, 1, 2));
    assert_eq!(lantern.facing, Facing::South);
    assert_eq!(
        east.voxel_at(IVec3::new(4 - 1 - 3, 0, 2)),
        lopsided().voxel_at(IVec3::new(2, 0, 3))
    );
}

#[test]
fn placement_lists_repeat_regardless_of_call_order() {
    let a = grassland_dimension(4242);
    let b = grassland_dimension(4242);
    let positions: Vec<ChunkPos> = (-6..6).flat_map(|x| (-6..6).map(move |z| ChunkPos::new(x, 2, z))).collect();

    let forward: Vec<_> = positions.iter().map(|&p| a.generator().structures_for_chunk(p)).collect();
    let mut backward: Vec<_> = positions.iter().rev().map(|&p| b.generator().structures_for_chunk(p)).collect();
    backward.reverse();
    assert_eq!(forward, backward);

    let total: usize = forward.iter().map(Vec::len).sum();
    assert!(total > 0, "a 12x12 chunk area should hold some structures");
    for placement in forward.iter().flatten() {
        assert!(placement.structure.supports_generator("grassland"));
        assert!(placement.structure.rotations().contains(placement.rotation.flag()));
    }
}

#[test]
fn red_cube_at_origin_sets_27_voxels() {
    let mut dim = void_dimension();
    let origin_chunk = ChunkPos::new(0, 0, 0);
    dim.get_or_create_chunk(origin_chunk).mark_clean();
    dim.take_events();

    let placement = StructurePlacement::new(Arc::new(red_cube()), WorldPos::new(0, 0, 0), Rotation::North);
    assert_eq!(StructurePlacer::place(&mut dim, &placement), 27);

    let chunk = dim.get_chunk(origin_chunk).unwrap();
    assert!(chunk.is_dirty());
    assert_eq!(chunk.modified_count(), 27);
    assert_eq!(chunk.count_where(|v| v.is_solid() && v.color == Rgba::RED), 27);
    assert_eq!(chunk.count_where(|v| !v.is_air()), 27);
    assert_eq!(dim.get_voxel(WorldPos::new(2, 2, 2)), Voxel::solid(Rgba::RED));
    assert_eq!(dim.get_voxel(WorldPos::new(3, 0, 0)), Voxel::AIR);
    // Nothing spills out of the origin chunk.
    assert_eq!(dim.len(), 1);
    assert!(dim.take_events().is_empty());
}

#[test]
fn placement_spills_into_neighbor_chunks() {
    let mut dim = void_dimension();
    let placement = StructurePlacement::new(Arc::new(red_cube()), WorldPos::new(15, 15, -1), Rotation::West);
    assert_eq!(StructurePlacer::place(&mut dim, &placement), 27);
    assert_eq!(dim.len(), 8);
    let per_chunk: usize = dim.chunks().map(|c| c.modified_count()).sum();
    assert_eq!(per_chunk, 27);
    assert!(dim.chunks().all(|c| c.is_dirty()));
}

#[test]
fn architecture_placement_announces_entities_and_spawner() {
    let mut dim = void_dimension();
    let settings = GeneratorSettings::default();
    let ruin = settings.structures.resolve("watchtower_ruin").unwrap();

    let origin = WorldPos::new(100, 80, 100);
    StructurePlacer::place(&mut dim, &StructurePlacement::new(ruin, origin, Rotation::South));
    let events = dim.take_events();
    let spawned = events
        .iter()
        .filter(|e| matches!(e, DimensionEvent::EntitySpawned(_)))
        .count();
    assert_eq!(spawned, 2);
    let spawner = events.iter().find_map(|e| match e {
        DimensionEvent::SpawnerPlaced(request) => Some(request),
        _ => None,
    });
    let spawner = spawner.unwrap();
    assert_eq!(spawner.structure_id, "watchtower_ruin");
    assert_eq!(spawner.anchor, origin);
    assert_eq!(spawner.mobs.len(), 2);
}

#[test]
fn placed_liquid_cells_leave_terrain_alone() {
    let mut dim = void_dimension();
    let stone = Voxel::solid(Rgba::rgb(128, 128, 128));
    let water = Voxel::liquid(Rgba::new(40, 90, 200, 160));
    dim.get_or_create_chunk(ChunkPos::new(0, 0, 0));
    assert!(dim.set_voxel(WorldPos::new(4, 4, 4), stone));

    let mut voxels = vec![Voxel::AIR; 8];
    voxels[0] = water;
    voxels[7] = water;
    let pond = StructureData::new("pond", StructureKind::Environment, UVec3::splat(2), voxels).unwrap();
    let placement = StructurePlacement::new(Arc::new(pond), WorldPos::new(4, 4, 4), Rotation::North);
    assert_eq!(StructurePlacer::place(&mut dim, &placement), 0);
    assert_eq!(dim.get_voxel(WorldPos::new(4, 4, 4)), stone);
    assert_eq!(dim.get_voxel(WorldPos::new(5, 5, 5)), Voxel::AIR);
}
