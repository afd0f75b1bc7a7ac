//! Built-in structure templates.

use crate::data::{ArchitectureInfo, EntityPlacement, MobEntry, StructureData, StructureError, StructureKind};
use crate::rotation::RotationSet;
use glam::{IVec3, UVec3};
use tracing::error;
use voxterra_core::types::{BlockId, BlockPalette, Facing, Voxel};

const TERRAIN_GENERATORS: [&str; 2] = ["overworld", "grassland"];

/// Dense voxel buffer used to draw templates in code.
struct Canvas {
    size: UVec3,
    voxels: Vec<Voxel>,
}

impl Canvas {
    fn new(x: u32, y: u32, z: u32) -> Self {
        Self {
            size: UVec3::new(x, y, z),
            voxels: vec![Voxel::AIR; (x * y * z) as usize],
        }
    }

    fn set(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) {
        let p = IVec3::new(x, y, z);
        if p.cmpge(IVec3::ZERO).all() && p.cmplt(self.size.as_ivec3()).all() {
            let s = self.size;
            self.voxels[(p.x as u32 + s.x * (p.y as u32 + s.y * p.z as u32)) as usize] = voxel;
        }
    }

    fn fill(&mut self, min: IVec3, max: IVec3, voxel: Voxel) {
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    self.set(x, y, z, voxel);
                }
            }
        }
    }

    fn finish(self, id: &str, kind: StructureKind) -> Result<StructureData, StructureError> {
        StructureData::new(id, kind, self.size, self.voxels)
    }
}

fn for_terrain(mut data: StructureData) -> StructureData {
    for generator in TERRAIN_GENERATORS {
        data = data.with_generator(generator);
    }
    data
}

fn boulder(palette: &BlockPalette) -> Result<StructureData, StructureError> {
    let stone = palette.voxel(BlockId::STONE);
    let gravel = palette.voxel(BlockId::GRAVEL);
    let mut c = Canvas::new(3, 2, 3);
    c.fill(IVec3::ZERO, IVec3::new(2, 0, 2), stone);
    c.set(1, 1, 1, stone);
    c.set(0, 1, 1, gravel);
    c.set(0, 0, 0, Voxel::AIR);
    c.set(2, 0, 2, Voxel::AIR);
    Ok(for_terrain(c.finish("boulder", StructureKind::Environment)?.with_weight(2)))
}

fn oak_tree(palette: &BlockPalette) -> Result<StructureData, StructureError> {
    let log = palette.voxel(BlockId::LOG);
    let leaves = palette.voxel(BlockId::LEAVES);
    let mut c = Canvas::new(5, 7, 5);
    c.fill(IVec3::new(0, 3, 0), IVec3::new(4, 4, 4), leaves);
    for (x, z) in [(0, 0), (4, 0), (0, 4), (4, 4)] {
        c.set(x, 4, z, Voxel::AIR);
    }
    c.fill(IVec3::new(1, 5, 1), IVec3::new(3, 5, 3), leaves);
    c.set(2, 6, 2, leaves);
    c.fill(IVec3::new(2, 0, 2), IVec3::new(2, 5, 2), log);
    Ok(for_terrain(c.finish("oak_tree", StructureKind::Environment)?.with_weight(6)))
}

fn pine_tree(palette: &BlockPalette) -> Result<StructureData, StructureError> {
    let log = palette.voxel(BlockId::LOG);
    let leaves = palette.voxel(BlockId::LEAVES);
    let mut c = Canvas::new(5, 9, 5);
    c.fill(IVec3::new(0, 2, 0), IVec3::new(4, 3, 4), leaves);
    c.fill(IVec3::new(1, 4, 1), IVec3::new(3, 5, 3), leaves);
    c.fill(IVec3::new(2, 6, 1), IVec3::new(2, 7, 3), leaves);
    c.fill(IVec3::new(1, 6, 2), IVec3::new(3, 7, 2), leaves);
    c.set(2, 8, 2, leaves);
    c.fill(IVec3::new(2, 0, 2), IVec3::new(2, 7, 2), log);
    Ok(for_terrain(c.finish("pine_tree", StructureKind::Environment)?.with_weight(4)))
}

fn cactus(palette: &BlockPalette) -> Result<StructureData, StructureError> {
    let cactus = palette.voxel(BlockId::CACTUS);
    let mut c = Canvas::new(3, 4, 1);
    c.fill(IVec3::new(1, 0, 0), IVec3::new(1, 3, 0), cactus);
    c.set(0, 2, 0, cactus);
    c.set(2, 1, 0, cactus);
    Ok(c
        .finish("cactus", StructureKind::Environment)?
        .with_weight(1)
        .with_generator("overworld"))
}

fn well(palette: &BlockPalette) -> Result<StructureData, StructureError> {
    let cobble = palette.voxel(BlockId::COBBLESTONE);
    let planks = palette.voxel(BlockId::PLANKS);
    let mut c = Canvas::new(3, 4, 3);
    c.fill(IVec3::ZERO, IVec3::new(2, 1, 2), cobble);
    // Open shaft; the terrain below shows through.
    c.fill(IVec3::new(1, 0, 1), IVec3::new(1, 1, 1), Voxel::AIR);
    for (x, z) in [(0, 0), (2, 0), (0, 2), (2, 2)] {
        c.set(x, 2, z, planks);
    }
    c.fill(IVec3::new(0, 3, 0), IVec3::new(2, 3, 2), planks);
    let data = c
        .finish("well", StructureKind::Architecture)?
        .with_weight(2)
        .with_rotations(RotationSet::NORTH)
        .with_placement(EntityPlacement {
            entity_id: "bucket".into(),
            local: IVec3::new(1, 2, 0),
            facing: Facing::North,
        })?
        .with_architecture(ArchitectureInfo {
            spawn_min: IVec3::new(-4, 0, -4),
            spawn_max: IVec3::new(6, 2, 6),
            mobs: vec![MobEntry {
                mob_id: "villager".into(),
                initial_count: 1,
                max_count: 3,
                interval: 45.0,
            }],
        });
    Ok(for_terrain(data))
}

fn watchtower_ruin(palette: &BlockPalette) -> Result<StructureData, StructureError> {
    let cobble = palette.voxel(BlockId::COBBLESTONE);
    let stone = palette.voxel(BlockId::STONE);
    let moss = palette.voxel(BlockId::MOSS);
    let planks = palette.voxel(BlockId::PLANKS);
    let mut c = Canvas::new(7, 8, 7);

    c.fill(IVec3::ZERO, IVec3::new(6, 0, 6), cobble);
    // Hollow walls, crumbling toward the top on the east side.
    for y in 1..8 {
        let east_top = 8 - y / 2;
        for i in 0..7 {
            c.set(i, y, 0, if (i + y) % 3 == 0 { moss } else { stone });
            c.set(i, y, 6, stone);
            c.set(0, y, i, cobble);
            if i < east_top {
                c.set(6, y, i, stone);
            }
        }
    }
    // Doorway on the north wall and an upper floor.
    c.fill(IVec3::new(3, 1, 0), IVec3::new(3, 2, 0), Voxel::AIR);
    c.fill(IVec3::new(1, 4, 1), IVec3::new(5, 4, 5), planks);
    c.fill(IVec3::new(4, 4, 3), IVec3::new(5, 4, 5), Voxel::AIR);

    let data = c
        .finish("watchtower_ruin", StructureKind::Architecture)?
        .with_weight(1)
        .with_placement(EntityPlacement {
            entity_id: "treasure_chest".into(),
            local: IVec3::new(2, 5, 2),
            facing: Facing::South,
        })?
        .with_placement(EntityPlacement {
            entity_id: "torch".into(),
            local: IVec3::new(3, 3, 1),
            facing: Facing::North,
        })?
        .with_architecture(ArchitectureInfo {
            spawn_min: IVec3::new(-3, 0, -3),
            spawn_max: IVec3::new(9, 4, 9),
            mobs: vec![
                MobEntry {
                    mob_id: "skeleton".into(),
                    initial_count: 2,
                    max_count: 4,
                    interval: 20.0,
                },
                MobEntry {
                    mob_id: "bat".into(),
                    initial_count: 1,
                    max_count: 2,
                    interval: 60.0,
                },
            ],
        });
    Ok(for_terrain(data))
}

/// Build every built-in template.
///
/// A template that fails validation is logged and left out.
pub fn all(palette: &BlockPalette) -> Vec<StructureData> {
    let builders: [fn(&BlockPalette) -> Result<StructureData, StructureError>; 6] =
        [boulder, oak_tree, pine_tree, cactus, well, watchtower_ruin];
    builders
        .iter()
        .filter_map(|build| match build(palette) {
            Ok(data) => Some(data),
            Err(e) => {
                error!(error = %e, "invalid built-in structure");
                None
            }
        })
        .collect()
}
