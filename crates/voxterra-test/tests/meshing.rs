//! Mesh output against the per-voxel face rule.

use glam::IVec3;
use voxterra_core::coords::{ChunkPos, Face};
use voxterra_core::types::{Rgba, Voxel};
use voxterra_mesh::{build_mesh, greedy, naive, MeshInput, MeshStrategy};
use voxterra_test::{expected_faces, input_from_fn, rasterize, FaceCell};

fn hash3(x: i32, y: i32, z: i32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343) ^ (y as u32).wrapping_mul(0xd816_3841) ^ (z as u32).wrapping_mul(0xcb1a_b31f);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^ (h >> 15)
}

/// Blocky terrain with two colors of stone, a water pool and a few holes,
/// including the border cells.
fn mixed_input() -> MeshInput {
    let grey = Voxel::solid(Rgba::rgb(128, 128, 128));
    let brown = Voxel::solid(Rgba::rgb(120, 80, 40));
    let water = Voxel::liquid(Rgba::new(40, 90, 200, 160));
    input_from_fn(ChunkPos::new(0, 0, 0), |x, y, z| {
        let h = hash3(x, y, z);
        let ground = 6 + x.rem_euclid(5) + z.rem_euclid(3);
        if y < ground {
            if h % 11 == 0 {
                Voxel::AIR
            } else if (x / 4 + z / 4) % 2 == 0 {
                grey
            } else {
                brown
            }
        } else if y < 10 && (2..9).contains(&x) && (3..12).contains(&z) {
            water
        } else {
            Voxel::AIR
        }
    })
}

#[test]
fn greedy_covers_exactly_the_visible_faces() {
    let input = mixed_input();
    let expected = expected_faces(&input);
    assert!(!expected.is_empty());

    let greedy = rasterize(&build_mesh(&input, MeshStrategy::Greedy)).unwrap();
    let naive = rasterize(&build_mesh(&input, MeshStrategy::Naive)).unwrap();
    // Equal maps also mean no quad mixed colors or transparency.
    assert_eq!(greedy, expected);
    assert_eq!(naive, expected);
}

#[test]
fn greedy_quads_are_uniform_and_fewer() {
    let input = mixed_input();
    let quads = greedy::greedy_quads(&input);
    for quad in &quads {
        for cell in quad.cells() {
            let p = cell.to_ivec3();
            let n = p + quad.face.offset();
            let attr = voxterra_mesh::face_attr(input.get(p.x, p.y, p.z), input.get(n.x, n.y, n.z));
            assert_eq!(attr, Some(quad.attr), "quad {quad:?} covers a mismatched cell {p}");
        }
    }
    assert!(quads.len() < naive::naive_quads(&input).len());
}

#[test]
fn stacked_solids_share_no_face() {
    let input = input_from_fn(ChunkPos::new(0, 0, 0), |x, y, z| {
        if x == 5 && z == 5 && (y == 5 || y == 6) {
            Voxel::solid(Rgba::RED)
        } else {
            Voxel::AIR
        }
    });
    let faces = rasterize(&build_mesh(&input, MeshStrategy::Greedy)).unwrap();
    let lower = IVec3::new(5, 5, 5);
    let upper = IVec3::new(5, 6, 5);
    assert!(!faces.contains_key(&FaceCell { face: Face::PosY, cell: lower }));
    assert!(!faces.contains_key(&FaceCell { face: Face::NegY, cell: upper }));
    // Exactly one face on the boundary toward Air.
    assert!(faces.contains_key(&FaceCell { face: Face::PosY, cell: upper }));
    assert!(!faces.contains_key(&FaceCell { face: Face::NegY, cell: upper + IVec3::Y }));
    assert_eq!(faces.len(), 10);
}

#[test]
fn adjacent_liquids_share_no_face() {
    let water = Voxel::liquid(Rgba::new(40, 90, 200, 160));
    let input = input_from_fn(ChunkPos::new(0, 0, 0), |x, y, z| {
        if y == 3 && z == 3 && (x == 3 || x == 4) {
            water
        } else {
            Voxel::AIR
        }
    });
    let mesh = build_mesh(&input, MeshStrategy::Naive);
    let faces = rasterize(&mesh).unwrap();
    assert!(!faces.contains_key(&FaceCell { face: Face::PosX, cell: IVec3::new(3, 3, 3) }));
    assert!(!faces.contains_key(&FaceCell { face: Face::NegX, cell: IVec3::new(4, 3, 3) }));
    assert_eq!(faces.len(), 10);
    assert!(faces.values().all(|a| a.transparent));
    assert_eq!(mesh.opaque_triangle_count(), 0);
}

#[test]
fn enclosed_air_cell_gets_six_inward_faces() {
    let center = IVec3::new(8, 8, 8);
    let input = input_from_fn(ChunkPos::new(0, 0, 0), |x, y, z| {
        let d = IVec3::new(x, y, z) - center;
        if d.abs().element_sum() == 1 {
            Voxel::solid(Rgba::rgb(90, 90, 90))
        } else {
            Voxel::AIR
        }
    });
    let faces = rasterize(&build_mesh(&input, MeshStrategy::Greedy)).unwrap();

    let inward: Vec<_> = Face::ALL
        .iter()
        .map(|&face| FaceCell {
            face: face.opposite(),
            cell: center + face.offset(),
        })
        .collect();
    for key in &inward {
        assert!(faces.contains_key(key), "missing inward face {key:?}");
    }
    // Each arm is otherwise surrounded by Air: 6 solids x 6 faces.
    assert_eq!(faces.len(), 36);
}

#[test]
fn border_neighbors_hide_faces() {
    let solid = Voxel::solid(Rgba::rgb(100, 100, 100));
    let open = input_from_fn(ChunkPos::new(0, 0, 0), |x, y, z| {
        if (0..16).contains(&x) && (0..16).contains(&y) && (0..16).contains(&z) && y == 0 {
            solid
        } else {
            Voxel::AIR
        }
    });
    let closed = input_from_fn(ChunkPos::new(0, 0, 0), |_, y, _| if y <= 0 { solid } else { Voxel::AIR });

    let open_faces = rasterize(&build_mesh(&open, MeshStrategy::Greedy)).unwrap();
    let closed_faces = rasterize(&build_mesh(&closed, MeshStrategy::Greedy)).unwrap();
    // The open slab shows all six sides; with solid neighbors only the top remains.
    assert_eq!(open_faces.len(), 256 * 2 + 16 * 4);
    assert_eq!(closed_faces.len(), 256);
    assert!(closed_faces.keys().all(|k| k.face == Face::PosY));
    assert_eq!(build_mesh(&closed, MeshStrategy::Greedy).opaque_triangle_count(), 2);
}

#[test]
fn collision_mesh_ignores_liquids() {
    let input = mixed_input();
    let mesh = build_mesh(&input, MeshStrategy::Greedy);
    let collision = mesh.collision();
    assert_eq!(collision.triangle_count(), mesh.opaque_triangle_count());
    assert!(mesh.transparent_triangle_count() > 0);
    assert!(collision.positions.len() <= mesh.vertices.len());
}
