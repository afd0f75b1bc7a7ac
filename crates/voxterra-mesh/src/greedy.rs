//! Greedy meshing.
//!
//! For every axis and direction the chunk is scanned slice by slice. Each
//! slice yields a 16x16 face mask; unvisited mask cells are grown into the
//! largest rectangle first along the first in-slice axis, then along the
//! second, as long as every covered cell carries identical face attributes.

use crate::input::MeshInput;
use crate::mesh::{face_attr, FaceAttr, Quad};
use voxterra_core::constants::CHUNK_SIZE;
use voxterra_core::coords::{Face, LocalPos};

const N: usize = CHUNK_SIZE;

/// Merged quads for the whole chunk.
pub fn greedy_quads(input: &MeshInput) -> Vec<Quad> {
    let mut quads = Vec::new();
    let mut mask: [Option<FaceAttr>; N * N] = [None; N * N];
    let mut visited = [false; N * N];

    for face in Face::ALL {
        for slice in 0..N {
            fill_mask(input, face, slice, &mut mask);
            visited.fill(false);
            merge_slice(face, slice, &mask, &mut visited, &mut quads);
        }
    }
    quads
}

/// Cell coordinates for `(slice, i, j)` on a face's axis frame.
#[inline]
pub(crate) fn cell(face: Face, slice: usize, i: usize, j: usize) -> [i32; 3] {
    let axis = face.axis();
    let mut p = [0i32; 3];
    p[axis] = slice as i32;
    p[(axis + 1) % 3] = i as i32;
    p[(axis + 2) % 3] = j as i32;
    p
}

fn fill_mask(input: &MeshInput, face: Face, slice: usize, mask: &mut [Option<FaceAttr>; N * N]) {
    let o = face.offset();
    for j in 0..N {
        for i in 0..N {
            let [x, y, z] = cell(face, slice, i, j);
            mask[i + j * N] = face_attr(input.get(x, y, z), input.get(x + o.x, y + o.y, z + o.z));
        }
    }
}

fn merge_slice(
    face: Face,
    slice: usize,
    mask: &[Option<FaceAttr>; N * N],
    visited: &mut [bool; N * N],
    quads: &mut Vec<Quad>,
) {
    for j in 0..N {
        let mut i = 0;
        while i < N {
            let Some(attr) = mask[i + j * N].filter(|_| !visited[i + j * N]) else {
                i += 1;
                continue;
            };
            let matches = |x: usize, y: usize, visited: &[bool; N * N]| {
                mask[x + y * N] == Some(attr) && !visited[x + y * N]
            };

            let mut width = 1;
            while i + width < N && matches(i + width, j, visited) {
                width += 1;
            }

            let mut height = 1;
            'grow: while j + height < N {
                for x in i..i + width {
                    if !matches(x, j + height, visited) {
                        break 'grow;
                    }
                }
                height += 1;
            }

            for y in j..j + height {
                for x in i..i + width {
                    visited[x + y * N] = true;
                }
            }

            let [x, y, z] = cell(face, slice, i, j);
            quads.push(Quad {
                face,
                origin: LocalPos::new(x as u8, y as u8, z as u8),
                width: width as u8,
                height: height as u8,
                attr,
            });
            i += width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive::naive_quads;
    use hashbrown::HashSet;
    use voxterra_core::coords::ChunkPos;
    use voxterra_core::types::{Rgba, Voxel};

    fn stone() -> Voxel {
        Voxel::solid(Rgba::rgb(128, 128, 128))
    }

    fn covered(quads: &[Quad]) -> Vec<(Face, LocalPos)> {
        let mut cells: Vec<_> = quads
            .iter()
            .flat_map(|q| q.cells().map(move |c| (q.face, c)))
            .collect();
        cells.sort_by_key(|(f, c)| (f.axis(), f.is_positive(), c.to_index()));
        cells
    }

    /// Deterministic pseudo-random chunk with a few colors and some water.
    fn noisy_input() -> MeshInput {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        let palette = [
            Voxel::AIR,
            stone(),
            Voxel::solid(Rgba::rgb(90, 60, 30)),
            Voxel::liquid(Rgba::new(40, 80, 200, 150)),
        ];
        let mut state = 0x2545_f491_u32;
        for z in -1..=16 {
            for y in -1..=16 {
                for x in -1..=16 {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    // Bias toward large uniform regions so merging happens.
                    let v = if y < 6 { 1 } else if y > 11 { 0 } else { (state % 4) as usize };
                    input.set(x, y, z, palette[v]);
                }
            }
        }
        input
    }

    #[test]
    fn solid_cube_merges_to_six_quads() {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        for z in 0..16 {
            for y in 0..16 {
                for x in 0..16 {
                    input.set(x, y, z, stone());
                }
            }
        }
        let quads = greedy_quads(&input);
        assert_eq!(quads.len(), 6);
        assert!(quads.iter().all(|q| q.area() == 256));
    }

    #[test]
    fn coverage_matches_naive() {
        let input = noisy_input();
        let greedy = greedy_quads(&input);
        let naive = naive_quads(&input);
        assert!(greedy.len() < naive.len());
        assert_eq!(covered(&greedy), covered(&naive));
    }

    #[test]
    fn quads_do_not_overlap() {
        let greedy = greedy_quads(&noisy_input());
        let mut seen = HashSet::new();
        for q in &greedy {
            for c in q.cells() {
                assert!(seen.insert((q.face, c)), "overlap at {c:?} on {:?}", q.face);
            }
        }
    }

    #[test]
    fn merges_never_cross_attribute_boundaries() {
        let input = noisy_input();
        for q in greedy_quads(&input) {
            let o = q.face.offset();
            for c in q.cells() {
                let p = c.to_ivec3();
                let attr = face_attr(input.get(p.x, p.y, p.z), input.get(p.x + o.x, p.y + o.y, p.z + o.z));
                assert_eq!(attr, Some(q.attr));
            }
        }
    }

    #[test]
    fn color_boundary_splits_quads() {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        input.set(0, 0, 0, Voxel::solid(Rgba::RED));
        input.set(1, 0, 0, Voxel::solid(Rgba::WHITE));
        let top: Vec<_> = greedy_quads(&input)
            .into_iter()
            .filter(|q| q.face == Face::PosY)
            .collect();
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn stacked_solids_share_no_face() {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        input.set(4, 4, 4, stone());
        input.set(4, 5, 4, stone());
        let quads = greedy_quads(&input);
        assert!(!quads
            .iter()
            .any(|q| q.face == Face::PosY && q.origin == LocalPos::new(4, 4, 4)));
        assert!(!quads
            .iter()
            .any(|q| q.face == Face::NegY && q.origin == LocalPos::new(4, 5, 4)));
        // Side faces of the column merge vertically: 4 sides + top + bottom.
        assert_eq!(quads.len(), 6);
    }

    #[test]
    fn solid_against_air_emits_one_face() {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        input.set(8, 8, 8, stone());
        let quads = greedy_quads(&input);
        assert_eq!(quads.len(), 6);
        for face in Face::ALL {
            assert_eq!(quads.iter().filter(|q| q.face == face).count(), 1);
        }
    }

    #[test]
    fn adjacent_liquids_emit_no_shared_face() {
        let water = Voxel::liquid(Rgba::new(0, 0, 255, 128));
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        input.set(3, 3, 3, water);
        input.set(4, 3, 3, water);
        let quads = greedy_quads(&input);
        assert!(!quads
            .iter()
            .any(|q| q.face == Face::PosX && q.origin == LocalPos::new(3, 3, 3)));
        assert!(!quads
            .iter()
            .any(|q| q.face == Face::NegX && q.origin == LocalPos::new(4, 3, 3)));
        assert!(quads.iter().all(|q| q.attr.transparent));
    }

    #[test]
    fn faces_toward_loaded_neighbor_are_culled() {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        input.set(15, 0, 0, stone());
        input.set(16, 0, 0, stone());
        assert!(!greedy_quads(&input).iter().any(|q| q.face == Face::PosX));
    }
}
