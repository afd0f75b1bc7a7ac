//! One quad per visible voxel face.
//!
//! Uses the same visibility rule as the greedy mesher and therefore covers
//! exactly the same faces, just without merging.

use crate::greedy::cell;
use crate::input::MeshInput;
use crate::mesh::{face_attr, Quad};
use voxterra_core::constants::CHUNK_SIZE;
use voxterra_core::coords::{Face, LocalPos};

/// Unit quads for every visible face.
pub fn naive_quads(input: &MeshInput) -> Vec<Quad> {
    let mut quads = Vec::new();
    for face in Face::ALL {
        let o = face.offset();
        for slice in 0..CHUNK_SIZE {
            for j in 0..CHUNK_SIZE {
                for i in 0..CHUNK_SIZE {
                    let [x, y, z] = cell(face, slice, i, j);
                    let Some(attr) = face_attr(input.get(x, y, z), input.get(x + o.x, y + o.y, z + o.z))
                    else {
                        continue;
                    };
                    quads.push(Quad {
                        face,
                        origin: LocalPos::new(x as u8, y as u8, z as u8),
                        width: 1,
                        height: 1,
                        attr,
                    });
                }
            }
        }
    }
    quads
}
