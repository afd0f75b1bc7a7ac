//! Rasterize chunk meshes back into unit faces.

use glam::IVec3;
use hashbrown::{HashMap, HashSet};
use voxterra_core::coords::Face;
use voxterra_core::types::Rgba;
use voxterra_mesh::{face_attr, ChunkMesh, FaceAttr, MeshInput};

use crate::{Result, TestError};

/// A unit face: the chunk-local cell that owns it and its direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceCell {
    pub face: Face,
    pub cell: IVec3,
}

/// Unit face recovered from a mesh, with the attributes its quad carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterFace {
    pub at: FaceCell,
    pub attr: FaceAttr,
}

fn face_from_normal(normal: [f32; 3]) -> Option<Face> {
    let axis = normal.iter().position(|c| c.abs() > 0.5)?;
    Some(Face::from_axis(axis, normal[axis] > 0.0))
}

fn color_from_f32(c: [f32; 4]) -> Rgba {
    let q = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba::new(q(c[0]), q(c[1]), q(c[2]), q(c[3]))
}

/// Every unit face covered by `mesh`, keyed by cell and direction.
///
/// Quads are read as runs of four vertices. Fails when a quad is not
/// axis-aligned or when two quads cover the same unit face.
pub fn rasterize(mesh: &ChunkMesh) -> Result<HashMap<FaceCell, FaceAttr>> {
    if mesh.vertices.len() % 4 != 0 {
        return Err(TestError::MeshLayout(format!(
            "{} vertices is not a whole number of quads",
            mesh.vertices.len()
        )));
    }
    let transparent: HashSet<u32> = mesh.transparent_indices.iter().map(|i| i / 4).collect();

    let mut faces = HashMap::new();
    for (quad_index, quad) in mesh.vertices.chunks_exact(4).enumerate() {
        let face = face_from_normal(quad[0].normal)
            .ok_or_else(|| TestError::MeshLayout(format!("quad {quad_index} has no normal")))?;
        let axis = face.axis();
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);

        let mut min = IVec3::splat(i32::MAX);
        let mut max = IVec3::splat(i32::MIN);
        for vertex in quad {
            let p = IVec3::new(
                vertex.position[0].round() as i32,
                vertex.position[1].round() as i32,
                vertex.position[2].round() as i32,
            );
            min = min.min(p);
            max = max.max(p);
        }
        if min[axis] != max[axis] {
            return Err(TestError::MeshLayout(format!("quad {quad_index} is not planar")));
        }

        let attr = FaceAttr {
            color: color_from_f32(quad[0].color),
            transparent: transparent.contains(&(quad_index as u32)),
        };
        let plane = if face.is_positive() { min[axis] - 1 } else { min[axis] };
        for b in min[v]..max[v] {
            for a in min[u]..max[u] {
                let mut cell = IVec3::ZERO;
                cell[axis] = plane;
                cell[u] = a;
                cell[v] = b;
                let key = FaceCell { face, cell };
                if faces.insert(key, attr).is_some() {
                    return Err(TestError::MeshLayout(format!(
                        "face {face:?} of cell {cell} is covered twice"
                    )));
                }
            }
        }
    }
    Ok(faces)
}

/// The faces the per-voxel visibility rule predicts for the chunk interior.
pub fn expected_faces(input: &MeshInput) -> HashMap<FaceCell, FaceAttr> {
    let mut faces = HashMap::new();
    for z in 0..16 {
        for y in 0..16 {
            for x in 0..16 {
                let cell = IVec3::new(x, y, z);
                let voxel = input.get(x, y, z);
                for face in Face::ALL {
                    let n = cell + face.offset();
                    if let Some(attr) = face_attr(voxel, input.get(n.x, n.y, n.z)) {
                        faces.insert(FaceCell { face, cell }, attr);
                    }
                }
            }
        }
    }
    faces
}

/// Flatten a rasterized map into a list ordered by cell then face.
pub fn sorted_faces(faces: &HashMap<FaceCell, FaceAttr>) -> Vec<RasterFace> {
    let mut out: Vec<RasterFace> = faces.iter().map(|(&at, &attr)| RasterFace { at, attr }).collect();
    out.sort_by_key(|f| (f.at.cell.z, f.at.cell.y, f.at.cell.x, f.at.face.axis(), f.at.face.is_positive()));
    out
}
