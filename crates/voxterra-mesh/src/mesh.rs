//! Mesh output types and the per-face visibility rule.

use bytemuck::{Pod, Zeroable};
use glam::IVec3;
use voxterra_core::coords::{ChunkPos, Face, LocalPos};
use voxterra_core::types::{Rgba, Voxel, VoxelKind};

/// Attributes a face carries; merges only join faces with equal attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceAttr {
    pub color: Rgba,
    pub transparent: bool,
}

/// Face emitted by `cell` toward `neighbor`, if any.
///
/// Solid cells show a face toward anything that is not solid. Liquid cells
/// show a face toward air or solid, never toward another liquid.
#[inline]
pub fn face_attr(cell: Voxel, neighbor: Voxel) -> Option<FaceAttr> {
    let visible = match cell.kind {
        VoxelKind::Air => false,
        VoxelKind::Solid => !neighbor.is_solid(),
        VoxelKind::Liquid => neighbor.is_air() || neighbor.is_solid(),
    };
    visible.then_some(FaceAttr {
        color: cell.color,
        transparent: cell.is_liquid(),
    })
}

/// A merged rectangle of faces on one slice.
///
/// `origin` is the chunk-local cell at the rectangle's minimum corner;
/// `width` spans the first in-slice axis (`(axis + 1) % 3`) and `height` the
/// second (`(axis + 2) % 3`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quad {
    pub face: Face,
    pub origin: LocalPos,
    pub width: u8,
    pub height: u8,
    pub attr: FaceAttr,
}

impl Quad {
    /// Cells whose face this quad covers.
    pub fn cells(&self) -> impl Iterator<Item = LocalPos> + '_ {
        let axis = self.face.axis();
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        let origin = self.origin.to_ivec3();
        (0..i32::from(self.height)).flat_map(move |j| {
            (0..i32::from(self.width)).map(move |i| {
                let mut p = origin;
                p[u] += i;
                p[v] += j;
                LocalPos::new(p.x as u8, p.y as u8, p.z as u8)
            })
        })
    }

    /// Number of unit faces covered.
    #[inline]
    pub fn area(&self) -> u32 {
        u32::from(self.width) * u32::from(self.height)
    }
}

/// Vertex layout handed to the render backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    /// Chunk-local position.
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    /// Texture coordinates scaled to the merged size.
    pub uv: [f32; 2],
}

/// Geometry for one chunk: a shared vertex buffer and two index lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub pos: ChunkPos,
    pub vertices: Vec<MeshVertex>,
    pub opaque_indices: Vec<u32>,
    pub transparent_indices: Vec<u32>,
}

/// Collision geometry built from the opaque triangles only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl CollisionMesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl ChunkMesh {
    /// Triangulate quads into a mesh.
    pub fn from_quads(pos: ChunkPos, quads: &[Quad]) -> Self {
        let mut mesh = Self {
            pos,
            vertices: Vec::with_capacity(quads.len() * 4),
            ..Self::default()
        };
        for quad in quads {
            mesh.push_quad(quad);
        }
        mesh
    }

    fn push_quad(&mut self, quad: &Quad) {
        let axis = quad.face.axis();
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        let mut origin = quad.origin.to_ivec3();
        if quad.face.is_positive() {
            origin[axis] += 1;
        }
        let mut du = IVec3::ZERO;
        du[u] = i32::from(quad.width);
        let mut dv = IVec3::ZERO;
        dv[v] = i32::from(quad.height);

        let (w, h) = (f32::from(quad.width), f32::from(quad.height));
        // e_u x e_v points along +axis, so this order is counter-clockwise
        // seen from the positive side.
        let mut corners = [
            (origin, [0.0, 0.0]),
            (origin + du, [w, 0.0]),
            (origin + du + dv, [w, h]),
            (origin + dv, [0.0, h]),
        ];
        if !quad.face.is_positive() {
            corners.swap(1, 3);
        }

        let normal = quad.face.normal().to_array();
        let color = quad.attr.color.to_f32();
        let base = self.vertices.len() as u32;
        self.vertices.extend(corners.iter().map(|(p, uv)| MeshVertex {
            position: p.as_vec3().to_array(),
            normal,
            color,
            uv: *uv,
        }));
        let indices = if quad.attr.transparent {
            &mut self.transparent_indices
        } else {
            &mut self.opaque_indices
        };
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.opaque_indices.is_empty() && self.transparent_indices.is_empty()
    }

    pub fn opaque_triangle_count(&self) -> usize {
        self.opaque_indices.len() / 3
    }

    pub fn transparent_triangle_count(&self) -> usize {
        self.transparent_indices.len() / 3
    }

    /// Collision geometry from the opaque triangles, with vertices compacted.
    pub fn collision(&self) -> CollisionMesh {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut out = CollisionMesh::default();
        for &index in &self.opaque_indices {
            let slot = &mut remap[index as usize];
            if *slot == u32::MAX {
                *slot = out.positions.len() as u32;
                out.positions.push(self.vertices[index as usize].position);
            }
            out.indices.push(*slot);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn stone() -> Voxel {
        Voxel::solid(Rgba::rgb(128, 128, 128))
    }

    fn water() -> Voxel {
        Voxel::liquid(Rgba::new(0, 0, 255, 128))
    }

    #[test]
    fn face_rule() {
        assert!(face_attr(stone(), Voxel::AIR).is_some());
        assert!(face_attr(stone(), water()).is_some());
        assert!(face_attr(stone(), stone()).is_none());
        assert!(face_attr(water(), Voxel::AIR).is_some());
        assert!(face_attr(water(), stone()).is_some());
        assert!(face_attr(water(), water()).is_none());
        assert!(face_attr(Voxel::AIR, stone()).is_none());
        assert!(face_attr(water(), Voxel::AIR).unwrap().transparent);
    }

    fn quad(face: Face) -> Quad {
        Quad {
            face,
            origin: LocalPos::new(1, 2, 3),
            width: 2,
            height: 3,
            attr: FaceAttr {
                color: Rgba::RED,
                transparent: false,
            },
        }
    }

    #[test]
    fn quad_cells_cover_area() {
        let q = quad(Face::PosY);
        let cells: Vec<_> = q.cells().collect();
        assert_eq!(cells.len(), 6);
        // PosY: width spans z, height spans x.
        assert!(cells.contains(&LocalPos::new(3, 2, 4)));
        assert!(cells.iter().all(|c| c.y == 2));
    }

    #[test]
    fn winding_faces_outward() {
        for face in Face::ALL {
            let mesh = ChunkMesh::from_quads(ChunkPos::new(0, 0, 0), &[quad(face)]);
            let p = |i: u32| Vec3::from(mesh.vertices[i as usize].position);
            let idx = &mesh.opaque_indices;
            let n = (p(idx[1]) - p(idx[0])).cross(p(idx[2]) - p(idx[0]));
            assert!(n.normalize().dot(face.normal()) > 0.99, "{face:?}");
        }
    }

    #[test]
    fn positive_face_sits_on_far_side() {
        let mesh = ChunkMesh::from_quads(ChunkPos::new(0, 0, 0), &[quad(Face::PosX)]);
        assert!(mesh.vertices.iter().all(|v| (v.position[0] - 2.0).abs() < f32::EPSILON));
        let mesh = ChunkMesh::from_quads(ChunkPos::new(0, 0, 0), &[quad(Face::NegX)]);
        assert!(mesh.vertices.iter().all(|v| (v.position[0] - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn collision_uses_opaque_only() {
        let mut liquid = quad(Face::PosY);
        liquid.attr.transparent = true;
        let mesh = ChunkMesh::from_quads(ChunkPos::new(0, 0, 0), &[quad(Face::NegY), liquid]);
        assert_eq!(mesh.opaque_triangle_count(), 2);
        assert_eq!(mesh.transparent_triangle_count(), 2);
        let collision = mesh.collision();
        assert_eq!(collision.triangle_count(), 2);
        assert_eq!(collision.positions.len(), 4);
    }
}
