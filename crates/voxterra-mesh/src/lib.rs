//! Chunk meshing for the Voxterra terrain engine.
//!
//! Converts a chunk plus its face neighbors into triangle geometry:
//! - [`greedy`] merges coplanar faces with identical attributes
//! - [`naive`] emits one quad per visible face
//! - [`scheduler`] runs either off the simulation thread
//! - [`backend`] is the seam to the render/collision collaborator

pub mod backend;
pub mod greedy;
pub mod input;
pub mod mesh;
pub mod naive;
pub mod scheduler;

pub use backend::{apply_mesh, release_geometry, GeometryBackend, RecordedGeometry, RecordingBackend};
pub use input::MeshInput;
pub use mesh::{face_attr, ChunkMesh, CollisionMesh, FaceAttr, MeshVertex, Quad};
pub use scheduler::{MeshJob, MeshJobError, MeshScheduler, MeshWorkResult};

/// Meshing algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeshStrategy {
    /// Merge faces into maximal rectangles.
    #[default]
    Greedy,
    /// One quad per face.
    Naive,
}

/// Build a chunk mesh synchronously.
///
/// An input with no solid or liquid voxels yields an empty mesh.
pub fn build_mesh(input: &MeshInput, strategy: MeshStrategy) -> ChunkMesh {
    if input.is_interior_empty() {
        return ChunkMesh {
            pos: input.pos(),
            ..ChunkMesh::default()
        };
    }
    let quads = match strategy {
        MeshStrategy::Greedy => greedy::greedy_quads(input),
        MeshStrategy::Naive => naive::naive_quads(input),
    };
    ChunkMesh::from_quads(input.pos(), &quads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxterra_core::coords::ChunkPos;
    use voxterra_core::types::{Rgba, Voxel};

    #[test]
    fn empty_chunk_yields_empty_mesh() {
        let input = MeshInput::empty(ChunkPos::new(2, 0, -1));
        for strategy in [MeshStrategy::Greedy, MeshStrategy::Naive] {
            let mesh = build_mesh(&input, strategy);
            assert!(mesh.is_empty());
            assert_eq!(mesh.pos, ChunkPos::new(2, 0, -1));
        }
    }

    #[test]
    fn strategies_cover_same_area() {
        let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
        for x in 0..5 {
            for z in 0..4 {
                input.set(x, 0, z, Voxel::solid(Rgba::RED));
            }
        }
        input.set(2, 1, 2, Voxel::liquid(Rgba::new(0, 0, 255, 100)));
        let area = |quads: &[Quad]| quads.iter().map(Quad::area).sum::<u32>();
        let greedy = greedy::greedy_quads(&input);
        let naive = naive::naive_quads(&input);
        assert_eq!(area(&greedy), area(&naive));
        assert!(build_mesh(&input, MeshStrategy::Greedy).vertices.len() < build_mesh(&input, MeshStrategy::Naive).vertices.len());
    }
}
