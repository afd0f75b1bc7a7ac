//! Padded voxel input for meshing.

use voxterra_core::constants::CHUNK_SIZE;
use voxterra_core::coords::{ChunkPos, Face, LocalPos};
use voxterra_core::types::Voxel;
use voxterra_voxel::Chunk;

/// Edge length of the padded volume (one voxel of border on every side).
pub const PADDED: usize = CHUNK_SIZE + 2;

/// Chunk voxels plus a one-voxel border copied from the six face neighbors.
///
/// This is a plain value copy, so it can be moved to a worker thread while
/// the source chunk keeps being edited. Border cells of unloaded neighbors
/// are Air. Edge and corner border cells are never read by the mesher and
/// stay Air.
#[derive(Clone, Debug)]
pub struct MeshInput {
    pos: ChunkPos,
    voxels: Vec<Voxel>,
}

impl MeshInput {
    /// An all-air input.
    pub fn empty(pos: ChunkPos) -> Self {
        Self {
            pos,
            voxels: vec![Voxel::AIR; PADDED * PADDED * PADDED],
        }
    }

    /// Copy a chunk and the facing layers of its loaded neighbors.
    ///
    /// `neighbors` is in [`Face::ALL`] order, matching
    /// [`ChunkPos::neighbors`].
    pub fn from_chunk(chunk: &Chunk, neighbors: [Option<&Chunk>; 6]) -> Self {
        let mut input = Self::empty(chunk.pos());
        for local in Chunk::local_positions() {
            let p = local.to_ivec3();
            input.set(p.x, p.y, p.z, chunk.get(local));
        }

        let last = CHUNK_SIZE as i32 - 1;
        let size = CHUNK_SIZE as i32;
        for (face, neighbor) in Face::ALL.into_iter().zip(neighbors) {
            let Some(neighbor) = neighbor else { continue };
            let axis = face.axis();
            // Layer of the neighbor that touches this chunk, and where it lands in the padding.
            let (src, dst) = if face.is_positive() { (0, size) } else { (last, -1) };
            for a in 0..size {
                for b in 0..size {
                    let mut s = [0; 3];
                    s[axis] = src;
                    s[(axis + 1) % 3] = a;
                    s[(axis + 2) % 3] = b;
                    let mut d = s;
                    d[axis] = dst;
                    let voxel = neighbor.get(LocalPos::new(s[0] as u8, s[1] as u8, s[2] as u8));
                    input.set(d[0], d[1], d[2], voxel);
                }
            }
        }
        input
    }

    /// Build from an unpadded 16³ voxel array (no neighbors).
    pub fn from_voxels(pos: ChunkPos, voxels: &[Voxel]) -> Self {
        let mut input = Self::empty(pos);
        for (i, &voxel) in voxels.iter().enumerate().take(CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) {
            let p = LocalPos::from_index(i).to_ivec3();
            input.set(p.x, p.y, p.z, voxel);
        }
        input
    }

    /// Chunk this input was taken from.
    #[inline]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        let range = -1..=CHUNK_SIZE as i32;
        if range.contains(&x) && range.contains(&y) && range.contains(&z) {
            let (x, y, z) = ((x + 1) as usize, (y + 1) as usize, (z + 1) as usize);
            Some(x + y * PADDED + z * PADDED * PADDED)
        } else {
            None
        }
    }

    /// Voxel at chunk-local coordinates in `-1..=16`; Air outside that range.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Voxel {
        Self::index(x, y, z).map_or(Voxel::AIR, |i| self.voxels[i])
    }

    /// Write a voxel at chunk-local coordinates in `-1..=16`; no-op outside.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: i32, voxel: Voxel) {
        if let Some(i) = Self::index(x, y, z) {
            self.voxels[i] = voxel;
        }
    }

    /// Whether the chunk interior holds no solid or liquid voxel.
    pub fn is_interior_empty(&self) -> bool {
        let size = CHUNK_SIZE as i32;
        (0..size).all(|z| (0..size).all(|y| (0..size).all(|x| self.get(x, y, z).is_air())))
    }
}
