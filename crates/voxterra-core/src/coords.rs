//! Coordinate systems for the voxel world.

use crate::constants::{CHUNK_BITS, CHUNK_SIZE};
use crate::math::Aabb;
use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// One of the six axis-aligned face directions of a voxel or chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    NegX,
    PosX,
    NegY,
    PosY,
    NegZ,
    PosZ,
}

impl Face {
    /// All faces, ordered by axis then direction.
    pub const ALL: [Face; 6] = [
        Face::NegX,
        Face::PosX,
        Face::NegY,
        Face::PosY,
        Face::NegZ,
        Face::PosZ,
    ];

    /// Build a face from an axis index (0 = x, 1 = y, 2 = z) and direction.
    #[inline]
    pub const fn from_axis(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, false) => Face::NegX,
            (0, true) => Face::PosX,
            (1, false) => Face::NegY,
            (1, true) => Face::PosY,
            (_, false) => Face::NegZ,
            (_, true) => Face::PosZ,
        }
    }

    /// Axis index this face is perpendicular to.
    #[inline]
    pub const fn axis(self) -> usize {
        match self {
            Face::NegX | Face::PosX => 0,
            Face::NegY | Face::PosY => 1,
            Face::NegZ | Face::PosZ => 2,
        }
    }

    /// Whether the face points along the positive axis.
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, Face::PosX | Face::PosY | Face::PosZ)
    }

    /// The face pointing the other way.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Face::NegX => Face::PosX,
            Face::PosX => Face::NegX,
            Face::NegY => Face::PosY,
            Face::PosY => Face::NegY,
            Face::NegZ => Face::PosZ,
            Face::PosZ => Face::NegZ,
        }
    }

    /// Unit offset toward the neighbor across this face.
    #[inline]
    pub const fn offset(self) -> IVec3 {
        match self {
            Face::NegX => IVec3::new(-1, 0, 0),
            Face::PosX => IVec3::new(1, 0, 0),
            Face::NegY => IVec3::new(0, -1, 0),
            Face::PosY => IVec3::new(0, 1, 0),
            Face::NegZ => IVec3::new(0, 0, -1),
            Face::PosZ => IVec3::new(0, 0, 1),
        }
    }

    /// Outward normal as a float vector.
    #[inline]
    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }
}

/// Voxel cell inside a chunk; every axis is in `0..CHUNK_SIZE`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalPos {
    #[inline]
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        debug_assert!((x as usize) < CHUNK_SIZE && (y as usize) < CHUNK_SIZE && (z as usize) < CHUNK_SIZE);
        Self { x, y, z }
    }

    /// `None` when any axis falls outside the chunk; neighbor lookups rely on this.
    #[inline]
    pub const fn checked(x: i32, y: i32, z: i32) -> Option<Self> {
        const EDGE: i32 = CHUNK_SIZE as i32;
        if x < 0 || y < 0 || z < 0 || x >= EDGE || y >= EDGE || z >= EDGE {
            None
        } else {
            Some(Self::new(x as u8, y as u8, z as u8))
        }
    }

    /// Offset into a chunk's dense array (x fastest, then y, then z).
    #[inline]
    pub const fn to_index(self) -> usize {
        ((self.z as usize * CHUNK_SIZE) + self.y as usize) * CHUNK_SIZE + self.x as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        let mask = CHUNK_SIZE - 1;
        let bits = CHUNK_BITS as usize;
        Self::new(
            (index & mask) as u8,
            ((index >> bits) & mask) as u8,
            ((index >> (2 * bits)) & mask) as u8,
        )
    }

    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }

    /// Whether the cell touches the chunk boundary on `face`.
    #[inline]
    pub const fn is_on_face(self, face: Face) -> bool {
        let coord = match face.axis() {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        };
        if face.is_positive() {
            coord as usize == CHUNK_SIZE - 1
        } else {
            coord == 0
        }
    }
}

/// Chunk coordinate; one unit is one chunk edge.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Voxel at the chunk's minimum corner.
    #[inline]
    pub const fn to_world_pos(self) -> WorldPos {
        WorldPos::from_chunk_local(self, LocalPos::new(0, 0, 0))
    }

    /// The six face-adjacent chunks, in [`Face::ALL`] order.
    pub fn neighbors(self) -> [ChunkPos; 6] {
        Face::ALL.map(|face| self.neighbor(face))
    }

    #[inline]
    pub fn neighbor(self, face: Face) -> ChunkPos {
        Self::from(self.to_ivec3() + face.offset())
    }

    /// Squared Euclidean distance in chunk units.
    #[inline]
    pub const fn distance_sq(self, other: ChunkPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// World-space bounds, used for frustum tests.
    pub fn world_aabb(self) -> Aabb {
        let min = self.to_world_pos().to_vec3();
        Aabb::new(min, min + Vec3::splat(CHUNK_SIZE as f32))
    }

    /// Chunk holding a viewer or other float position.
    #[inline]
    pub fn containing(pos: Vec3) -> Self {
        WorldPos::from(pos).chunk_pos()
    }

    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for ChunkPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Absolute voxel coordinate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WorldPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl WorldPos {
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Owning chunk; floors toward negative infinity.
    #[inline]
    pub const fn chunk_pos(self) -> ChunkPos {
        const EDGE: i64 = CHUNK_SIZE as i64;
        ChunkPos::new(
            self.x.div_euclid(EDGE) as i32,
            self.y.div_euclid(EDGE) as i32,
            self.z.div_euclid(EDGE) as i32,
        )
    }

    #[inline]
    pub const fn local_pos(self) -> LocalPos {
        const EDGE: i64 = CHUNK_SIZE as i64;
        LocalPos::new(
            self.x.rem_euclid(EDGE) as u8,
            self.y.rem_euclid(EDGE) as u8,
            self.z.rem_euclid(EDGE) as u8,
        )
    }

    #[inline]
    pub const fn split(self) -> (ChunkPos, LocalPos) {
        (self.chunk_pos(), self.local_pos())
    }

    #[inline]
    pub const fn from_chunk_local(chunk: ChunkPos, local: LocalPos) -> Self {
        const EDGE: i64 = CHUNK_SIZE as i64;
        Self::new(
            chunk.x as i64 * EDGE + local.x as i64,
            chunk.y as i64 * EDGE + local.y as i64,
            chunk.z as i64 * EDGE + local.z as i64,
        )
    }

    #[inline]
    pub const fn offset(self, dx: i64, dy: i64, dz: i64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The voxel across `face`.
    #[inline]
    pub const fn neighbor(self, face: Face) -> Self {
        let o = face.offset();
        self.offset(o.x as i64, o.y as i64, o.z as i64)
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl From<Vec3> for WorldPos {
    fn from(v: Vec3) -> Self {
        let cell = v.floor();
        Self::new(cell.x as i64, cell.y as i64, cell.z as i64)
    }
}
