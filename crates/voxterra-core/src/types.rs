//! Voxel values, colors, facings and the block palette.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Terrain material id used by generators; resolved to a [`Voxel`] through a
/// [`BlockPalette`]. Id 0 is Air.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const STONE: Self = Self(1);
    pub const DIRT: Self = Self(2);
    pub const GRASS: Self = Self(3);
    pub const SNOW: Self = Self(4);
    pub const SAND: Self = Self(5);
    pub const WATER: Self = Self(6);
    pub const LOG: Self = Self(7);
    pub const LEAVES: Self = Self(8);
    pub const FLOWER: Self = Self(9);
    pub const GRAVEL: Self = Self(10);
    pub const CLAY: Self = Self(11);
    pub const ICE: Self = Self(12);
    /// World floor; never carved by caves.
    pub const BEDROCK: Self = Self(13);
    pub const RED_SAND: Self = Self(14);
    pub const MUD: Self = Self(15);
    pub const MOSS: Self = Self(16);
    pub const PODZOL: Self = Self(17);
    pub const MYCELIUM: Self = Self(18);
    pub const TERRACOTTA: Self = Self(19);
    /// Single-voxel vegetation tuft.
    pub const TALL_GRASS: Self = Self(20);
    pub const COBBLESTONE: Self = Self(21);
    pub const CACTUS: Self = Self(22);
    pub const PLANKS: Self = Self(23);

    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }
}

/// 8-bit per channel color.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the color carried by Air.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::new(255, 0, 0, 255);

    /// Create a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Normalized float channels for vertex colors.
    #[inline]
    pub fn to_f32(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }

    /// Linear blend toward `other` by `t` in `[0, 1]`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Physical class of a voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoxelKind {
    /// Empty space
    #[default]
    Air,
    /// Opaque, collidable
    Solid,
    /// Transparent, flowing
    Liquid,
}

/// A single voxel: its kind plus a color.
///
/// Voxels have no identity and are compared by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    /// Physical class
    pub kind: VoxelKind,
    /// Display color
    pub color: Rgba,
}

impl Default for Voxel {
    fn default() -> Self {
        Self::AIR
    }
}

impl Voxel {
    /// The universal empty cell.
    pub const AIR: Self = Self {
        kind: VoxelKind::Air,
        color: Rgba::TRANSPARENT,
    };

    #[inline]
    pub const fn solid(color: Rgba) -> Self {
        Self {
            kind: VoxelKind::Solid,
            color,
        }
    }

    #[inline]
    pub const fn liquid(color: Rgba) -> Self {
        Self {
            kind: VoxelKind::Liquid,
            color,
        }
    }

    #[inline]
    pub const fn is_air(&self) -> bool {
        matches!(self.kind, VoxelKind::Air)
    }

    #[inline]
    pub const fn is_solid(&self) -> bool {
        matches!(self.kind, VoxelKind::Solid)
    }

    #[inline]
    pub const fn is_liquid(&self) -> bool {
        matches!(self.kind, VoxelKind::Liquid)
    }
}

/// Horizontal facing of an entity or structure, clockwise from north.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    North,
    East,
    South,
    West,
}

impl Facing {
    /// All facings in clockwise order.
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Index in clockwise order (north = 0).
    #[inline]
    pub const fn index(self) -> u8 {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }

    /// Facing for an index, wrapping modulo four.
    #[inline]
    pub const fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Facing::North,
            1 => Facing::East,
            2 => Facing::South,
            _ => Facing::West,
        }
    }

    /// Rotate clockwise by `steps` quarter turns.
    #[inline]
    pub const fn rotated_cw(self, steps: u8) -> Self {
        Self::from_index(self.index() + steps % 4)
    }
}

/// Mapping from block ids to voxel values.
#[derive(Clone, Debug)]
pub struct BlockPalette {
    entries: Vec<Option<Voxel>>,
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self::standard()
    }
}

impl BlockPalette {
    /// An empty palette; every lookup other than air is unknown.
    pub fn empty() -> Self {
        Self {
            entries: vec![Some(Voxel::AIR)],
        }
    }

    /// Palette with every built-in block registered.
    pub fn standard() -> Self {
        let mut palette = Self::empty();
        let solids = [
            (BlockId::STONE, Rgba::rgb(128, 128, 128)),
            (BlockId::DIRT, Rgba::rgb(139, 90, 43)),
            (BlockId::GRASS, Rgba::rgb(86, 125, 70)),
            (BlockId::SNOW, Rgba::rgb(236, 238, 245)),
            (BlockId::SAND, Rgba::rgb(215, 199, 133)),
            (BlockId::LOG, Rgba::rgb(94, 68, 42)),
            (BlockId::LEAVES, Rgba::rgb(62, 114, 52)),
            (BlockId::FLOWER, Rgba::rgb(222, 72, 84)),
            (BlockId::GRAVEL, Rgba::rgb(122, 116, 110)),
            (BlockId::CLAY, Rgba::rgb(160, 166, 179)),
            (BlockId::ICE, Rgba::rgb(160, 200, 250)),
            (BlockId::BEDROCK, Rgba::rgb(40, 40, 44)),
            (BlockId::RED_SAND, Rgba::rgb(190, 102, 33)),
            (BlockId::MUD, Rgba::rgb(60, 57, 61)),
            (BlockId::MOSS, Rgba::rgb(89, 110, 45)),
            (BlockId::PODZOL, Rgba::rgb(91, 63, 24)),
            (BlockId::MYCELIUM, Rgba::rgb(111, 99, 107)),
            (BlockId::TERRACOTTA, Rgba::rgb(152, 94, 67)),
            (BlockId::TALL_GRASS, Rgba::rgb(104, 150, 72)),
            (BlockId::COBBLESTONE, Rgba::rgb(110, 110, 110)),
            (BlockId::CACTUS, Rgba::rgb(85, 127, 43)),
            (BlockId::PLANKS, Rgba::rgb(162, 130, 78)),
        ];
        for (id, color) in solids {
            palette.register(id, Voxel::solid(color));
        }
        palette.register(BlockId::WATER, Voxel::liquid(Rgba::new(58, 103, 178, 160)));
        palette
    }

    /// Register (or replace) the voxel for a block id.
    pub fn register(&mut self, id: BlockId, voxel: Voxel) {
        let index = usize::from(id.0);
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some(voxel);
    }

    /// Whether the palette knows this id.
    pub fn contains(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a block id without logging.
    #[inline]
    pub fn get(&self, id: BlockId) -> Option<Voxel> {
        self.entries.get(usize::from(id.0)).copied().flatten()
    }

    /// Resolve a block id to its voxel; unknown ids become air.
    pub fn voxel(&self, id: BlockId) -> Voxel {
        self.get(id).unwrap_or_else(|| {
            warn!(block_id = id.0, "unknown block id, substituting air");
            Voxel::AIR
        })
    }
}
