//! Quarter-turn rotation around the vertical axis.
//!
//! Rotations act on the integer lattice of a structure's bounding box. One
//! clockwise step (seen from above, north = -Z, east = +X) maps a local cell
//! `(x, z)` of a box with horizontal size `(sx, sz)` to `(sz - 1 - z, x)` in a
//! box of size `(sz, sx)`. Larger rotations are the closed forms of repeating
//! that step, so four steps are the identity.

use bitflags::bitflags;
use glam::{IVec3, UVec3};
use serde::{Deserialize, Serialize};
use voxterra_core::types::Facing;

/// Rotation of a placed structure, named after where its front ends up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Default orientation (0°).
    #[default]
    North,
    /// 90° clockwise.
    East,
    /// 180°.
    South,
    /// 270° clockwise.
    West,
}

impl Rotation {
    /// All rotations in clockwise order.
    pub const ALL: [Rotation; 4] = [
        Rotation::North,
        Rotation::East,
        Rotation::South,
        Rotation::West,
    ];

    /// Number of clockwise quarter turns.
    #[inline]
    pub const fn steps(self) -> u8 {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Rotation for a number of quarter turns, wrapping modulo four.
    #[inline]
    pub const fn from_steps(steps: u8) -> Self {
        match steps % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }

    /// Rotation from degrees (multiples of 90).
    pub const fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::North),
            90 => Some(Rotation::East),
            180 => Some(Rotation::South),
            270 => Some(Rotation::West),
            _ => None,
        }
    }

    /// Compose two rotations.
    #[inline]
    pub const fn then(self, other: Rotation) -> Self {
        Self::from_steps(self.steps() + other.steps())
    }

    /// Flag for this rotation in a [`RotationSet`].
    #[inline]
    pub const fn flag(self) -> RotationSet {
        match self {
            Rotation::North => RotationSet::NORTH,
            Rotation::East => RotationSet::EAST,
            Rotation::South => RotationSet::SOUTH,
            Rotation::West => RotationSet::WEST,
        }
    }

    /// Horizontal extents after rotation.
    #[inline]
    pub const fn rotate_size(self, size: UVec3) -> UVec3 {
        if self.steps() % 2 == 1 {
            UVec3::new(size.z, size.y, size.x)
        } else {
            size
        }
    }

    /// Map a local cell of a box with the given (unrotated) size.
    #[inline]
    pub const fn rotate_local(self, p: IVec3, size: UVec3) -> IVec3 {
        let sx = size.x as i32;
        let sz = size.z as i32;
        match self {
            Rotation::North => p,
            Rotation::East => IVec3::new(sz - 1 - p.z, p.y, p.x),
            Rotation::South => IVec3::new(sx - 1 - p.x, p.y, sz - 1 - p.z),
            Rotation::West => IVec3::new(p.z, p.y, sx - 1 - p.x),
        }
    }

    /// Rotate a facing by this rotation.
    #[inline]
    pub const fn rotate_facing(self, facing: Facing) -> Facing {
        facing.rotated_cw(self.steps())
    }
}

bitflags! {
    /// Set of rotations a structure may be placed with.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RotationSet: u8 {
        const NORTH = 0b0001;
        const EAST = 0b0010;
        const SOUTH = 0b0100;
        const WEST = 0b1000;
    }
}

impl Default for RotationSet {
    fn default() -> Self {
        Self::all()
    }
}

impl RotationSet {
    /// Allowed rotations in clockwise order.
    pub fn rotations(self) -> Vec<Rotation> {
        Rotation::ALL
            .into_iter()
            .filter(|r| self.contains(r.flag()))
            .collect()
    }

    /// Build a set from degree values, ignoring anything not a quarter turn.
    pub fn from_degrees(degrees: &[u32]) -> Self {
        degrees
            .iter()
            .filter_map(|&d| Rotation::from_degrees(d))
            .fold(Self::empty(), |set, r| set | r.flag())
    }

    /// Degree values of the allowed rotations.
    pub fn to_degrees(self) -> Vec<u32> {
        self.rotations()
            .into_iter()
            .map(|r| u32::from(r.steps()) * 90)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_step_matches_formula() {
        let size = UVec3::new(3, 1, 2);
        // North-west corner moves to the north-east corner of the rotated box.
        assert_eq!(
            Rotation::East.rotate_local(IVec3::new(0, 0, 0), size),
            IVec3::new(1, 0, 0)
        );
        assert_eq!(Rotation::East.rotate_size(size), UVec3::new(2, 1, 3));
    }

    #[test]
    fn closed_forms_match_repeated_steps() {
        let size = UVec3::new(4, 2, 3);
        for x in 0..4 {
            for z in 0..3 {
                let p = IVec3::new(x, 1, z);
                let mut q = p;
                let mut s = size;
                for steps in 1..4u8 {
                    q = Rotation::East.rotate_local(q, s);
                    s = Rotation::East.rotate_size(s);
                    let rot = Rotation::from_steps(steps);
                    assert_eq!(rot.rotate_local(p, size), q, "steps {steps} at {p}");
                    assert_eq!(rot.rotate_size(size), s);
                }
            }
        }
    }

    #[test]
    fn rotated_cells_stay_in_bounds() {
        let size = UVec3::new(5, 1, 2);
        for rot in Rotation::ALL {
            let out = rot.rotate_size(size).as_ivec3();
            for x in 0..5 {
                for z in 0..2 {
                    let q = rot.rotate_local(IVec3::new(x, 0, z), size);
                    assert!(q.x >= 0 && q.x < out.x && q.z >= 0 && q.z < out.z);
                }
            }
        }
    }

    #[test]
    fn rotation_set_degrees() {
        let set = RotationSet::from_degrees(&[0, 180, 45]);
        assert_eq!(set.rotations(), vec![Rotation::North, Rotation::South]);
        assert_eq!(set.to_degrees(), vec![0, 180]);
        assert!(RotationSet::empty().rotations().is_empty());
    }

    #[test]
    fn compose_wraps() {
        assert_eq!(Rotation::West.then(Rotation::East), Rotation::North);
        assert_eq!(Rotation::South.then(Rotation::South), Rotation::North);
    }
}
