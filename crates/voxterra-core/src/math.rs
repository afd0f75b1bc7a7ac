//! Bounding volumes and view-volume culling.

use glam::{Mat4, Vec3, Vec4};

/// Axis-aligned box in world space, used for chunk bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box padded by `amount` on every side.
    #[inline]
    #[must_use]
    pub fn expanded(&self, amount: f32) -> Self {
        let pad = Vec3::splat(amount);
        Self::new(self.min - pad, self.max + pad)
    }

    /// Corner furthest along `direction`.
    #[inline]
    pub fn support(&self, direction: Vec3) -> Vec3 {
        Vec3::select(direction.cmpge(Vec3::ZERO), self.max, self.min)
    }
}

/// Six clip planes `(nx, ny, nz, d)` with normals pointing inward.
///
/// Plane order is left, right, bottom, top, near, far. Depth is assumed to be
/// in the `0..1` range, as produced by glam's `perspective_rh`.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Gribb/Hartmann plane extraction from a combined view-projection matrix.
    pub fn from_view_projection(view_projection: Mat4) -> Self {
        let [x, y, z, w] = [0, 1, 2, 3].map(|i| view_projection.row(i));
        let planes = [w + x, w - x, w + y, w - y, z, w - z].map(unit_plane);
        Self { planes }
    }

    /// False only when the box lies entirely outside one of the planes.
    pub fn test_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            normal.dot(aabb.support(normal)) + plane.w >= 0.0
        })
    }
}

fn unit_plane(plane: Vec4) -> Vec4 {
    let len = plane.truncate().length();
    if len > f32::EPSILON {
        plane / len
    } else {
        plane
    }
}
