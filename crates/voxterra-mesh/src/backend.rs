//! Render/collision backend seam.

use crate::mesh::{ChunkMesh, CollisionMesh};
use hashbrown::HashMap;
use tracing::trace;
use voxterra_core::coords::ChunkPos;
use voxterra_voxel::{Chunk, GeometryHandle};

/// Write-only sink for chunk geometry.
///
/// `assign` receives the chunk's current handles and returns the handles that
/// now hold the geometry; a backend should rebuild existing resources in
/// place rather than allocate new ones.
pub trait GeometryBackend {
    fn assign(
        &mut self,
        pos: ChunkPos,
        render: Option<GeometryHandle>,
        collision: Option<GeometryHandle>,
        mesh: &ChunkMesh,
        collision_mesh: &CollisionMesh,
    ) -> (Option<GeometryHandle>, Option<GeometryHandle>);

    fn release(&mut self, pos: ChunkPos, render: Option<GeometryHandle>, collision: Option<GeometryHandle>);
}

/// Hand a freshly built mesh to the backend and record the handles on the chunk.
///
/// The chunk is only marked clean if it was not dirtied again after the
/// snapshot at `revision` was taken. Returns whether it was marked clean.
pub fn apply_mesh(chunk: &mut Chunk, mesh: &ChunkMesh, revision: u64, backend: &mut dyn GeometryBackend) -> bool {
    let collision_mesh = mesh.collision();
    let (render, collision) = backend.assign(
        chunk.pos(),
        chunk.render_handle(),
        chunk.collision_handle(),
        mesh,
        &collision_mesh,
    );
    chunk.set_geometry(render, collision);
    chunk.mark_clean_at(revision)
}

/// Release whatever geometry a chunk owns.
pub fn release_geometry(chunk: &mut Chunk, backend: &mut dyn GeometryBackend) {
    let (render, collision) = chunk.take_geometry();
    if render.is_some() || collision.is_some() {
        backend.release(chunk.pos(), render, collision);
    }
}

/// What a [`RecordingBackend`] holds for one handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedGeometry {
    pub pos: ChunkPos,
    pub vertices: usize,
    pub opaque_triangles: usize,
    pub transparent_triangles: usize,
    pub collision_triangles: usize,
    /// Times this resource was rebuilt in place.
    pub rebuilds: u32,
}

/// In-memory backend that records geometry sizes; used headless and in tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    render: HashMap<GeometryHandle, RecordedGeometry>,
    collision: HashMap<GeometryHandle, usize>,
    released: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> GeometryHandle {
        self.next_id += 1;
        GeometryHandle(self.next_id)
    }

    /// Render resources currently alive.
    pub fn live_count(&self) -> usize {
        self.render.len()
    }

    /// Number of release calls seen.
    pub fn released_count(&self) -> usize {
        self.released
    }

    pub fn get(&self, handle: GeometryHandle) -> Option<&RecordedGeometry> {
        self.render.get(&handle)
    }

    /// Sum of opaque and transparent triangles across live resources.
    pub fn total_triangles(&self) -> usize {
        self.render
            .values()
            .map(|g| g.opaque_triangles + g.transparent_triangles)
            .sum()
    }
}

impl GeometryBackend for RecordingBackend {
    fn assign(
        &mut self,
        pos: ChunkPos,
        render: Option<GeometryHandle>,
        collision: Option<GeometryHandle>,
        mesh: &ChunkMesh,
        collision_mesh: &CollisionMesh,
    ) -> (Option<GeometryHandle>, Option<GeometryHandle>) {
        let render = render
            .filter(|h| self.render.contains_key(h))
            .unwrap_or_else(|| self.allocate());
        let collision = collision
            .filter(|h| self.collision.contains_key(h))
            .unwrap_or_else(|| self.allocate());

        let rebuilds = self.render.get(&render).map_or(0, |g| g.rebuilds + 1);
        self.render.insert(
            render,
            RecordedGeometry {
                pos,
                vertices: mesh.vertices.len(),
                opaque_triangles: mesh.opaque_triangle_count(),
                transparent_triangles: mesh.transparent_triangle_count(),
                collision_triangles: collision_mesh.triangle_count(),
                rebuilds,
            },
        );
        self.collision.insert(collision, collision_mesh.triangle_count());
        trace!(?pos, ?render, rebuilds, "geometry assigned");
        (Some(render), Some(collision))
    }

    fn release(&mut self, pos: ChunkPos, render: Option<GeometryHandle>, collision: Option<GeometryHandle>) {
        if let Some(h) = render {
            self.render.remove(&h);
        }
        if let Some(h) = collision {
            self.collision.remove(&h);
        }
        self.released += 1;
        trace!(?pos, "geometry released");
    }
}
