//! Greedy vs naive meshing throughput.
//!
//! Run with: cargo bench --package voxterra-mesh --bench meshing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voxterra_core::coords::ChunkPos;
use voxterra_core::types::{Rgba, Voxel};
use voxterra_mesh::{build_mesh, MeshInput, MeshStrategy};

/// Rolling hills with a water layer, roughly what terrain chunks look like.
fn terrain_input() -> MeshInput {
    let mut input = MeshInput::empty(ChunkPos::new(0, 0, 0));
    let grass = Voxel::solid(Rgba::rgb(86, 125, 70));
    let dirt = Voxel::solid(Rgba::rgb(139, 90, 43));
    let water = Voxel::liquid(Rgba::new(58, 103, 178, 160));
    for z in -1..=16 {
        for x in -1..=16 {
            let h = 6 + ((x as f32 * 0.4).sin() * 3.0 + (z as f32 * 0.3).cos() * 3.0) as i32;
            for y in -1..=16 {
                let voxel = if y < h {
                    dirt
                } else if y == h {
                    grass
                } else if y <= 7 {
                    water
                } else {
                    Voxel::AIR
                };
                input.set(x, y, z, voxel);
            }
        }
    }
    input
}

fn benchmark_strategies(c: &mut Criterion) {
    let input = terrain_input();
    let mut group = c.benchmark_group("chunk_mesh");
    group.bench_function("greedy", |b| {
        b.iter(|| black_box(build_mesh(black_box(&input), MeshStrategy::Greedy)));
    });
    group.bench_function("naive", |b| {
        b.iter(|| black_box(build_mesh(black_box(&input), MeshStrategy::Naive)));
    });
    group.finish();
}

criterion_group!(benches, benchmark_strategies);
criterion_main!(benches);
