//! Iso-surface extraction throughput.

use criterion::{criterion_group, criterion_main, Criterion};
use glam::Vec3;
use limn::mesh::{marching_cubes, MeshBuffer};
use limn::sdf::{op_smooth_union, sd_sphere, sd_torus};

fn bench_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("marching_cubes");

    for resolution in [32_u32, 64, 96] {
        group.bench_function(format!("sphere_{resolution}"), |b| {
            b.iter(|| {
                let mut mesh = MeshBuffer::with_initial_capacity(300_000);
                marching_cubes(
                    &mut mesh,
                    Vec3::splat(-0.65),
                    Vec3::splat(0.65),
                    resolution,
                    |p| sd_sphere(p, 0.5),
                    |_| Vec3::new(0.8, 0.3, 0.2),
                );
                mesh.vertex_count()
            });
        });
    }

    group.bench_function("blended_compound_64", |b| {
        b.iter(|| {
            let mut mesh = MeshBuffer::with_initial_capacity(300_000);
            marching_cubes(
                &mut mesh,
                Vec3::splat(-1.0),
                Vec3::splat(1.0),
                64,
                |p| {
                    let ball = sd_sphere(p - Vec3::new(0.0, 0.3, 0.0), 0.4);
                    let ring = sd_torus(p, 0.55, 0.12);
                    op_smooth_union(ball, ring, 0.15)
                },
                |_| Vec3::ONE,
            );
            mesh.vertex_count()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sphere);
criterion_main!(benches);
