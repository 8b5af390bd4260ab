//! # Scene Graph Benchmark
//!
//! Measures the per-frame work of a holding participant: resolving the object
//! world pose through the controller and refreshing its world box.
//!
//! Run with: `cargo bench --package concord_core`

#![allow(missing_docs)]

use concord_core::{Aabb, Pose, Ray, SceneGraph};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Quat, Vec3};

fn build_chain(depth: usize) -> (SceneGraph, concord_core::NodeId) {
    let mut scene = SceneGraph::new();
    let mut parent = scene.root();
    for i in 0..depth {
        let pose = Pose::from_translation_rotation(
            Vec3::new(0.0, 0.1, -0.1 * i as f32),
            Quat::from_rotation_y(0.05),
        );
        parent = scene.spawn(parent, pose).unwrap_or(parent);
    }
    (scene, parent)
}

fn bench_world_pose(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_pose");
    for depth in [1usize, 4, 16] {
        let (scene, leaf) = build_chain(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, &leaf| {
            b.iter(|| black_box(scene.world_pose(leaf)));
        });
    }
    group.finish();
}

fn bench_attach_detach(c: &mut Criterion) {
    let mut scene = SceneGraph::new();
    let root = scene.root();
    let hand = scene
        .spawn(root, Pose::from_translation(Vec3::new(0.2, 1.3, -0.3)))
        .unwrap_or(root);
    let object = scene
        .spawn(root, Pose::from_translation(Vec3::new(0.0, 1.0, -2.0)))
        .unwrap_or(root);

    c.bench_function("attach_detach", |b| {
        b.iter(|| {
            let _ = black_box(scene.attach(object, hand));
            let _ = black_box(scene.attach(object, root));
        });
    });
}

fn bench_acquisition_tests(c: &mut Criterion) {
    let local = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let world = Pose {
        translation: Vec3::new(0.0, 1.0, -2.0),
        rotation: Quat::from_rotation_y(0.3),
        scale: Vec3::splat(1.5),
    }
    .to_matrix();
    let ray = Ray::new(Vec3::new(0.1, 1.2, 0.0), Vec3::NEG_Z);

    c.bench_function("aabb_refresh_and_raycast", |b| {
        b.iter(|| {
            let bounds = local.to_world(black_box(&world));
            black_box(ray.intersects_aabb(&bounds))
        });
    });
}

criterion_group!(
    benches,
    bench_world_pose,
    bench_attach_detach,
    bench_acquisition_tests,
);
criterion_main!(benches);
