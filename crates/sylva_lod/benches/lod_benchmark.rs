//! # LOD Pipeline Benchmark
//!
//! Measures the per-rebuild CPU work for large instance populations:
//! 1. Classification (count pass + compaction)
//! 2. Far-set orientation
//! 3. Batch generation (stage + expand)

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sylva_core::InstanceStore;
use sylva_lod::batch::build_generation;
use sylva_lod::lod::orient_far;
use sylva_lod::{Classifier, FarSet, ModelBounds, ProxyQuad};

const LOD_DISTANCE: f32 = 50.0;
const GROUP_CAPACITY: usize = 15_000;

fn scatter(count: usize) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    (0..count)
        .map(|_| Vec3::new(rng.gen_range(-1_000.0..1_000.0), 0.0, rng.gen_range(-1_000.0..1_000.0)))
        .collect()
}

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("bench-worker-{i}"))
        .build()
        .unwrap()
}

fn quad() -> ProxyQuad {
    let bounds =
        ModelBounds::from_vertices(&[Vec3::new(-2.0, -3.0, -2.0), Vec3::new(2.0, 3.0, 2.0)])
            .unwrap();
    ProxyQuad::new(&bounds, false)
}

fn bench_classify(c: &mut Criterion) {
    let pool = pool();
    let mut group = c.benchmark_group("classify");

    for count in [100_000, 500_000, 1_000_000] {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.replace(&scatter(count));
        let mut classifier = Classifier::new();
        let mut far = FarSet::new();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                store.reset_phases();
                let counts = classifier.classify(
                    &pool,
                    &mut store,
                    &mut far,
                    Vec3::ZERO,
                    LOD_DISTANCE * LOD_DISTANCE,
                    Vec3::ZERO,
                );
                black_box(counts)
            });
        });
    }
    group.finish();
}

fn bench_orient(c: &mut Criterion) {
    let pool = pool();
    let mut store = InstanceStore::new(Vec3::ZERO);
    store.replace(&scatter(500_000));
    let mut far = FarSet::new();
    Classifier::new().classify(
        &pool,
        &mut store,
        &mut far,
        Vec3::ZERO,
        LOD_DISTANCE * LOD_DISTANCE,
        Vec3::ZERO,
    );

    c.bench_function("orient_far_500k", |b| {
        b.iter(|| {
            let (positions, rotations) = far.orientation_view();
            orient_far(&pool, positions, rotations, black_box(Vec3::new(1.0, 2.0, 3.0)));
        });
    });
}

fn bench_build_generation(c: &mut Criterion) {
    let pool = pool();
    let quad = quad();
    let mut group = c.benchmark_group("build_generation");
    group.sample_size(20);

    for count in [60_000, 300_000] {
        let mut store = InstanceStore::new(Vec3::ZERO);
        store.replace(&scatter(count));
        let mut far = FarSet::new();
        Classifier::new().classify(
            &pool,
            &mut store,
            &mut far,
            Vec3::ZERO,
            LOD_DISTANCE * LOD_DISTANCE,
            Vec3::ZERO,
        );
        let (positions, rotations) = far.orientation_view();
        orient_far(&pool, positions, rotations, Vec3::ZERO);

        group.bench_with_input(BenchmarkId::from_parameter(far.len()), &far, |b, far| {
            b.iter(|| pool.install(|| black_box(build_generation(far, &quad, GROUP_CAPACITY))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify, bench_orient, bench_build_generation);
criterion_main!(benches);
