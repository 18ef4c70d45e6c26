use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use strata2d::{ColliderSettings, CollisionWorld};

const DT: f32 = 1.0 / 60.0;

fn prepare_world(body_count: usize) -> CollisionWorld {
    let mut world = CollisionWorld::new(0.0, 10.0, true);
    world
        .new_rectangle_collider(0.0, 50.0, 500.0, 2.0, &ColliderSettings::static_body())
        .unwrap();
    for i in 0..body_count {
        let x = (i % 64) as f32 * 1.5 - 48.0;
        let y = -1.5 * (i / 64) as f32;
        world
            .new_circle_collider(x, y, 0.5, &ColliderSettings::new())
            .unwrap();
    }
    world
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    for &count in &[128usize, 512, 2048] {
        group.bench_with_input(BenchmarkId::new("step", count), &count, |b, &count| {
            let mut world = prepare_world(count);
            b.iter(|| world.update(black_box(DT)));
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let mut world = prepare_world(512);
    for _ in 0..60 {
        world.update(DT);
    }
    group.bench_function("circle_r20", |b| {
        b.iter(|| world.query_circle_area(black_box(0.0), 40.0, 20.0, None))
    });
    group.bench_function("line_across", |b| {
        b.iter(|| world.query_line(black_box(-60.0), 45.0, 60.0, 45.0, None))
    });
    group.finish();
}

criterion_group!(benches, bench_world_step, bench_queries);
criterion_main!(benches);
