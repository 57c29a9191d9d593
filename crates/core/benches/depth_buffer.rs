use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prism_core::graphics::{ColorOps, DepthBuffer};

fn bench_depth_test_and_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_test_and_update");

    for size in [64u32, 256, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut depth = DepthBuffer::new(size, size);
            b.iter(|| {
                depth.clear();
                let mut passed = 0u32;
                for y in 0..size {
                    for x in 0..size {
                        let z = ((x ^ y) & 0xFFFF) as u16;
                        if depth.test_and_update(x, y, z) {
                            passed += 1;
                        }
                    }
                }
                black_box(passed);
            });
        });
    }

    group.finish();
}

fn bench_quantize(c: &mut Criterion) {
    c.bench_function("depth_quantize", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for i in 0..1024 {
                acc = acc.wrapping_add(DepthBuffer::quantize(black_box(i as f32 / 1024.0)) as u32);
            }
            black_box(acc);
        });
    });
}

fn bench_color_pack(c: &mut Criterion) {
    c.bench_function("color_pack", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for i in 0..1024 {
                let t = i as f32 / 1024.0;
                acc ^= ColorOps::pack(black_box([t, 1.0 - t, 0.5, 1.0]));
            }
            black_box(acc);
        });
    });
}

criterion_group!(
    benches,
    bench_depth_test_and_update,
    bench_quantize,
    bench_color_pack
);
criterion_main!(benches);
