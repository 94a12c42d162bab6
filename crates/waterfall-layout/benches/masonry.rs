use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use waterfall_core::Size;
use waterfall_layout::{layout_masonry, LayoutConfig};

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("masonry_layout");
    for &count in &[100usize, 1_000, 10_000] {
        let heights: Vec<f32> = (0..count).map(|i| 80.0 + (i * 37 % 220) as f32).collect();
        let config = LayoutConfig::new(4).with_gap(12.0);
        group.bench_with_input(BenchmarkId::from_parameter(count), &heights, |b, heights| {
            b.iter(|| {
                let outcome = layout_masonry(
                    heights.len(),
                    Size::new(1280.0, 720.0),
                    &config,
                    |i| heights.get(i).copied(),
                );
                black_box(outcome)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
