use criterion::{criterion_group, criterion_main, Criterion};
use geojson::GeoJson;
use minewatch::models::geometry::parse_geojson;
use minewatch::services::union_boundary;
use std::hint::black_box;

/// `n` x `n` grid of squares. With `step` below `size` neighbours overlap.
fn grid(n: usize, size: f64, step: f64) -> GeoJson {
    let features: Vec<_> = (0..n * n)
        .map(|i| {
            let x = 77.0 + (i % n) as f64 * step;
            let y = 28.0 + (i / n) as f64 * step;
            serde_json::json!({
                "type": "Feature",
                "properties": {"plot": i},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]]
                }
            })
        })
        .collect();
    let fc = serde_json::json!({"type": "FeatureCollection", "features": features});
    parse_geojson(&fc.to_string()).expect("Failed to build grid")
}

fn benchmark_boundary_union(c: &mut Criterion) {
    // Adjacent lease plots that merge into one polygon
    let overlapping = grid(10, 0.012, 0.01);
    // Scattered plots that stay separate parts
    let disjoint = grid(10, 0.005, 0.01);

    let mut group = c.benchmark_group("boundary_union");

    group.bench_function("overlapping_100_plots", |b| {
        b.iter(|| union_boundary(black_box(&overlapping)))
    });

    group.bench_function("disjoint_100_plots", |b| {
        b.iter(|| union_boundary(black_box(&disjoint)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_boundary_union);
criterion_main!(benches);
