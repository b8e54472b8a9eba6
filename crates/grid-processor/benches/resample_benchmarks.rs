//! Benchmarks for overlay resampling.
//!
//! Run with: cargo bench --package grid-processor --bench resample_benchmarks

use climate_common::CrsCode;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grid_processor::{RasterFrame, Resampler, SparseGrid};
use projection::Reprojector;
use test_utils::{berkshire_extent, create_temperature_grid};

fn bench_resample(c: &mut Criterion) {
    let extent = berkshire_extent();
    let frame = RasterFrame::new(extent, create_temperature_grid(&extent, 7)).unwrap();
    let sparse = SparseGrid::from_frame(&frame);
    let bounds = Reprojector::new(CrsCode::Epsg27700, CrsCode::Epsg4326)
        .geographic_bounds(extent.x_min, extent.y_min, extent.x_max, extent.y_max)
        .unwrap();

    let mut group = c.benchmark_group("resample");
    for size in [64usize, 256, 512] {
        let resampler = Resampler::new(bounds, size, size, CrsCode::Epsg27700).unwrap();
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("dense", size), &resampler, |b, r| {
            b.iter(|| black_box(r.resample(&frame)))
        });
        group.bench_with_input(BenchmarkId::new("sparse", size), &resampler, |b, r| {
            b.iter(|| black_box(r.resample(&sparse)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resample);
criterion_main!(benches);
