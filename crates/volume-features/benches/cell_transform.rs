use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use volume_features::{
    GridConfig, HistogramConfig, IntensityHistogram, IntensityMean, IntensityMedian, Transformer,
    VolumeGeometry,
};

fn bench_cell_transforms(c: &mut Criterion) {
    let geometry = VolumeGeometry::cube(48, 4000.0);
    let grid = GridConfig::default();
    let x = Array2::from_shape_fn((4, geometry.voxel_count()), |(i, j)| {
        ((i * 7919 + j * 104_729) % 4000) as f64
    });

    let mean = IntensityMean::new(geometry, grid).unwrap();
    c.bench_function("intensity_mean_48", |b| {
        b.iter(|| mean.transform(black_box(x.view())).unwrap())
    });

    let median = IntensityMedian::new(geometry, grid).unwrap();
    c.bench_function("intensity_median_48", |b| {
        b.iter(|| median.transform(black_box(x.view())).unwrap())
    });

    let histogram = IntensityHistogram::new(geometry, grid, HistogramConfig::default()).unwrap();
    c.bench_function("intensity_histogram_48", |b| {
        b.iter(|| histogram.transform(black_box(x.view())).unwrap())
    });
}

criterion_group!(benches, bench_cell_transforms);
criterion_main!(benches);
