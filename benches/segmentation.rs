use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma};
use imageproc::region_labelling::Connectivity;
use nematode_plate_rs::plate_pipeline::{
    AdaptiveParams, ComponentLabeler, LabelingStrategy, SegmentationMethod, Segmenter,
};

/// Light plate with a grid of short dark bars.
fn synthetic_plate(width: u32, height: u32) -> GrayImage {
    let mut plate = GrayImage::from_fn(width, height, |x, y| Luma([190 + ((x * 7 + y * 3) % 11) as u8]));
    for cy in (40..height.saturating_sub(40)).step_by(80) {
        for cx in (40..width.saturating_sub(80)).step_by(120) {
            for x in cx..cx + 60 {
                for y in cy..cy + 4 {
                    plate.put_pixel(x, y, Luma([45]));
                }
            }
        }
    }
    plate
}

fn benchmark_segmentation_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation_methods");
    let plate = synthetic_plate(1024, 768);

    let methods = vec![
        (SegmentationMethod::Global, "global"),
        (SegmentationMethod::Adaptive(AdaptiveParams::default()), "adaptive"),
    ];

    for (method, label) in methods {
        group.bench_with_input(BenchmarkId::from_parameter(label), &plate, |b, plate| {
            let segmenter = Segmenter::new(method, Connectivity::Eight, true);
            b.iter(|| segmenter.segment(black_box(plate)));
        });
    }

    group.finish();
}

fn benchmark_labeling_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("labeling_strategies");
    let plate = synthetic_plate(1024, 768);
    let binary = Segmenter::new(SegmentationMethod::Global, Connectivity::Eight, true).segment(&plate);

    let strategies = vec![
        (LabelingStrategy::FloodTrace, "flood_trace"),
        (LabelingStrategy::RasterScan, "raster_scan"),
    ];

    for (strategy, label) in strategies {
        group.bench_with_input(BenchmarkId::from_parameter(label), &binary, |b, binary| {
            let labeler = ComponentLabeler::new(strategy, Connectivity::Eight);
            b.iter(|| labeler.label(black_box(binary)));
        });
    }

    group.finish();
}

fn benchmark_plate_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_and_label_by_size");

    let sizes = vec![(640, 480, "640x480"), (1280, 960, "1280x960"), (2560, 1920, "2560x1920")];

    for (width, height, label) in sizes {
        let plate = synthetic_plate(width, height);
        group.bench_with_input(BenchmarkId::from_parameter(label), &plate, |b, plate| {
            let segmenter = Segmenter::new(SegmentationMethod::Global, Connectivity::Eight, true);
            let labeler = ComponentLabeler::new(LabelingStrategy::FloodTrace, Connectivity::Eight);
            b.iter(|| {
                let binary = segmenter.segment(black_box(plate));
                labeler.label(&binary)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_segmentation_methods,
    benchmark_labeling_strategies,
    benchmark_plate_sizes
);
criterion_main!(benches);
