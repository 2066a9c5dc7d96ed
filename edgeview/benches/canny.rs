//! Run with: cargo bench -p edgeview --bench canny

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use edgeview::{CannyFilter, FrameFilter, Pipeline, PixelBuffer, SoftwareGl};

/// Diagonal gradient with a few hard bars, so every Canny stage has work.
fn synthetic_frame(width: u32, height: u32) -> PixelBuffer {
    let mut frame = PixelBuffer::new_black(width, height);
    for y in 0..height {
        for x in 0..width {
            let base = ((x + y) * 255 / (width + height)) as u8;
            let v = if (x / 64) % 2 == 0 { base } else { 255 - base };
            frame.set_pixel(x, y, [v, v / 2, 255 - v, 255]);
        }
    }
    frame
}

fn benchmark_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("canny_filter");
    let filter = CannyFilter::default();

    for (name, width, height) in [("480p", 640, 480), ("720p", 1280, 720), ("1080p", 1920, 1080)] {
        let frame = synthetic_frame(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_function(BenchmarkId::new("apply", name), |b| {
            b.iter(|| black_box(filter.apply(black_box(&frame))))
        });
    }

    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_software");
    let (width, height) = (640, 480);
    let frame = synthetic_frame(width, height);

    let mut pipeline = Pipeline::new(SoftwareGl::new());
    pipeline.init();
    pipeline.resize(width as i32, height as i32);
    let input = pipeline
        .gl()
        .upload_texture(width as i32, height as i32, frame.bytes());

    group.bench_function("process_and_render_480p", |b| {
        b.iter(|| pipeline.process_and_render(black_box(input), width as i32, height as i32))
    });

    group.finish();
}

criterion_group!(benches, benchmark_filter, benchmark_pipeline);
criterion_main!(benches);
