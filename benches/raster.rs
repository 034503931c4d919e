use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pureplate::capture::{ImageEncoding, VideoFrame};
use pureplate::raster::{encode, render_frame};

fn gradient(width: u32, height: u32) -> VideoFrame {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
        }
    }
    VideoFrame::new(pixels, width, height, 0)
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    for (width, height) in [(640, 480), (1280, 720)] {
        let frame = gradient(width, height);
        for mirror in [false, true] {
            let id = format!("{}x{}/mirror={}", width, height, mirror);
            group.bench_with_input(BenchmarkId::from_parameter(id), &frame, |b, frame| {
                b.iter(|| render_frame(black_box(frame), mirror))
            });
        }
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let raster = match render_frame(&gradient(1280, 720), false) {
        Ok(raster) => raster,
        Err(e) => panic!("render failed: {}", e),
    };

    let mut group = c.benchmark_group("encode");
    group.sample_size(20);
    group.bench_function("jpeg_q92", |b| {
        b.iter(|| encode(black_box(&raster), ImageEncoding::Jpeg, 92))
    });
    group.bench_function("png", |b| {
        b.iter(|| encode(black_box(&raster), ImageEncoding::Png, 92))
    });
    group.finish();
}

criterion_group!(benches, bench_render, bench_encode);
criterion_main!(benches);
