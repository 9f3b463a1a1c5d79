use article_image::engine::{build_frame, encode_jpeg};
use article_image::{normalize_content_image, normalize_header_image, Framing};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn photo_like(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x.wrapping_mul(7) ^ y) as u8,
            (y.wrapping_mul(3) ^ x) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

fn encoded(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let source = photo_like(3000, 2000);
    let jpeg = encoded(&source, ImageFormat::Jpeg);
    let png = encoded(&photo_like(1600, 2400), ImageFormat::Png);

    c.bench_function("normalize_header 3000x2000 jpeg", |b| {
        b.iter(|| normalize_header_image(black_box(&jpeg)))
    });
    c.bench_function("normalize_content 1600x2400 png", |b| {
        b.iter(|| normalize_content_image(black_box(&png)))
    });

    let header_framing = Framing::AspectLock {
        width: 1280,
        height: 720,
    };
    c.bench_function("build_frame 3000x2000 -> 1280x720", |b| {
        b.iter(|| build_frame(black_box(source.clone()), header_framing))
    });

    let frame = photo_like(1280, 720);
    c.bench_function("encode_jpeg 1280x720 q92", |b| {
        b.iter(|| encode_jpeg(black_box(&frame), 92))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
