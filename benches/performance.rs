use criterion::{black_box, criterion_group, criterion_main, Criterion};
use egui::{pos2, vec2, Rect};
use image::DynamicImage;
use slideshow_item::geometry::{self, ContentMode};
use slideshow_item::{ItemSettings, MemorySource, ZoomableImageItem};
use std::sync::Arc;

fn bench_geometry(c: &mut Criterion) {
    let viewports: Vec<_> = (1..64)
        .map(|i| vec2(320.0 + i as f32 * 17.0, 480.0 + i as f32 * 11.0))
        .collect();

    c.bench_function("fitted_size_and_insets", |b| {
        b.iter(|| {
            for viewport in &viewports {
                let fitted = geometry::fitted_size(
                    black_box(*viewport),
                    Some(vec2(4000.0, 3000.0)),
                    ContentMode::AspectFit,
                );
                black_box(geometry::centering_inset(*viewport, fitted));
            }
        })
    });
}

fn bench_layout_pass(c: &mut Criterion) {
    let settings = ItemSettings::default();
    let mut item = ZoomableImageItem::new(
        Arc::new(MemorySource::new(DynamicImage::new_rgba8(64, 48))),
        &settings,
        vec2(1920.0, 1080.0),
        None,
    );
    item.load_image();
    item.poll();

    let frames = [
        Rect::from_min_size(pos2(0.0, 0.0), vec2(1920.0, 1080.0)),
        Rect::from_min_size(pos2(0.0, 0.0), vec2(1080.0, 1920.0)),
    ];
    c.bench_function("item_layout_rotation", |b| {
        b.iter(|| {
            for frame in frames {
                item.layout(black_box(frame));
            }
        })
    });
}

criterion_group!(benches, bench_geometry, bench_layout_pass);
criterion_main!(benches);
