use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use vtsdk::{compare_images, ComparisonConfig, MatchConfig, Matcher, Metric, OwnedImage, Rect};

fn make_image(width: usize, height: usize) -> OwnedImage {
    OwnedImage::from_fn(width, height, |x, y| {
        let value = ((x * 13) ^ (y * 7) ^ (x * y)) as u8;
        [value, value.wrapping_add(85), 255 - value, 255]
    })
    .unwrap()
}

fn bench_compare(c: &mut Criterion) {
    let base = make_image(1080, 720);
    let cand = OwnedImage::from_fn(1080, 720, |x, y| {
        let mut px = base.pixel(x, y).unwrap();
        if (x / 40 + y / 40) % 7 == 0 {
            px[0] = px[0].wrapping_add(60);
        }
        px
    })
    .unwrap();
    let config = ComparisonConfig::new(95, 20).with_excluded_regions(vec![
        Rect::new(0, 0, 1079, 63),
        Rect::new(900, 100, 1079, 719),
    ]);

    c.bench_function("compare_1080x720_sequential", |b| {
        b.iter(|| black_box(compare_images(base.view(), cand.view(), &config, false).unwrap()));
    });
    c.bench_function("compare_1080x720_parallel", |b| {
        b.iter(|| black_box(compare_images(base.view(), cand.view(), &config, true).unwrap()));
    });
}

fn bench_search(c: &mut Criterion) {
    let parent = make_image(320, 240);
    let child = parent.crop(150, 90, 48, 32).unwrap();

    for (name, metric, parallel) in [
        ("ssd_search_sequential", Metric::Ssd, false),
        ("ssd_search_parallel", Metric::Ssd, true),
        ("zncc_search_sequential", Metric::Zncc, false),
    ] {
        let matcher = Matcher::new().with_config(MatchConfig {
            metric,
            parallel,
            ..MatchConfig::default()
        });
        c.bench_function(name, |b| {
            b.iter(|| black_box(matcher.find(parent.view(), child.view()).unwrap()));
        });
    }
}

criterion_group!(benches, bench_compare, bench_search);
criterion_main!(benches);
