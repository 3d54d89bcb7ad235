use criterion::{black_box, criterion_group, criterion_main, Criterion};
use perception_core::ground_plane::{extract, FrameLayout, GroundPlaneConfig, GroundPlaneFrame};
use perception_core::roi_tracker::RoiTracker;
use perception_core::types::Rect;

fn make_batch(n: usize, shift: i32) -> Vec<Rect> {
    (0..n)
        .map(|i| {
            let col = (i % 16) as i32;
            let row = (i / 16) as i32;
            Rect::from_pixels(col * 80 + shift, row * 120, 60, 100)
        })
        .collect()
}

fn make_frame(cols: usize, rows: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(cols * rows * 4);
    for row in 0..rows {
        for col in 0..cols {
            let x = (col as f32 / cols as f32 - 0.5) * 2.0;
            let y = (row as f32 / rows as f32 - 0.5) * 1.2;
            let z = if x.abs() < 0.2 && y.abs() < 0.2 { 1.5 } else { 1.9 };
            data.extend_from_slice(&[0.0, x, y, z]);
        }
    }
    data
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for n in [4, 32, 128] {
        group.bench_function(format!("{n}_detections"), |b| {
            b.iter(|| {
                let mut tracker = RoiTracker::default();
                tracker.reconcile(&make_batch(n, 0), 0.0);
                let batch = make_batch(n, 2);
                black_box(tracker.reconcile(&batch, 0.1));
            });
        });
    }

    group.finish();
}

fn bench_ground_plane(c: &mut Criterion) {
    let mut group = c.benchmark_group("ground_plane");
    let config = GroundPlaneConfig::default();

    for (cols, rows) in [(640, 360), (1280, 720)] {
        let data = make_frame(cols, rows);
        group.bench_function(format!("{cols}x{rows}"), |b| {
            b.iter(|| {
                let frame = GroundPlaneFrame::new(&data, cols, rows, FrameLayout::default());
                black_box(extract(&config, &frame));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile, bench_ground_plane);
criterion_main!(benches);
