use bandsketch_interp::CubicHermite;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::DMatrix;

fn make_spline(points: usize, bands: usize) -> CubicHermite {
    let x: Vec<f64> = (0..points)
        .map(|i| -std::f64::consts::PI + 2.0 * std::f64::consts::PI * i as f64 / (points - 1) as f64)
        .collect();
    let y = DMatrix::from_fn(points, bands, |row, col| (x[row] * (col + 1) as f64).cos());
    let dy = DMatrix::from_fn(points, bands, |row, col| {
        -((col + 1) as f64) * (x[row] * (col + 1) as f64).sin()
    });
    CubicHermite::build(&x, &y, &dy).expect("spline")
}

fn bench_hermite(c: &mut Criterion) {
    let spline = make_spline(512, 8);
    c.bench_function("hermite_evaluate", |b| {
        b.iter(|| {
            for i in 0..256 {
                let k = -3.0 + 6.0 * i as f64 / 255.0;
                let _ = spline.evaluate(black_box(k), 0).expect("evaluate");
            }
        });
    });
    c.bench_function("hermite_roots", |b| {
        b.iter(|| {
            for band in 0..8 {
                let _ = spline.roots(black_box(band), 0.0).expect("roots");
            }
        });
    });
}

criterion_group!(benches, bench_hermite);
criterion_main!(benches);
