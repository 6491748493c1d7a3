use bandsketch_core::{Evaluation, FnEvaluator};
use bandsketch_spectrum::{spectrum, IntersectOpts, SpectrumConfig, Target};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn three_bands(k: f64) -> Evaluation {
    let mut pairs = vec![
        (-1.2 - k.cos(), k.sin()),
        (0.5 + 0.25 * k.cos(), -0.25 * k.sin()),
        (k.cos(), -k.sin()),
    ];
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Evaluation::new(
        pairs.iter().map(|p| p.0).collect(),
        pairs.iter().map(|p| p.1).collect(),
    )
}

fn bench_spectrum(c: &mut Criterion) {
    let config = SpectrumConfig::default();
    c.bench_function("build_three_bands", |b| {
        b.iter(|| {
            let spec = spectrum(FnEvaluator::new(three_bands), black_box(&config)).expect("spectrum");
            black_box(spec.x().len());
        });
    });

    let spec = spectrum(FnEvaluator::new(three_bands), &config).expect("spectrum");
    let opts = IntersectOpts::default();
    c.bench_function("intersect_value", |b| {
        b.iter(|| {
            spec.intersect(Target::Value(black_box(0.4)), 2, 0, &opts)
                .expect("intersect")
        });
    });
    c.bench_function("velocity_intervals", |b| {
        b.iter(|| {
            spec.intervals(0, 1, Some(black_box(0.0)), None, &opts)
                .expect("intervals")
        });
    });
}

criterion_group!(benches, bench_spectrum);
criterion_main!(benches);
