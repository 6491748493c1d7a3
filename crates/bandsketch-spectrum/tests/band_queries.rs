use std::f64::consts::PI;

use bandsketch_core::{Evaluation, FnEvaluator};
use bandsketch_spectrum::{intersect_intervals, spectrum, IntersectOpts, Spectrum, SpectrumConfig, Target};

/// Three bands with two pairs of crossings, reported sorted by value.
fn bands(k: f64) -> Evaluation {
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

fn build() -> Spectrum {
    let _ = env_logger::builder().is_test(true).try_init();
    spectrum(FnEvaluator::new(bands), &SpectrumConfig::default()).unwrap()
}

fn assert_close(found: &[f64], expected: &[f64]) {
    assert_eq!(found.len(), expected.len(), "{found:?} vs {expected:?}");
    for (a, b) in found.iter().zip(expected) {
        assert!((a - b).abs() < 1e-6, "{found:?} vs {expected:?}");
    }
}

fn assert_intervals(found: &[(f64, f64)], expected: &[(f64, f64)]) {
    assert_eq!(found.len(), expected.len(), "{found:?} vs {expected:?}");
    for (a, b) in found.iter().zip(expected) {
        assert!((a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6, "{found:?} vs {expected:?}");
    }
}

#[test]
fn bands_are_tracked_through_crossings() {
    let spectrum = build();
    assert_eq!(spectrum.nbands(), 3);
    for (row, &k) in spectrum.x().iter().enumerate() {
        assert_eq!(spectrum.y()[(row, 0)], -1.2 - k.cos());
        assert_eq!(spectrum.y()[(row, 1)], 0.5 + 0.25 * k.cos());
        assert_eq!(spectrum.y()[(row, 2)], k.cos());
    }
}

#[test]
fn ordering_points_into_raw_output() {
    let spectrum = build();
    for (row, &k) in spectrum.x().iter().enumerate() {
        let raw = bands(k);
        for band in 0..3 {
            let native = spectrum.native_index(row, band).unwrap();
            assert_eq!(raw.values[native], spectrum.y()[(row, band)]);
        }
    }
}

#[test]
fn value_roots() {
    let spectrum = build();
    let opts = IntersectOpts::default();
    assert!(spectrum.intersect(Target::Value(0.0), 0, 0, &opts).unwrap().is_empty());
    assert!(spectrum.intersect(Target::Value(0.0), 1, 0, &opts).unwrap().is_empty());
    assert_close(&spectrum.intersect(Target::Value(0.0), 2, 0, &opts).unwrap(), &[-PI / 2.0, PI / 2.0]);

    let extended = IntersectOpts::within(-2.0 * PI, 3.0 * PI);
    assert!(spectrum.intersect(Target::Value(0.0), 0, 0, &extended).unwrap().is_empty());
    assert_close(
        &spectrum.intersect(Target::Value(0.0), 2, 0, &extended).unwrap(),
        &[-1.5 * PI, -0.5 * PI, 0.5 * PI, 1.5 * PI, 2.5 * PI],
    );
}

#[test]
fn function_targets_are_sampled_on_the_knots() {
    let spectrum = build();
    let line = |k: f64| 0.5 * k;
    let roots = spectrum.intersect(Target::Function(&line), 2, 0, &IntersectOpts::default()).unwrap();
    // the target's slope is not known, so the root is only bracketed by the knots
    assert_eq!(roots.len(), 1);
    assert!((roots[0] - 1.029_866_5).abs() < 0.05, "{roots:?}");
}

#[test]
fn velocity_zeros_repeat_with_the_period() {
    let spectrum = build();
    for band in 0..spectrum.nbands() {
        let zeros = spectrum.intersect(Target::Value(0.0), band, 1, &IntersectOpts::default()).unwrap();
        assert_close(&zeros, &[-PI, 0.0, PI]);
        let zeros = spectrum
            .intersect(Target::Value(0.0), band, 1, &IntersectOpts::within(-3.0 * PI, 2.0 * PI))
            .unwrap();
        assert_close(&zeros, &[-3.0 * PI, -2.0 * PI, -PI, 0.0, PI, 2.0 * PI]);
    }
}

#[test]
fn value_intervals() {
    let spectrum = build();
    let wide = IntersectOpts::within(-3.0 * PI, 3.0 * PI);
    assert_intervals(&spectrum.intervals(0, 0, None, Some(0.0), &wide).unwrap(), &[(-3.0 * PI, 3.0 * PI)]);
    assert!(spectrum.intervals(1, 0, None, Some(0.0), &wide).unwrap().is_empty());
    assert_intervals(
        &spectrum.intervals(2, 0, None, Some(0.0), &wide).unwrap(),
        &[
            (-3.0 * PI, -2.5 * PI),
            (-1.5 * PI, -0.5 * PI),
            (0.5 * PI, 1.5 * PI),
            (2.5 * PI, 3.0 * PI),
        ],
    );

    let opts = IntersectOpts::default();
    let edge = 0.6f64.acos();
    assert_intervals(
        &spectrum.intervals(0, 0, Some(-1.8), Some(0.0), &opts).unwrap(),
        &[(-PI, -edge), (edge, PI)],
    );
    assert!(spectrum.intervals(1, 0, Some(-1.8), Some(0.0), &opts).unwrap().is_empty());
    assert_intervals(
        &spectrum.intervals(2, 0, Some(-1.8), Some(0.0), &opts).unwrap(),
        &[(-PI, -PI / 2.0), (PI / 2.0, PI)],
    );
}

#[test]
fn velocity_intervals_and_their_intersection() {
    let spectrum = build();
    let opts = IntersectOpts::default();
    assert_intervals(&spectrum.intervals(0, 1, Some(0.0), None, &opts).unwrap(), &[(0.0, PI)]);
    assert_intervals(&spectrum.intervals(1, 1, Some(0.0), None, &opts).unwrap(), &[(-PI, 0.0)]);
    assert_intervals(&spectrum.intervals(2, 1, Some(0.0), None, &opts).unwrap(), &[(-PI, 0.0)]);

    let tol = spectrum.tol();
    let edge = 0.6f64.acos();
    let energy = spectrum.intervals(0, 0, Some(-1.8), Some(0.0), &opts).unwrap();
    let velocity = spectrum.intervals(0, 1, Some(0.0), None, &opts).unwrap();
    assert_intervals(&intersect_intervals(&energy, &velocity, tol), &[(edge, PI)]);

    let energy = spectrum.intervals(1, 0, Some(-1.8), Some(0.0), &opts).unwrap();
    let velocity = spectrum.intervals(1, 1, Some(0.0), None, &opts).unwrap();
    assert!(intersect_intervals(&energy, &velocity, tol).is_empty());

    let energy = spectrum.intervals(2, 0, Some(-1.8), Some(0.0), &opts).unwrap();
    let velocity = spectrum.intervals(2, 1, Some(0.0), None, &opts).unwrap();
    assert_intervals(&intersect_intervals(&energy, &velocity, tol), &[(-PI, -PI / 2.0)]);
}

#[test]
fn interpolant_reproduces_samples_and_period_images() {
    let spectrum = build();
    for (row, &k) in spectrum.x().iter().enumerate() {
        for shift in [0.0, 2.0 * PI, -2.0 * PI] {
            let values = spectrum.evaluate(k + shift, 0).unwrap();
            let slopes = spectrum.evaluate(k + shift, 1).unwrap();
            for band in 0..3 {
                assert!((values[band] - spectrum.y()[(row, band)]).abs() < 1e-6);
                assert!((slopes[band] - spectrum.dy()[(row, band)]).abs() < 1e-6);
            }
        }
    }
}
