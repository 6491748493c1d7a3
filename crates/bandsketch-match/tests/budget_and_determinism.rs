use bandsketch_core::{BandError, Evaluation, Evaluator, FnEvaluator};
use bandsketch_match::{match_functions, BandMatchingEngine, CubicErrorEstimate, IntervalCriterion, Sample};
use proptest::prelude::*;

fn bands(x: f64) -> Evaluation {
    let mut pairs = vec![
        ((2.0 * x).cos(), -2.0 * (2.0 * x).sin()),
        (x.sin() - 0.5, x.cos()),
        (-(3.0 * x).cos(), 3.0 * (3.0 * x).sin()),
    ];
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    Evaluation::new(
        pairs.iter().map(|p| p.0).collect(),
        pairs.iter().map(|p| p.1).collect(),
    )
}

#[test]
fn exhausted_budget_returns_partial_samples() {
    let _ = env_logger::builder().is_test(true).try_init();
    let evaluator = FnEvaluator::new(bands);
    let outcome = match_functions(&evaluator, -3.0, 3.0, 1e-12, 2, 200).unwrap();
    assert!(outcome.stats.budget_exhausted);
    assert_eq!(outcome.stats.tasks, 200);
    assert!(outcome.samples.len() >= 2);
    assert_eq!(outcome.samples.x[0], -3.0);
    assert!(outcome.samples.x.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn evaluator_errors_are_propagated() {
    struct Failing;
    impl Evaluator for Failing {
        fn evaluate(&self, k: f64) -> Result<Evaluation, BandError> {
            if k > 0.5 {
                Err(BandError::Evaluator(bandsketch_core::ErrorInfo::new("solver-failed", "diagonalisation failed")))
            } else {
                Ok(Evaluation::new(vec![k], vec![1.0]))
            }
        }
    }
    let err = match_functions(Failing, 0.0, 1.0, 1e-8, 4, 1000).unwrap_err();
    assert_eq!(err.code(), "solver-failed");
}

#[test]
fn changing_band_count_is_rejected() {
    let evaluator = FnEvaluator::new(|x: f64| {
        if x < 0.5 {
            Evaluation::new(vec![x, -x], vec![1.0, -1.0])
        } else {
            Evaluation::new(vec![x], vec![1.0])
        }
    });
    let err = match_functions(&evaluator, 0.0, 1.0, 1e-8, 4, 1000).unwrap_err();
    assert_eq!(err.code(), "band-count-changed");
}

#[test]
fn non_finite_output_is_a_domain_error() {
    let evaluator = FnEvaluator::new(|x: f64| Evaluation::new(vec![1.0 / x], vec![-1.0 / (x * x)]));
    let err = match_functions(&evaluator, 0.0, 1.0, 1e-8, 4, 1000).unwrap_err();
    assert!(matches!(err, BandError::Domain(_)));
}

#[test]
fn custom_criteria_drive_refinement() {
    struct Never;
    impl IntervalCriterion for Never {
        fn converged(&self, _dx: f64, _l: &Sample, _m: &Sample, _r: &Sample) -> bool {
            false
        }
    }
    struct Always;
    impl IntervalCriterion for Always {
        fn converged(&self, _dx: f64, _l: &Sample, _m: &Sample, _r: &Sample) -> bool {
            true
        }
    }

    let evaluator = FnEvaluator::new(bands);
    let mut engine = BandMatchingEngine::new(&evaluator, 1000);
    let grid = engine.seed_grid(0.0, 1.0, 4).unwrap();
    let outcome = engine.run(&grid, &Always).unwrap();
    assert_eq!(outcome.samples.len(), 9);
    assert_eq!(outcome.stats.tasks, 4);

    let mut engine = BandMatchingEngine::new(&evaluator, 50);
    let grid = engine.seed_grid(0.0, 1.0, 4).unwrap();
    let outcome = engine.run(&grid, &Never).unwrap();
    assert!(outcome.stats.budget_exhausted);
}

#[test]
fn coarse_magnitude_reuses_evaluations() {
    let evaluator = FnEvaluator::new(bands);
    let mut engine = BandMatchingEngine::new(&evaluator, 100_000);
    let grid = engine.seed_grid(-1.0, 1.0, 10).unwrap();
    let magnitude = engine.magnitude(&grid).unwrap();
    assert!(magnitude > 0.5 && magnitude <= 1.5);
    assert_eq!(engine.stats().evaluations, 11);
    let outcome = engine.run(&grid, &CubicErrorEstimate::new(1e-8 * magnitude)).unwrap();
    assert!(outcome.stats.evaluations >= 11);
    assert_eq!(outcome.stats.evaluations, engine.stats().evaluations);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]
    #[test]
    fn matching_is_deterministic(kmin in -3.0f64..0.0, width in 0.5f64..4.0, segments in 1usize..12) {
        let evaluator = FnEvaluator::new(bands);
        let first = match_functions(&evaluator, kmin, kmin + width, 1e-7, segments, 100_000).unwrap();
        let second = match_functions(&evaluator, kmin, kmin + width, 1e-7, segments, 100_000).unwrap();
        prop_assert_eq!(first, second);
    }
}
