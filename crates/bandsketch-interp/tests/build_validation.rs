use bandsketch_core::BandError;
use bandsketch_interp::CubicHermite;
use nalgebra::DMatrix;

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
        .collect()
}

fn column(values: impl Iterator<Item = f64>) -> DMatrix<f64> {
    let data: Vec<f64> = values.collect();
    DMatrix::from_column_slice(data.len(), 1, &data)
}

#[test]
fn rejects_malformed_input() {
    let x = linspace(-1.0, 1.0, 50);
    let y = column(x.iter().map(|v| v.sin()));
    let dy = column(x.iter().map(|v| v.cos()));

    let single = CubicHermite::build(&[1.0], &column([1.0].into_iter()), &column([0.0].into_iter()));
    assert!(matches!(single, Err(BandError::Shape(_))));

    let mut longer = x.clone();
    longer.push(2.0);
    assert!(matches!(CubicHermite::build(&longer, &y, &dy), Err(BandError::Shape(_))));

    let wide = DMatrix::<f64>::zeros(50, 2);
    assert!(matches!(CubicHermite::build(&x, &y, &wide), Err(BandError::Shape(_))));

    let reversed: Vec<f64> = x.iter().rev().copied().collect();
    assert!(matches!(CubicHermite::build(&reversed, &y, &dy), Err(BandError::Domain(_))));

    let nan_x: Vec<f64> = x.iter().map(|v| v * f64::NAN).collect();
    assert!(matches!(CubicHermite::build(&nan_x, &y, &dy), Err(BandError::Domain(_))));

    let nan_y = y.map(|v| v * f64::NAN);
    assert!(matches!(CubicHermite::build(&x, &nan_y, &dy), Err(BandError::Domain(_))));
    assert!(matches!(CubicHermite::build(&x, &y, &nan_y), Err(BandError::Domain(_))));

    let mut duplicated = x.clone();
    duplicated[10] = duplicated[9];
    let err = CubicHermite::build(&duplicated, &y, &dy).unwrap_err();
    assert_eq!(err.code(), "x-not-increasing");
}

#[test]
fn outside_queries_fail_unless_extrapolating() {
    let x = linspace(0.0, 1.0, 5);
    let spline = CubicHermite::build_scalar(&x, &x, &vec![1.0; 5]).unwrap();
    assert!(matches!(spline.evaluate(1.5, 0), Err(BandError::Domain(_))));
    assert!(matches!(spline.evaluate(f64::NAN, 0), Err(BandError::Input(_))));
    let spline = spline.with_extrapolation(true);
    let value = spline.evaluate(1.5, 0).unwrap()[0];
    assert!((value - 1.5).abs() < 1e-12);
    assert!(spline.evaluate_component(0.5, 3, 0).is_err());
}
