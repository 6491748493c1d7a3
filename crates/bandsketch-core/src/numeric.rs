//! Small numeric helpers shared by the interpolation and query layers.

/// Returns `true` if `|x| < tol`.
pub fn is_zero(x: f64, tol: f64) -> bool {
    x.abs() < tol
}

/// Consecutive pairs `(s0, s1), (s1, s2), ...` of a slice.
pub fn pairwise(values: &[f64]) -> impl Iterator<Item = (f64, f64)> + '_ {
    values.windows(2).map(|pair| (pair[0], pair[1]))
}

/// Sorts the values and removes elements that lie within `tol` (absolute
/// and relative) of an already kept element. The first element of every
/// cluster is kept.
pub fn unique_sorted(values: &[f64], tol: f64) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut unique: Vec<f64> = Vec::with_capacity(sorted.len());
    for value in sorted {
        let close = unique
            .last()
            .map(|&kept| (value - kept).abs() <= tol + tol * kept.abs())
            .unwrap_or(false);
        if !close {
            unique.push(value);
        }
    }
    unique
}

/// Intersection of two closed intervals, `None` if they are disjoint.
///
/// Intervals touching in a single point intersect in the degenerate
/// interval `(p, p)`.
pub fn interval_intersection(a: (f64, f64), b: (f64, f64)) -> Option<(f64, f64)> {
    let lower = a.0.max(b.0);
    let upper = a.1.min(b.1);
    (lower <= upper).then_some((lower, upper))
}

/// Pairwise intersections of two interval lists, dropping intersections
/// narrower than `tol`.
pub fn intersect_intervals(a: &[(f64, f64)], b: &[(f64, f64)], tol: f64) -> Vec<(f64, f64)> {
    a.iter()
        .flat_map(|&left| b.iter().map(move |&right| (left, right)))
        .filter_map(|(left, right)| interval_intersection(left, right))
        .filter(|(lower, upper)| !is_zero(upper - lower, tol))
        .collect()
}
