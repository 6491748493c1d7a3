use crate::sample::Sample;

/// Decides whether an interval is resolved given ordered samples at its
/// left end, midpoint and right end.
pub trait IntervalCriterion {
    /// Returns `true` when the interval of width `dx` needs no refinement.
    fn converged(&self, dx: f64, left: &Sample, mid: &Sample, right: &Sample) -> bool;
}

/// Per-band estimate of the L2 error of the cubic interpolant over an
/// interval of width `dx`.
///
/// Compares the midpoint sample against the cubic predicted from the two
/// endpoints, combining the value and derivative residuals.
pub fn interpolation_error(dx: f64, left: &Sample, mid: &Sample, right: &Sample) -> Vec<f64> {
    (0..left.len())
        .map(|band| {
            let (fl, fc, fr) = (left.values[band], mid.values[band], right.values[band]);
            let (dl, dc, dr) = (
                left.derivatives[band],
                mid.derivatives[band],
                right.derivatives[band],
            );
            let fm = 0.5 * (fl + fr - 2.0 * fc) + dx / 8.0 * (dl - dr);
            let dfm = 0.75 * (fr - fl) - dx / 8.0 * (dl + dr + 4.0 * dc);
            (39.0 * fm * fm + dfm * dfm).sqrt()
        })
        .collect()
}

/// `true` when every band's estimated error is strictly below `tol`.
pub fn converged(dx: f64, left: &Sample, mid: &Sample, right: &Sample, tol: f64) -> bool {
    interpolation_error(dx, left, mid, right)
        .into_iter()
        .all(|err| err < tol)
}

/// Default criterion: [`interpolation_error`] against an absolute tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicErrorEstimate {
    tol: f64,
}

impl CubicErrorEstimate {
    /// Criterion accepting intervals whose error is below `tol`.
    pub fn new(tol: f64) -> Self {
        Self { tol }
    }

    /// Absolute tolerance of the criterion.
    pub fn tol(&self) -> f64 {
        self.tol
    }
}

impl IntervalCriterion for CubicErrorEstimate {
    fn converged(&self, dx: f64, left: &Sample, mid: &Sample, right: &Sample) -> bool {
        converged(dx, left, mid, right, self.tol)
    }
}
