use bandsketch_core::errors::{BandError, ErrorInfo};
use bandsketch_core::Evaluation;
use nalgebra::DMatrix;

use crate::assignment::{AssignmentSolver, Hungarian};
use crate::sample::Sample;

/// Continuity cost between every left and every right component.
///
/// Entry `(i, j)` is the mean squared distance over `[x_left, x_right]`
/// between the linearization of left component `i` at `x_left` and of right
/// component `j` at `x_right`. It is zero exactly when both lines coincide.
/// Swapping the sides transposes the matrix.
pub fn cost_matrix(
    left_values: &[f64],
    left_derivatives: &[f64],
    right_values: &[f64],
    right_derivatives: &[f64],
    x_left: f64,
    x_right: f64,
) -> DMatrix<f64> {
    let dx = 0.5 * (x_right - x_left);
    DMatrix::from_fn(left_values.len(), right_values.len(), |i, j| {
        let a = left_values[i] - right_values[j] + (left_derivatives[i] + right_derivatives[j]) * dx;
        let b = left_derivatives[i] - right_derivatives[j];
        b * b * dx * dx / 3.0 + a * a
    })
}

/// Reorders right-hand evaluations so that bands continue smoothly from an
/// already ordered left-hand sample.
#[derive(Debug, Clone, Default)]
pub struct ContinuityMatcher<S = Hungarian> {
    solver: S,
}

impl ContinuityMatcher<Hungarian> {
    /// Matcher backed by the Hungarian solver.
    pub fn new() -> Self {
        Self { solver: Hungarian }
    }
}

impl<S: AssignmentSolver> ContinuityMatcher<S> {
    /// Matcher backed by a custom assignment solver.
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// Cost matrix between an ordered sample and a raw evaluation.
    pub fn cost(&self, left: &Sample, right: &Evaluation, x_right: f64) -> Result<DMatrix<f64>, BandError> {
        if left.len() != right.len() {
            return Err(BandError::Shape(
                ErrorInfo::new("band-count-changed", "evaluator changed the number of components")
                    .with_context("x_left", left.x)
                    .with_context("x_right", x_right)
                    .with_context("left", left.len())
                    .with_context("right", right.len()),
            ));
        }
        Ok(cost_matrix(
            &left.values,
            &left.derivatives,
            &right.values,
            &right.derivatives,
            left.x,
            x_right,
        ))
    }

    /// Returns the right evaluation permuted into the left sample's order.
    pub fn match_right(&self, left: &Sample, right: &Evaluation, x_right: f64) -> Result<Sample, BandError> {
        let cost = self.cost(left, right, x_right)?;
        let permutation = self.solver.solve(&cost)?;
        Ok(Sample::permuted(x_right, right, &permutation))
    }
}
