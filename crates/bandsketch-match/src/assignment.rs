use bandsketch_core::errors::{BandError, ErrorInfo};
use nalgebra::DMatrix;

fn assignment_error(code: &str, message: impl Into<String>) -> BandError {
    BandError::Assignment(ErrorInfo::new(code, message))
}

/// Solver for the square linear assignment problem.
///
/// Returns `assignment[row] = column` minimising the summed cost. Which of
/// several equally cheap assignments is returned is left to the solver.
pub trait AssignmentSolver {
    /// Solves the assignment problem for a square cost matrix.
    fn solve(&self, cost: &DMatrix<f64>) -> Result<Vec<usize>, BandError>;
}

/// Shortest augmenting path Hungarian method, `O(n^3)`.
///
/// For equal reduced costs the lowest column index is preferred, which makes
/// the result reproducible for a given matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hungarian;

impl AssignmentSolver for Hungarian {
    fn solve(&self, cost: &DMatrix<f64>) -> Result<Vec<usize>, BandError> {
        let n = cost.nrows();
        if cost.ncols() != n {
            return Err(BandError::Assignment(
                ErrorInfo::new("non-square", "cost matrix must be square")
                    .with_context("rows", n)
                    .with_context("cols", cost.ncols()),
            ));
        }
        if !cost.iter().all(|c| c.is_finite()) {
            return Err(assignment_error(
                "non-finite-cost",
                "cost matrix contains non-finite entries",
            ));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        // Potentials and matching use 1-based columns; slot 0 is the virtual
        // column the augmenting path starts from.
        let mut u = vec![0.0f64; n + 1];
        let mut v = vec![0.0f64; n + 1];
        let mut matched_row = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for row in 1..=n {
            matched_row[0] = row;
            let mut col0 = 0usize;
            let mut min_reduced = vec![f64::INFINITY; n + 1];
            let mut used = vec![false; n + 1];
            loop {
                used[col0] = true;
                let row0 = matched_row[col0];
                let mut delta = f64::INFINITY;
                let mut col1 = 0usize;
                for col in 1..=n {
                    if used[col] {
                        continue;
                    }
                    let reduced = cost[(row0 - 1, col - 1)] - u[row0] - v[col];
                    if reduced < min_reduced[col] {
                        min_reduced[col] = reduced;
                        way[col] = col0;
                    }
                    if min_reduced[col] < delta {
                        delta = min_reduced[col];
                        col1 = col;
                    }
                }
                if col1 == 0 {
                    return Err(assignment_error(
                        "no-augmenting-path",
                        "assignment solver failed to find an augmenting path",
                    ));
                }
                for col in 0..=n {
                    if used[col] {
                        u[matched_row[col]] += delta;
                        v[col] -= delta;
                    } else {
                        min_reduced[col] -= delta;
                    }
                }
                col0 = col1;
                if matched_row[col0] == 0 {
                    break;
                }
            }
            loop {
                let col1 = way[col0];
                matched_row[col0] = matched_row[col1];
                col0 = col1;
                if col0 == 0 {
                    break;
                }
            }
        }

        let mut assignment = vec![0usize; n];
        for col in 1..=n {
            assignment[matched_row[col] - 1] = col - 1;
        }
        Ok(assignment)
    }
}
