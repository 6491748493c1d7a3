use bandsketch_core::Evaluation;
use serde::{Deserialize, Serialize};

/// Evaluation whose components carry a canonical, continuity preserving
/// band order.
///
/// `order[band]` is the position of `band` in the evaluator's raw output at
/// this abscissa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Abscissa of the sample.
    pub x: f64,
    /// Values in canonical band order.
    pub values: Vec<f64>,
    /// Derivatives in canonical band order.
    pub derivatives: Vec<f64>,
    /// Raw evaluator position of every canonical band.
    pub order: Vec<usize>,
}

impl Sample {
    /// Accepts a raw evaluation as-is, seeding the identity order.
    pub fn seed(x: f64, raw: &Evaluation) -> Self {
        Self {
            x,
            values: raw.values.clone(),
            derivatives: raw.derivatives.clone(),
            order: (0..raw.len()).collect(),
        }
    }

    /// Reorders a raw evaluation, `permutation[band]` naming the raw
    /// position that becomes `band`.
    pub fn permuted(x: f64, raw: &Evaluation, permutation: &[usize]) -> Self {
        Self {
            x,
            values: permutation.iter().map(|&j| raw.values[j]).collect(),
            derivatives: permutation.iter().map(|&j| raw.derivatives[j]).collect(),
            order: permutation.to_vec(),
        }
    }

    /// Number of bands carried by the sample.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the sample carries no band.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
