use serde::{Deserialize, Serialize};

use crate::errors::{BandError, ErrorInfo};

/// Raw evaluator output at a single abscissa.
///
/// The components are unordered: position `i` at one abscissa need not be
/// the same physical band as position `i` at a neighbouring abscissa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Component values (for example band energies).
    pub values: Vec<f64>,
    /// First derivatives of the components with respect to the abscissa.
    pub derivatives: Vec<f64>,
}

impl Evaluation {
    /// Creates an evaluation from values and derivatives.
    pub fn new(values: Vec<f64>, derivatives: Vec<f64>) -> Self {
        Self {
            values,
            derivatives,
        }
    }

    /// Number of components carried by the evaluation.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the evaluation carries no component.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks that values and derivatives agree in length and are finite.
    pub fn validate(&self, k: f64) -> Result<(), BandError> {
        if self.values.len() != self.derivatives.len() {
            return Err(BandError::Shape(
                ErrorInfo::new(
                    "evaluation-shape",
                    "values and derivatives must have the same length",
                )
                .at(k)
                .with_context("values", self.values.len())
                .with_context("derivatives", self.derivatives.len()),
            ));
        }
        if self.values.is_empty() {
            return Err(BandError::Shape(
                ErrorInfo::new("evaluation-empty", "evaluator returned no component")
                    .at(k),
            ));
        }
        let finite = self
            .values
            .iter()
            .chain(self.derivatives.iter())
            .all(|value| value.is_finite());
        if !finite {
            return Err(BandError::Domain(
                ErrorInfo::new("evaluation-non-finite", "evaluator returned non-finite data")
                    .at(k),
            ));
        }
        Ok(())
    }
}

/// Open mode reported by a [`crate::ModeLookup`] at a fixed energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenMode {
    /// Momentum of the mode.
    pub momentum: f64,
    /// Group velocity of the mode.
    pub velocity: f64,
}

/// Closed periodic interval `[lower, upper]` used for periodic reduction.
///
/// Always satisfies `lower < upper` with finite bounds, including when
/// deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    lower: f64,
    upper: f64,
}

/// Unchecked wire form of [`Period`].
#[derive(Deserialize)]
struct RawPeriod {
    lower: f64,
    upper: f64,
}

impl TryFrom<RawPeriod> for Period {
    type Error = BandError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Period::new(raw.lower, raw.upper)
    }
}

impl Period {
    /// Creates a period, rejecting non-finite, swapped or coincident bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self, BandError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(BandError::Input(
                ErrorInfo::new("period-non-finite", "period bounds must be real numbers")
                    .with_context("lower", lower)
                    .with_context("upper", upper),
            ));
        }
        if lower > upper {
            return Err(BandError::Input(
                ErrorInfo::new("period-swapped", "period bounds swapped")
                    .with_context("lower", lower)
                    .with_context("upper", upper),
            ));
        }
        if lower == upper {
            return Err(BandError::Input(
                ErrorInfo::new("period-empty", "period must have positive length")
                    .with_context("lower", lower)
                    .with_context("upper", upper),
            ));
        }
        Ok(Self { lower, upper })
    }

    /// The `[-pi, pi]` Brillouin zone.
    pub fn brillouin_zone() -> Self {
        Self {
            lower: -std::f64::consts::PI,
            upper: std::f64::consts::PI,
        }
    }

    /// Lower bound of the period.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound of the period.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Length `upper - lower` of the period.
    pub fn length(&self) -> f64 {
        self.upper - self.lower
    }

    /// Returns `true` when `k` lies inside the closed period.
    pub fn contains(&self, k: f64) -> bool {
        self.lower <= k && k <= self.upper
    }

    /// Maps `k` into `[lower, upper]`. Points already inside are returned
    /// untouched so that knots survive the reduction bit for bit.
    pub fn reduce(&self, k: f64) -> f64 {
        if self.contains(k) {
            return k;
        }
        let reduced = self.lower + (k - self.lower).rem_euclid(self.length());
        reduced.clamp(self.lower, self.upper)
    }
}
