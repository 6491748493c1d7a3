#![deny(missing_docs)]
#![doc = "Core traits and data types for the bandsketch band-tracking engine."]

pub mod errors;
pub mod numeric;
mod types;

pub use errors::{BandError, ErrorInfo};
pub use numeric::{intersect_intervals, interval_intersection, pairwise, unique_sorted};
pub use types::{Evaluation, OpenMode, Period};

/// Black-box vector evaluator sampled by the matching engine.
///
/// Implementations must be deterministic for a fixed `k` and return the
/// same number of components on every call of one construction.
pub trait Evaluator {
    /// Evaluates the unordered components and their first derivatives.
    fn evaluate(&self, k: f64) -> Result<Evaluation, BandError>;

    /// Optional estimate of the output magnitude, used to scale the
    /// absolute tolerance. When `None` the magnitude is estimated from the
    /// coarse samples.
    fn magnitude_hint(&self) -> Option<f64> {
        None
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, k: f64) -> Result<Evaluation, BandError> {
        (**self).evaluate(k)
    }

    fn magnitude_hint(&self) -> Option<f64> {
        (**self).magnitude_hint()
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, k: f64) -> Result<Evaluation, BandError> {
        (**self).evaluate(k)
    }

    fn magnitude_hint(&self) -> Option<f64> {
        (**self).magnitude_hint()
    }
}

/// Adapter turning an infallible closure into an [`Evaluator`].
#[derive(Clone)]
pub struct FnEvaluator<F> {
    func: F,
    magnitude: Option<f64>,
}

impl<F> FnEvaluator<F>
where
    F: Fn(f64) -> Evaluation,
{
    /// Wraps the closure.
    pub fn new(func: F) -> Self {
        Self {
            func,
            magnitude: None,
        }
    }

    /// Attaches a fixed magnitude hint.
    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }
}

impl<F> std::fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEvaluator")
            .field("magnitude", &self.magnitude)
            .finish_non_exhaustive()
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(f64) -> Evaluation,
{
    fn evaluate(&self, k: f64) -> Result<Evaluation, BandError> {
        Ok((self.func)(k))
    }

    fn magnitude_hint(&self) -> Option<f64> {
        self.magnitude
    }
}

/// Lookup of the open modes at a fixed energy.
///
/// Lookups may legitimately fail close to band edges; callers treat an
/// error as "no modes".
pub trait ModeLookup: Send + Sync {
    /// Returns the open modes at `energy`.
    fn modes_at_energy(&self, energy: f64) -> Result<Vec<OpenMode>, BandError>;
}
