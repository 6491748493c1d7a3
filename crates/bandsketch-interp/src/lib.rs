#![deny(missing_docs)]
#![doc = "Piecewise cubic Hermite interpolation with closed-form evaluation and per-interval root finding."]

/// Hermite spline construction and evaluation.
pub mod hermite;
/// Cubic root solving on a single interval.
pub mod roots;

pub use hermite::CubicHermite;
pub use roots::Root;
