#![doc = "Adaptive sampling and continuity matching of unordered vector valued functions."]

pub mod assignment;
pub mod convergence;
pub mod cost;
pub mod engine;
pub mod sample;

pub use assignment::{AssignmentSolver, Hungarian};
pub use convergence::{converged, interpolation_error, CubicErrorEstimate, IntervalCriterion};
pub use cost::{cost_matrix, ContinuityMatcher};
pub use engine::{match_functions, BandMatchingEngine, MatchOutcome, MatchStats, MatchedSamples, NodeId};
pub use sample::Sample;
