//! Continuously ordered band structures and the queries built on them:
//! evaluation, roots, inequality intervals and scattering mode lookup.

pub mod build;
pub mod config;
pub mod hash;
pub mod view;

pub use bandsketch_core::numeric::intersect_intervals;
pub use build::{spectra, spectrum, spectrum_with_modes};
pub use config::SpectrumConfig;
pub use hash::canonical_spectrum_hash;
pub use view::{BuildDiagnostics, IntersectOpts, Spectrum, SpectrumSummary, Target};
