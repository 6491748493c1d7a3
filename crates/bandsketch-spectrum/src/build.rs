use std::sync::Arc;

use bandsketch_core::errors::{BandError, ErrorInfo};
use bandsketch_core::{Evaluator, ModeLookup};
use bandsketch_match::{BandMatchingEngine, CubicErrorEstimate, MatchedSamples};
use log::{debug, info};

use crate::config::SpectrumConfig;
use crate::view::{BuildDiagnostics, Spectrum};

/// Samples `evaluator` over the configured interval and returns the
/// continuously ordered, interpolated spectrum.
pub fn spectrum<E: Evaluator>(evaluator: E, config: &SpectrumConfig) -> Result<Spectrum, BandError> {
    build(evaluator, None, config)
}

/// Like [`spectrum`], attaching a mode lookup for the scattering mode
/// queries.
pub fn spectrum_with_modes<E: Evaluator>(
    evaluator: E,
    modes: Arc<dyn ModeLookup>,
    config: &SpectrumConfig,
) -> Result<Spectrum, BandError> {
    build(evaluator, Some(modes), config)
}

/// Builds one spectrum per evaluator with a shared configuration.
pub fn spectra<E, I>(evaluators: I, config: &SpectrumConfig) -> Result<Vec<Spectrum>, BandError>
where
    E: Evaluator,
    I: IntoIterator<Item = E>,
{
    evaluators
        .into_iter()
        .map(|evaluator| spectrum(evaluator, config))
        .collect()
}

/// Columns sorted by ascending value at the sample nearest `orderpoint`.
fn band_order(samples: &MatchedSamples, orderpoint: f64) -> Vec<usize> {
    let row = samples
        .x
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - orderpoint).abs().total_cmp(&(b.1 - orderpoint).abs()))
        .map(|(row, _)| row)
        .unwrap_or(0);
    let mut order: Vec<usize> = (0..samples.nbands()).collect();
    order.sort_by(|&a, &b| samples.y[(row, a)].total_cmp(&samples.y[(row, b)]));
    order
}

fn build<E: Evaluator>(
    evaluator: E,
    modes: Option<Arc<dyn ModeLookup>>,
    config: &SpectrumConfig,
) -> Result<Spectrum, BandError> {
    config.validate()?;

    let hint = evaluator.magnitude_hint();
    let mut engine = BandMatchingEngine::new(evaluator, config.max_iter);
    let grid = engine.seed_grid(config.kmin, config.kmax, config.min_iter)?;
    let magnitude = match hint {
        Some(hint) => hint.abs(),
        None => engine.magnitude(&grid)?,
    };
    let scale = if magnitude.is_finite() && magnitude > 0.0 {
        magnitude
    } else {
        1.0
    };
    let effective_tol = config.tol * scale;
    debug!("output magnitude {scale:e}, effective tolerance {effective_tol:e}");

    let outcome = engine.run(&grid, &CubicErrorEstimate::new(effective_tol))?;
    if outcome.samples.len() < 2 {
        return Err(BandError::Domain(
            ErrorInfo::new("too-few-samples", "matching produced fewer than two samples")
                .with_context("samples", outcome.samples.len())
                .with_context("max_iter", config.max_iter)
                .with_hint("increase max_iter"),
        ));
    }

    let samples = outcome.samples.select_bands(&band_order(&outcome.samples, config.orderpoint));
    let diagnostics = BuildDiagnostics {
        evaluations: outcome.stats.evaluations,
        tasks: outcome.stats.tasks,
        budget_exhausted: outcome.stats.budget_exhausted,
        scale,
        effective_tol,
    };

    let mut spectrum = Spectrum::from_samples(samples.x, samples.y, samples.dy, config.tol)?
        .with_ordering(samples.order)?
        .with_diagnostics(diagnostics);
    spectrum.set_period(config.period)?;
    if let Some(modes) = modes {
        spectrum = spectrum.with_modes(modes);
    }
    info!(
        "spectrum with {} bands on [{}, {}]: {} samples, {} evaluations",
        spectrum.nbands(),
        spectrum.kmin(),
        spectrum.kmax(),
        spectrum.x().len(),
        diagnostics.evaluations
    );
    Ok(spectrum)
}
