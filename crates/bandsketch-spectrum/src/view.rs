use std::fmt;
use std::sync::Arc;

use bandsketch_core::errors::{BandError, ErrorInfo};
use bandsketch_core::numeric::{is_zero, pairwise, unique_sorted};
use bandsketch_core::{ModeLookup, Period};
use bandsketch_interp::CubicHermite;
use log::warn;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::hash::canonical_spectrum_hash;

fn band_error(band: usize, nbands: usize) -> BandError {
    BandError::Input(
        ErrorInfo::new("band-out-of-range", "band index out of range")
            .for_band(band)
            .with_context("nbands", nbands),
    )
}

/// Right-hand side of `d^m E_band(k) / dk^m = f(k)` in [`Spectrum::intersect`].
#[derive(Clone, Copy)]
pub enum Target<'a> {
    /// Constant value.
    Value(f64),
    /// Momentum dependent value, sampled on the knots.
    Function(&'a dyn Fn(f64) -> f64),
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Target::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<f64> for Target<'_> {
    fn from(value: f64) -> Self {
        Target::Value(value)
    }
}

/// Optional overrides for root and interval queries. Missing entries fall
/// back to the spectrum's sampled interval and tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntersectOpts {
    /// Left end of the query range.
    pub kmin: Option<f64>,
    /// Right end of the query range.
    pub kmax: Option<f64>,
    /// Roots closer than `tol` are merged.
    pub tol: Option<f64>,
    /// Noise level below which a curve counts as flat.
    pub ytol: Option<f64>,
}

impl IntersectOpts {
    /// Restricts the query to `[kmin, kmax]`.
    pub fn within(kmin: f64, kmax: f64) -> Self {
        Self {
            kmin: Some(kmin),
            kmax: Some(kmax),
            ..Self::default()
        }
    }

    /// Overrides the root merging tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    /// Overrides the flatness threshold.
    pub fn with_ytol(mut self, ytol: f64) -> Self {
        self.ytol = Some(ytol);
        self
    }
}

/// Counters recorded while building a spectrum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildDiagnostics {
    /// Evaluator calls.
    pub evaluations: usize,
    /// Refinement tasks processed by the matching engine.
    pub tasks: usize,
    /// `true` when the task budget ran out and the spectrum is partial.
    pub budget_exhausted: bool,
    /// Magnitude used to scale the tolerance.
    pub scale: f64,
    /// Absolute tolerance handed to the convergence estimate.
    pub effective_tol: f64,
}

/// Serializable digest of a [`Spectrum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSummary {
    /// Number of bands.
    pub nbands: usize,
    /// Number of accepted samples.
    pub samples: usize,
    /// Left end of the sampled interval.
    pub kmin: f64,
    /// Right end of the sampled interval.
    pub kmax: f64,
    /// Requested (unscaled) tolerance.
    pub tol: f64,
    /// Period used for reduction, if any.
    pub period: Option<Period>,
    /// Construction counters.
    pub diagnostics: BuildDiagnostics,
    /// [`Spectrum::canonical_hash`] at the time of the summary.
    pub hash: String,
}

/// Continuously ordered band structure with curve sketching queries.
///
/// Bands are numbered by ascending value at the construction orderpoint and
/// keep their identity through crossings. When a period is configured,
/// query momenta are reduced into it before evaluation.
#[derive(Clone)]
pub struct Spectrum {
    x: Vec<f64>,
    y: DMatrix<f64>,
    dy: DMatrix<f64>,
    ordering: DMatrix<usize>,
    spline: CubicHermite,
    kmin: f64,
    kmax: f64,
    tol: f64,
    period: Option<Period>,
    modes: Option<Arc<dyn ModeLookup>>,
    diagnostics: BuildDiagnostics,
}

impl fmt::Debug for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spectrum")
            .field("nbands", &self.nbands())
            .field("samples", &self.x.len())
            .field("kmin", &self.kmin)
            .field("kmax", &self.kmax)
            .field("tol", &self.tol)
            .field("period", &self.period)
            .field("modes", &self.modes.is_some())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl Spectrum {
    /// Builds a spectrum from already ordered samples.
    ///
    /// `y` and `dy` are `x.len() x nbands`. The ordering defaults to the
    /// identity and the period to `[-pi, pi]`.
    pub fn from_samples(x: Vec<f64>, y: DMatrix<f64>, dy: DMatrix<f64>, tol: f64) -> Result<Self, BandError> {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(BandError::Input(
                ErrorInfo::new("tol-invalid", "tolerance must be positive and finite").with_context("tol", tol),
            ));
        }
        let spline = CubicHermite::build(&x, &y, &dy)?;
        let nbands = y.ncols();
        let ordering = DMatrix::from_fn(x.len(), nbands, |_, band| band);
        let kmin = x[0];
        let kmax = x[x.len() - 1];
        Ok(Self {
            x,
            y,
            dy,
            ordering,
            spline,
            kmin,
            kmax,
            tol,
            period: Some(Period::brillouin_zone()),
            modes: None,
            diagnostics: BuildDiagnostics::default(),
        })
    }

    /// Attaches the raw evaluator position of every band per sample.
    pub fn with_ordering(mut self, ordering: DMatrix<usize>) -> Result<Self, BandError> {
        if ordering.shape() != self.y.shape() {
            return Err(BandError::Shape(
                ErrorInfo::new("ordering-shape", "ordering must have the shape of the samples")
                    .with_context("rows", ordering.nrows())
                    .with_context("cols", ordering.ncols()),
            ));
        }
        self.ordering = ordering;
        Ok(self)
    }

    /// Attaches the open-mode lookup used by the scattering mode queries.
    pub fn with_modes(mut self, modes: Arc<dyn ModeLookup>) -> Self {
        self.modes = Some(modes);
        self
    }

    pub(crate) fn with_diagnostics(mut self, diagnostics: BuildDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Sampled momenta.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Band values at the samples, one column per band.
    pub fn y(&self) -> &DMatrix<f64> {
        &self.y
    }

    /// Band derivatives at the samples.
    pub fn dy(&self) -> &DMatrix<f64> {
        &self.dy
    }

    /// Raw evaluator position of every band at every sample.
    pub fn ordering(&self) -> &DMatrix<usize> {
        &self.ordering
    }

    /// Raw evaluator position of `band` at sample `sample`.
    pub fn native_index(&self, sample: usize, band: usize) -> Option<usize> {
        if sample < self.ordering.nrows() && band < self.ordering.ncols() {
            Some(self.ordering[(sample, band)])
        } else {
            None
        }
    }

    /// Number of bands.
    pub fn nbands(&self) -> usize {
        self.y.ncols()
    }

    /// Left end of the sampled interval.
    pub fn kmin(&self) -> f64 {
        self.kmin
    }

    /// Right end of the sampled interval. Falls short of the requested end
    /// when the build ran out of budget.
    pub fn kmax(&self) -> f64 {
        self.kmax
    }

    /// Requested tolerance, before scaling by the output magnitude.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Period used to reduce query momenta.
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// Counters recorded during construction.
    pub fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    /// Interpolant through the ordered samples.
    pub fn interpolant(&self) -> &CubicHermite {
        &self.spline
    }

    /// Sets or clears the periodic interval used to reduce query momenta.
    ///
    /// The bounds are checked again, so a period built by hand cannot slip
    /// an empty or swapped interval past [`Period::new`].
    pub fn set_period(&mut self, period: Option<Period>) -> Result<(), BandError> {
        self.period = match period {
            Some(period) => Some(Period::new(period.lower(), period.upper())?),
            None => None,
        };
        Ok(())
    }

    /// Hex encoded sha256 of the samples, orderings and coefficients.
    pub fn canonical_hash(&self) -> String {
        canonical_spectrum_hash(self)
    }

    /// Serializable digest, including the canonical hash.
    pub fn summary(&self) -> SpectrumSummary {
        SpectrumSummary {
            nbands: self.nbands(),
            samples: self.x.len(),
            kmin: self.kmin,
            kmax: self.kmax,
            tol: self.tol,
            period: self.period,
            diagnostics: self.diagnostics,
            hash: self.canonical_hash(),
        }
    }

    fn reduce(&self, k: f64) -> Result<f64, BandError> {
        if !k.is_finite() {
            return Err(BandError::Input(
                ErrorInfo::new("k-non-finite", "momenta must be real numbers").at(k),
            ));
        }
        let reduced = match &self.period {
            Some(period) => period.reduce(k),
            None => k,
        };
        if reduced < self.kmin || reduced > self.kmax {
            return Err(BandError::Domain(
                ErrorInfo::new("outside-sampling-interval", "momenta must lie inside the sampling interval")
                    .at(k)
                    .with_context("kmin", self.kmin)
                    .with_context("kmax", self.kmax),
            ));
        }
        Ok(reduced)
    }

    /// All bands (or their `derivative_order`-th derivative) at `k`.
    pub fn evaluate(&self, k: f64, derivative_order: usize) -> Result<Vec<f64>, BandError> {
        let k = self.reduce(k)?;
        self.spline.evaluate(k, derivative_order)
    }

    /// A single band (or its derivative) at `k`.
    pub fn evaluate_band(&self, k: f64, band: usize, derivative_order: usize) -> Result<f64, BandError> {
        if band >= self.nbands() {
            return Err(band_error(band, self.nbands()));
        }
        let k = self.reduce(k)?;
        self.spline.evaluate_component(k, band, derivative_order)
    }

    /// All bands at several momenta, one row per momentum.
    pub fn evaluate_many(&self, ks: &[f64], derivative_order: usize) -> Result<DMatrix<f64>, BandError> {
        let mut out = DMatrix::zeros(ks.len(), self.nbands());
        for (row, &k) in ks.iter().enumerate() {
            for (band, value) in self.evaluate(k, derivative_order)?.into_iter().enumerate() {
                out[(row, band)] = value;
            }
        }
        Ok(out)
    }

    /// Band curve `(y, dy)` of a derivative order on the knots.
    fn knot_curve(&self, band: usize, derivative_order: usize) -> Result<(Vec<f64>, Vec<f64>), BandError> {
        if derivative_order == 0 {
            return Ok((
                self.y.column(band).iter().copied().collect(),
                self.dy.column(band).iter().copied().collect(),
            ));
        }
        let mut y = Vec::with_capacity(self.x.len());
        let mut dy = Vec::with_capacity(self.x.len());
        for &k in &self.x {
            y.push(self.spline.evaluate_component(k, band, derivative_order)?);
            dy.push(self.spline.evaluate_component(k, band, derivative_order + 1)?);
        }
        Ok((y, dy))
    }

    /// All momenta in `[kmin, kmax]` solving `d^m E_band(k) / dk^m = f(k)`.
    ///
    /// Samples whose value lies within `ytol` of the band's mean are treated
    /// as that mean and derivatives below `ytol` as zero, so that noise on a
    /// flat curve does not produce spurious roots. Flat stretches that
    /// coincide with `f` are not reported. When the requested range leaves
    /// the sampled interval, roots are replicated over every period image
    /// overlapping it.
    pub fn intersect(
        &self,
        f: Target<'_>,
        band: usize,
        derivative_order: usize,
        opts: &IntersectOpts,
    ) -> Result<Vec<f64>, BandError> {
        let kmin = opts.kmin.unwrap_or(self.kmin);
        let kmax = opts.kmax.unwrap_or(self.kmax);
        let tol = opts.tol.unwrap_or(self.tol);
        let ytol = opts.ytol.unwrap_or(self.tol);

        if band >= self.nbands() {
            return Err(band_error(band, self.nbands()));
        }
        if !kmin.is_finite() || !kmax.is_finite() {
            return Err(BandError::Input(
                ErrorInfo::new("bounds-non-finite", "kmin and kmax must be real numbers")
                    .with_context("kmin", kmin)
                    .with_context("kmax", kmax),
            ));
        }
        if kmin > kmax {
            return Err(BandError::Input(
                ErrorInfo::new("bounds-swapped", "bounds swapped")
                    .with_context("kmin", kmin)
                    .with_context("kmax", kmax),
            ));
        }
        if !(tol.is_finite() && tol > 0.0) || !(ytol.is_finite() && ytol > 0.0) {
            return Err(BandError::Input(
                ErrorInfo::new("tol-invalid", "tolerances must be positive and finite")
                    .with_context("tol", tol)
                    .with_context("ytol", ytol),
            ));
        }
        if kmin < self.kmin || kmax > self.kmax {
            let covered = self
                .period
                .map(|period| period.lower() >= self.kmin && period.upper() <= self.kmax)
                .unwrap_or(false);
            if !covered {
                return Err(BandError::Domain(
                    ErrorInfo::new("sample-interval-too-small", "requested range leaves the sampled interval")
                        .with_context("kmin", kmin)
                        .with_context("kmax", kmax)
                        .with_hint("configure a period contained in the sampled interval"),
                ));
            }
        }

        let (mut y, mut dy) = self.knot_curve(band, derivative_order)?;
        let mut mean = y.iter().sum::<f64>() / y.len() as f64;
        if is_zero(mean, ytol) {
            mean = 0.0;
        }
        for value in y.iter_mut() {
            if (*value - mean).abs() < ytol {
                *value = mean;
            }
        }
        for value in dy.iter_mut() {
            if value.abs() < ytol {
                *value = 0.0;
            }
        }
        for (value, &k) in y.iter_mut().zip(&self.x) {
            *value -= match f {
                Target::Value(target) => target,
                Target::Function(func) => func(k),
            };
        }

        let roots = CubicHermite::build_scalar(&self.x, &y, &dy)?.point_roots(0, 0.0)?;

        let mut candidates = Vec::new();
        match &self.period {
            Some(period) => {
                let length = period.length();
                let first = ((kmin - period.upper()) / length).floor() as i64;
                let last = ((kmax - period.lower()) / length).ceil() as i64;
                for root in roots {
                    let reduced = period.reduce(root);
                    candidates.extend((first..=last).map(|n| reduced + n as f64 * length));
                }
            }
            _ => candidates = roots,
        }

        let inside: Vec<f64> = candidates
            .into_iter()
            .filter(|&k| k >= kmin - tol && k <= kmax + tol)
            .map(|k| k.clamp(kmin, kmax))
            .collect();
        Ok(unique_sorted(&inside, tol))
    }

    /// Momentum intervals in `[kmin, kmax]` on which
    /// `lower <= d^m E_band(k) / dk^m <= upper`. A missing bound is open.
    ///
    /// Intervals narrower than `tol` are dropped.
    pub fn intervals(
        &self,
        band: usize,
        derivative_order: usize,
        lower: Option<f64>,
        upper: Option<f64>,
        opts: &IntersectOpts,
    ) -> Result<Vec<(f64, f64)>, BandError> {
        let kmin = opts.kmin.unwrap_or(self.kmin);
        let kmax = opts.kmax.unwrap_or(self.kmax);
        let tol = opts.tol.unwrap_or(self.tol);
        let opts = IntersectOpts {
            kmin: Some(kmin),
            kmax: Some(kmax),
            tol: Some(tol),
            ytol: opts.ytol,
        };

        let mut crossings = vec![kmin, kmax];
        for bound in [lower, upper].into_iter().flatten() {
            crossings.extend(self.intersect(Target::Value(bound), band, derivative_order, &opts)?);
        }
        let crossings = unique_sorted(&crossings, tol);

        let mut intervals = Vec::new();
        for (start, end) in pairwise(&crossings) {
            if is_zero(end - start, tol) {
                continue;
            }
            let mid = self.evaluate_band(0.5 * (start + end), band, derivative_order)?;
            let above = lower.map_or(true, |bound| mid >= bound);
            let below = upper.map_or(true, |bound| mid <= bound);
            if above && below {
                intervals.push((start, end));
            }
        }
        Ok(intervals)
    }

    /// Index of the open scattering mode matching `band` at momentum `k`.
    ///
    /// Among the modes with positive velocity at energy `E_band(k)`, returns
    /// the position of the one whose momentum is nearest to `k`. `None` when
    /// no lookup is attached, the lookup fails, or no mode propagates.
    pub fn momentum_to_scattering_mode(&self, k: f64, band: usize) -> Result<Option<usize>, BandError> {
        let energy = self.evaluate_band(k, band, 0)?;
        let Some(lookup) = &self.modes else {
            warn!("no mode lookup attached, cannot map band {band} at k={k} to a scattering mode");
            return Ok(None);
        };
        let modes = match lookup.modes_at_energy(energy) {
            Ok(modes) => modes,
            Err(err) => {
                warn!("mode lookup failed at energy={energy}: {err}");
                return Ok(None);
            }
        };
        let nearest = modes
            .iter()
            .filter(|mode| mode.velocity > 0.0)
            .enumerate()
            .min_by(|a, b| (a.1.momentum - k).abs().total_cmp(&(b.1.momentum - k).abs()))
            .map(|(index, _)| index);
        if nearest.is_none() {
            warn!("no propagating mode at energy={energy} for band {band}, k={k}");
        }
        Ok(nearest)
    }

    /// Index of the open scattering mode of `band` at `energy`, looking for
    /// the momentum in `[kmin, kmax]`.
    ///
    /// The interval must contain exactly one solution of `E_band(k) = energy`;
    /// otherwise the mapping is ambiguous and `None` is returned.
    pub fn energy_to_scattering_mode(
        &self,
        energy: f64,
        band: usize,
        kmin: f64,
        kmax: f64,
    ) -> Result<Option<usize>, BandError> {
        let ks = self.intersect(Target::Value(energy), band, 0, &IntersectOpts::within(kmin, kmax))?;
        if ks.len() != 1 {
            warn!(
                "no unique band-mode mapping: energy={energy}, band={band}, interval=[{kmin}, {kmax}], k={ks:?}"
            );
            return Ok(None);
        }
        self.momentum_to_scattering_mode(ks[0], band)
    }
}
