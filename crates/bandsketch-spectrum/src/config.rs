use std::f64::consts::PI;

use bandsketch_core::errors::{BandError, ErrorInfo};
use bandsketch_core::Period;
use serde::{Deserialize, Serialize};

fn config_error(code: &str, message: impl Into<String>) -> BandError {
    BandError::Input(ErrorInfo::new(code, message))
}

fn serde_error(code: &str, err: impl ToString) -> BandError {
    BandError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// YAML/JSON configurable parameters of a spectrum construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Left end of the sampled momentum interval.
    #[serde(default = "default_kmin")]
    pub kmin: f64,
    /// Right end of the sampled momentum interval.
    #[serde(default = "default_kmax")]
    pub kmax: f64,
    /// Momentum at which bands are numbered by ascending value.
    #[serde(default)]
    pub orderpoint: f64,
    /// Required accuracy, relative to the magnitude of the evaluator output.
    #[serde(default = "default_tol")]
    pub tol: f64,
    /// Number of equal coarse segments sampled before refinement.
    #[serde(default = "default_min_iter")]
    pub min_iter: usize,
    /// Budget of interval refinement tasks.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Periodic interval used to reduce query momenta, `None` disables the
    /// reduction.
    #[serde(default = "default_period")]
    pub period: Option<Period>,
}

fn default_kmin() -> f64 {
    -PI
}

fn default_kmax() -> f64 {
    PI
}

fn default_tol() -> f64 {
    1e-8
}

fn default_min_iter() -> usize {
    10
}

fn default_max_iter() -> usize {
    100_000
}

fn default_period() -> Option<Period> {
    Some(Period::brillouin_zone())
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            kmin: default_kmin(),
            kmax: default_kmax(),
            orderpoint: 0.0,
            tol: default_tol(),
            min_iter: default_min_iter(),
            max_iter: default_max_iter(),
            period: default_period(),
        }
    }
}

impl SpectrumConfig {
    /// Sampled interval `[kmin, kmax]`.
    pub fn with_range(mut self, kmin: f64, kmax: f64) -> Self {
        self.kmin = kmin;
        self.kmax = kmax;
        self
    }

    /// Requested accuracy.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Periodic interval, or `None` for a non-periodic spectrum.
    pub fn with_period(mut self, period: Option<Period>) -> Self {
        self.period = period;
        self
    }

    /// Checks the parameters before any evaluator call is made.
    pub fn validate(&self) -> Result<(), BandError> {
        if !self.kmin.is_finite() || !self.kmax.is_finite() {
            return Err(BandError::Input(
                ErrorInfo::new("bounds-non-finite", "kmin and kmax must be real numbers")
                    .with_context("kmin", self.kmin)
                    .with_context("kmax", self.kmax),
            ));
        }
        if self.kmin >= self.kmax {
            return Err(BandError::Input(
                ErrorInfo::new("bounds-order", "sampled interval must satisfy kmin < kmax")
                    .with_context("kmin", self.kmin)
                    .with_context("kmax", self.kmax)
                    .with_hint("at least two distinct samples are required for interpolation"),
            ));
        }
        if !self.orderpoint.is_finite() {
            return Err(config_error("orderpoint-non-finite", "orderpoint must be a real number"));
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(BandError::Input(
                ErrorInfo::new("tol-invalid", "tolerance must be positive and finite")
                    .with_context("tol", self.tol),
            ));
        }
        if self.min_iter == 0 || self.min_iter >= self.max_iter {
            return Err(BandError::Input(
                ErrorInfo::new("iteration-bounds", "0 < min_iter < max_iter is required")
                    .with_context("min_iter", self.min_iter)
                    .with_context("max_iter", self.max_iter),
            ));
        }
        if let Some(period) = &self.period {
            Period::new(period.lower(), period.upper())?;
        }
        Ok(())
    }

    /// Parses a YAML document, filling missing fields with defaults.
    pub fn from_yaml_str(data: &str) -> Result<Self, BandError> {
        let config: Self = serde_yaml::from_str(data).map_err(|err| serde_error("yaml_deserialize", err))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document, filling missing fields with defaults.
    pub fn from_json_str(data: &str) -> Result<Self, BandError> {
        let config: Self = serde_json::from_str(data).map_err(|err| serde_error("json_deserialize", err))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, BandError> {
        serde_yaml::to_string(self).map_err(|err| serde_error("yaml_serialize", err))
    }
}
