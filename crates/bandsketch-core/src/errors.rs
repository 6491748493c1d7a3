//! Structured error types shared across bandsketch crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context key holding the momentum at which an error arose.
pub const MOMENTUM_KEY: &str = "k";

/// Structured payload attached to every [`BandError`] variant.
///
/// Renders as `[code] message at k=<k> (key=value, ...); hint: ...`, the
/// momentum being pulled out of the context when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs: momenta, band indices, sizes.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Records the momentum `k` the failure refers to.
    pub fn at(self, k: f64) -> Self {
        self.with_context(MOMENTUM_KEY, k)
    }

    /// Records the band index the failure refers to.
    pub fn for_band(self, band: usize) -> Self {
        self.with_context("band", band)
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the bandsketch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum BandError {
    /// Malformed parameters: swapped bounds, non-finite values, band index
    /// out of range, invalid iteration counts.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Array lengths or shapes that do not agree.
    #[error("shape error: {0}")]
    Shape(ErrorInfo),
    /// Query outside the sampled domain or data violating a domain
    /// precondition (ordering, finiteness).
    #[error("domain error: {0}")]
    Domain(ErrorInfo),
    /// Failures reported by an external collaborator.
    #[error("evaluator error: {0}")]
    Evaluator(ErrorInfo),
    /// The assignment solver could not produce a perfect matching.
    #[error("assignment error: {0}")]
    Assignment(ErrorInfo),
    /// Serialization and configuration decoding errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(k) = self.context.get(MOMENTUM_KEY) {
            write!(f, " at k={k}")?;
        }
        let rest: Vec<String> = self
            .context
            .iter()
            .filter(|(key, _)| key.as_str() != MOMENTUM_KEY)
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if !rest.is_empty() {
            write!(f, " ({})", rest.join(", "))?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl BandError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            BandError::Input(info)
            | BandError::Shape(info)
            | BandError::Domain(info)
            | BandError::Evaluator(info)
            | BandError::Assignment(info)
            | BandError::Serde(info) => info,
        }
    }

    /// Returns the stable machine readable code of the error.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Shorthand for an [`BandError::Input`] error.
    pub fn input(code: &str, message: impl Into<String>) -> Self {
        BandError::Input(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`BandError::Shape`] error.
    pub fn shape(code: &str, message: impl Into<String>) -> Self {
        BandError::Shape(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`BandError::Domain`] error.
    pub fn domain(code: &str, message: impl Into<String>) -> Self {
        BandError::Domain(ErrorInfo::new(code, message))
    }
}
