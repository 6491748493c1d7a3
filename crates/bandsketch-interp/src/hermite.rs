use bandsketch_core::errors::{BandError, ErrorInfo};
use nalgebra::DMatrix;

use crate::roots::{unit_cubic_roots, Root, UnitRoots};

fn shape_error(code: &str, message: impl Into<String>) -> BandError {
    BandError::Shape(ErrorInfo::new(code, message))
}

fn domain_error(code: &str, message: impl Into<String>) -> BandError {
    BandError::Domain(ErrorInfo::new(code, message))
}

/// Piecewise cubic Hermite interpolant of a vector valued function.
///
/// On the interval `[x_i, x_{i+1}]` every component is the cubic
/// `q(t) = c0 t^3 + c1 t^2 + c2 t + c3` with `t = x - x_i`, determined by
/// the values and first derivatives at both breakpoints. Value and first
/// derivative are therefore continuous across breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicHermite {
    x: Vec<f64>,
    ncomp: usize,
    /// Knot values, row major `n x ncomp`.
    values: Vec<f64>,
    /// Knot derivatives, row major `n x ncomp`.
    derivatives: Vec<f64>,
    /// `[c0, c1, c2, c3]` per interval and component, interval major.
    coeffs: Vec<[f64; 4]>,
    extrapolate: bool,
}

impl CubicHermite {
    /// Builds the interpolant from abscissas `x` (length `n`) and `n x m`
    /// matrices of values and derivatives.
    pub fn build(x: &[f64], y: &DMatrix<f64>, dy: &DMatrix<f64>) -> Result<Self, BandError> {
        let n = x.len();
        if n < 2 {
            return Err(BandError::Shape(
                ErrorInfo::new("too-few-points", "at least two points needed for interpolation")
                    .with_context("points", n),
            ));
        }
        if y.nrows() != n {
            return Err(BandError::Shape(
                ErrorInfo::new("length-mismatch", "`x` and `y` must have the same length")
                    .with_context("x", n)
                    .with_context("y", y.nrows()),
            ));
        }
        if y.shape() != dy.shape() {
            return Err(shape_error(
                "shape-mismatch",
                "`y` and `dy` must have the same shape",
            ));
        }
        if y.ncols() == 0 {
            return Err(shape_error("no-components", "`y` must carry at least one component"));
        }
        if !x.iter().all(|v| v.is_finite()) {
            return Err(domain_error("x-non-finite", "`x` must contain finite real values"));
        }
        if !y.iter().chain(dy.iter()).all(|v| v.is_finite()) {
            return Err(domain_error(
                "y-non-finite",
                "`y` and `dy` must contain finite real values",
            ));
        }
        if let Some(idx) = x.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(BandError::Domain(
                ErrorInfo::new("x-not-increasing", "`x` must be strictly increasing")
                    .with_context("index", idx + 1),
            ));
        }

        let ncomp = y.ncols();
        let mut values = Vec::with_capacity(n * ncomp);
        let mut derivatives = Vec::with_capacity(n * ncomp);
        for row in 0..n {
            for comp in 0..ncomp {
                values.push(y[(row, comp)]);
                derivatives.push(dy[(row, comp)]);
            }
        }

        let mut coeffs = Vec::with_capacity((n - 1) * ncomp);
        for i in 0..n - 1 {
            let h = x[i + 1] - x[i];
            for comp in 0..ncomp {
                let (y0, y1) = (y[(i, comp)], y[(i + 1, comp)]);
                let (d0, d1) = (dy[(i, comp)], dy[(i + 1, comp)]);
                let slope = (y1 - y0) / h;
                let t = (d0 + d1 - 2.0 * slope) / h;
                coeffs.push([t / h, (slope - d0) / h - t, d0, y0]);
            }
        }

        Ok(Self {
            x: x.to_vec(),
            ncomp,
            values,
            derivatives,
            coeffs,
            extrapolate: false,
        })
    }

    /// Builds a single component interpolant from plain slices.
    pub fn build_scalar(x: &[f64], y: &[f64], dy: &[f64]) -> Result<Self, BandError> {
        if y.len() != x.len() || dy.len() != x.len() {
            return Err(BandError::Shape(
                ErrorInfo::new("length-mismatch", "`x`, `y` and `dy` must have the same length")
                    .with_context("x", x.len())
                    .with_context("y", y.len())
                    .with_context("dy", dy.len()),
            ));
        }
        let y = DMatrix::from_column_slice(y.len(), 1, y);
        let dy = DMatrix::from_column_slice(dy.len(), 1, dy);
        Self::build(x, &y, &dy)
    }

    /// Enables or disables extrapolation from the outermost intervals.
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Breakpoints of the interpolant.
    pub fn breakpoints(&self) -> &[f64] {
        &self.x
    }

    /// Number of interpolated components.
    pub fn components(&self) -> usize {
        self.ncomp
    }

    /// Number of polynomial pieces.
    pub fn intervals(&self) -> usize {
        self.x.len() - 1
    }

    /// Coefficients `[c0, c1, c2, c3]` of a component on an interval.
    pub fn coefficients(&self, interval: usize, component: usize) -> Option<[f64; 4]> {
        if interval >= self.intervals() || component >= self.ncomp {
            return None;
        }
        Some(self.coeffs[interval * self.ncomp + component])
    }

    /// Locates the interval containing `k`, checking the domain.
    fn locate(&self, k: f64) -> Result<usize, BandError> {
        let first = self.x[0];
        let last = self.x[self.x.len() - 1];
        if !k.is_finite() {
            return Err(BandError::Input(
                ErrorInfo::new("k-non-finite", "abscissa must be a finite real number")
                    .at(k),
            ));
        }
        if !self.extrapolate && (k < first || k > last) {
            return Err(BandError::Domain(
                ErrorInfo::new("outside-domain", "abscissa outside the interpolation interval")
                    .at(k)
                    .with_context("xmin", first)
                    .with_context("xmax", last),
            ));
        }
        let idx = self.x.partition_point(|&v| v <= k);
        Ok(idx.saturating_sub(1).min(self.intervals() - 1))
    }

    fn component_at(&self, interval: usize, component: usize, k: f64, order: usize) -> f64 {
        let last = self.x.len() - 1;
        if k == self.x[last] && order <= 1 {
            let slot = last * self.ncomp + component;
            return if order == 0 {
                self.values[slot]
            } else {
                self.derivatives[slot]
            };
        }
        let [c0, c1, c2, c3] = self.coeffs[interval * self.ncomp + component];
        let t = k - self.x[interval];
        match order {
            0 => ((c0 * t + c1) * t + c2) * t + c3,
            1 => (3.0 * c0 * t + 2.0 * c1) * t + c2,
            2 => 6.0 * c0 * t + 2.0 * c1,
            3 => 6.0 * c0,
            _ => 0.0,
        }
    }

    /// Evaluates all components (or their `order`-th derivative) at `k`.
    pub fn evaluate(&self, k: f64, order: usize) -> Result<Vec<f64>, BandError> {
        let interval = self.locate(k)?;
        Ok((0..self.ncomp)
            .map(|comp| self.component_at(interval, comp, k, order))
            .collect())
    }

    /// Evaluates a single component (or its `order`-th derivative) at `k`.
    pub fn evaluate_component(
        &self,
        k: f64,
        component: usize,
        order: usize,
    ) -> Result<f64, BandError> {
        if component >= self.ncomp {
            return Err(BandError::Input(
                ErrorInfo::new("component-out-of-range", "component index out of range")
                    .with_context("component", component)
                    .with_context("components", self.ncomp),
            ));
        }
        let interval = self.locate(k)?;
        Ok(self.component_at(interval, component, k, order))
    }

    /// Solves `q(x) = target` for one component on every interval.
    ///
    /// Roots on a shared breakpoint are reported once. Intervals on which the
    /// component is identically equal to the target are reported as
    /// [`Root::FlatInterval`].
    pub fn roots(&self, component: usize, target: f64) -> Result<Vec<Root>, BandError> {
        if component >= self.ncomp {
            return Err(BandError::Input(
                ErrorInfo::new("component-out-of-range", "component index out of range")
                    .with_context("component", component)
                    .with_context("components", self.ncomp),
            ));
        }
        let mut roots: Vec<Root> = Vec::new();
        for interval in 0..self.intervals() {
            let x0 = self.x[interval];
            let x1 = self.x[interval + 1];
            let h = x1 - x0;
            let [c0, c1, c2, c3] = self.coeffs[interval * self.ncomp + component];
            let unit = [c0 * h * h * h, c1 * h * h, c2 * h, c3 - target];
            let right = self.values[(interval + 1) * self.ncomp + component] - target;
            match unit_cubic_roots(unit, right) {
                UnitRoots::Flat => roots.push(Root::FlatInterval { start: x0, end: x1 }),
                UnitRoots::Points(points) => {
                    for s in points {
                        let x = if s >= 1.0 { x1 } else { x0 + s * h };
                        let repeated = matches!(
                            roots.last(),
                            Some(Root::Point(prev)) if (x - prev).abs() <= 1e-10 * h
                        );
                        if !repeated {
                            roots.push(Root::Point(x));
                        }
                    }
                }
            }
        }
        Ok(roots)
    }

    /// Isolated roots only, flat intervals discarded.
    pub fn point_roots(&self, component: usize, target: f64) -> Result<Vec<f64>, BandError> {
        Ok(self
            .roots(component, target)?
            .iter()
            .filter_map(Root::point)
            .collect())
    }
}
