use serde::{Deserialize, Serialize};

const BISECTION_STEPS: usize = 96;
const TANGENT_TOL: f64 = 1e-12;
const MERGE_TOL: f64 = 1e-10;

/// A solution reported by [`crate::CubicHermite::roots`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Root {
    /// Isolated root at the given abscissa.
    Point(f64),
    /// The interpolant equals the target on the whole interval.
    FlatInterval {
        /// Left breakpoint of the interval.
        start: f64,
        /// Right breakpoint of the interval.
        end: f64,
    },
}

impl Root {
    /// Returns the abscissa of an isolated root.
    pub fn point(&self) -> Option<f64> {
        match self {
            Root::Point(x) => Some(*x),
            Root::FlatInterval { .. } => None,
        }
    }
}

/// Roots of a cubic on the unit interval `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UnitRoots {
    Flat,
    Points(Vec<f64>),
}

#[inline]
fn horner(coeffs: [f64; 4], s: f64) -> f64 {
    ((coeffs[0] * s + coeffs[1]) * s + coeffs[2]) * s + coeffs[3]
}

/// Real roots of `a s^2 + b s + c`, numerically stable form.
fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a == 0.0 {
        if b == 0.0 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        return vec![0.0];
    }
    let mut roots = vec![q / a, c / q];
    roots.sort_by(f64::total_cmp);
    roots
}

fn bisect(coeffs: [f64; 4], mut lo: f64, mut hi: f64, mut f_lo: f64) -> f64 {
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = horner(coeffs, mid);
        if f_mid == 0.0 {
            return mid;
        }
        if (f_mid < 0.0) == (f_lo < 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Finds the roots of `coeffs[0] s^3 + coeffs[1] s^2 + coeffs[2] s + coeffs[3]`
/// on `[0, 1]`.
///
/// `right_value` is the exact value at `s = 1` (the knot value), so roots
/// sitting on the right breakpoint are not lost to rounding in the Horner
/// evaluation.
pub(crate) fn unit_cubic_roots(coeffs: [f64; 4], right_value: f64) -> UnitRoots {
    if coeffs.iter().all(|&c| c == 0.0) {
        return UnitRoots::Flat;
    }
    let scale = coeffs.iter().fold(0.0f64, |acc, c| acc.max(c.abs()));

    let critical: Vec<f64> =
        quadratic_roots(3.0 * coeffs[0], 2.0 * coeffs[1], coeffs[2])
            .into_iter()
            .filter(|&s| s > 0.0 && s < 1.0)
            .collect();

    let mut nodes = Vec::with_capacity(critical.len() + 2);
    nodes.push(0.0);
    nodes.extend(critical.iter().copied());
    nodes.push(1.0);
    let values: Vec<f64> = nodes
        .iter()
        .enumerate()
        .map(|(idx, &s)| {
            if idx + 1 == nodes.len() {
                right_value
            } else {
                horner(coeffs, s)
            }
        })
        .collect();

    let mut roots = Vec::new();
    for idx in 0..nodes.len() {
        let value = values[idx];
        if value.abs() <= TANGENT_TOL * scale {
            roots.push(nodes[idx]);
        }
        if idx + 1 < nodes.len() {
            let next = values[idx + 1];
            let resolved = |v: f64| v.abs() <= TANGENT_TOL * scale;
            if !resolved(value) && !resolved(next) && (value < 0.0) != (next < 0.0) {
                roots.push(bisect(coeffs, nodes[idx], nodes[idx + 1], value));
            }
        }
    }

    roots.sort_by(f64::total_cmp);
    roots.dedup_by(|a, b| (*a - *b).abs() <= MERGE_TOL);
    UnitRoots::Points(roots)
}
