use bandsketch_core::errors::{BandError, ErrorInfo};
use bandsketch_core::{Evaluation, Evaluator};
use log::{debug, trace, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentSolver, Hungarian};
use crate::convergence::{CubicErrorEstimate, IntervalCriterion};
use crate::cost::ContinuityMatcher;
use crate::sample::Sample;

/// Handle of a sampled abscissa inside the engine's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    raw: Option<Evaluation>,
    ordered: Option<Sample>,
}

/// Pending refinement of `[left, right]`. `right_sample` carries the
/// already matched right end when the parent computed it.
#[derive(Debug)]
struct Task {
    left: NodeId,
    right: NodeId,
    right_sample: Option<Sample>,
}

/// Counters collected while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Interval tasks processed.
    pub tasks: usize,
    /// Evaluator calls performed.
    pub evaluations: usize,
    /// Number of accepted samples.
    pub samples: usize,
    /// `true` when the task budget ran out before every interval converged.
    pub budget_exhausted: bool,
}

/// Ordered samples sorted by abscissa.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedSamples {
    /// Strictly increasing abscissas.
    pub x: Vec<f64>,
    /// `x.len() x nbands` values in canonical band order.
    pub y: DMatrix<f64>,
    /// `x.len() x nbands` derivatives in canonical band order.
    pub dy: DMatrix<f64>,
    /// Raw evaluator position of every canonical band, per sample.
    pub order: DMatrix<usize>,
}

impl MatchedSamples {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` when no sample was accepted.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of bands.
    pub fn nbands(&self) -> usize {
        self.y.ncols()
    }

    /// Permutes the band columns, `columns[new] = old`.
    pub fn select_bands(&self, columns: &[usize]) -> Self {
        let n = self.x.len();
        let m = columns.len();
        Self {
            x: self.x.clone(),
            y: DMatrix::from_fn(n, m, |row, col| self.y[(row, columns[col])]),
            dy: DMatrix::from_fn(n, m, |row, col| self.dy[(row, columns[col])]),
            order: DMatrix::from_fn(n, m, |row, col| self.order[(row, columns[col])]),
        }
    }
}

/// Result of one matching run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub samples: MatchedSamples,
    pub stats: MatchStats,
}

/// Below this width an interval is accepted without further refinement.
fn resolution_reached(x_left: f64, x_right: f64) -> bool {
    let scale = 1.0f64.max(x_left.abs()).max(x_right.abs());
    (x_right - x_left).abs() <= 10.0 * f64::EPSILON * scale
}

/// Adaptive sampler that orders the components of an evaluator by
/// continuity.
///
/// Abscissas live in an arena; each node caches the raw evaluation and,
/// once accepted, the ordered sample. Refinement is driven by an explicit
/// work stack processed left to right, so the left end of every task is
/// already ordered when the task is popped.
pub struct BandMatchingEngine<E, S = Hungarian> {
    evaluator: E,
    matcher: ContinuityMatcher<S>,
    nodes: Vec<Node>,
    nbands: Option<usize>,
    max_tasks: usize,
    stats: MatchStats,
}

impl<E: Evaluator> BandMatchingEngine<E, Hungarian> {
    /// Engine with the default Hungarian matcher and a task budget.
    pub fn new(evaluator: E, max_tasks: usize) -> Self {
        Self::with_matcher(evaluator, ContinuityMatcher::new(), max_tasks)
    }
}

impl<E: Evaluator, S: AssignmentSolver> BandMatchingEngine<E, S> {
    /// Engine with a custom matcher.
    pub fn with_matcher(evaluator: E, matcher: ContinuityMatcher<S>, max_tasks: usize) -> Self {
        Self {
            evaluator,
            matcher,
            nodes: Vec::new(),
            nbands: None,
            max_tasks,
            stats: MatchStats::default(),
        }
    }

    /// Counters of the runs so far.
    pub fn stats(&self) -> MatchStats {
        self.stats
    }

    /// Abscissa of a node.
    pub fn x(&self, node: NodeId) -> f64 {
        self.nodes[node.0].x
    }

    fn push_node(&mut self, x: f64) -> NodeId {
        self.nodes.push(Node {
            x,
            raw: None,
            ordered: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Creates the nodes of `segments` equal pieces of `[kmin, kmax]`.
    pub fn seed_grid(&mut self, kmin: f64, kmax: f64, segments: usize) -> Result<Vec<NodeId>, BandError> {
        if !kmin.is_finite() || !kmax.is_finite() {
            return Err(BandError::Input(
                ErrorInfo::new("bounds-non-finite", "sampling bounds must be finite")
                    .with_context("kmin", kmin)
                    .with_context("kmax", kmax),
            ));
        }
        if kmin >= kmax {
            return Err(BandError::Input(
                ErrorInfo::new("bounds-order", "sampling interval must satisfy kmin < kmax")
                    .with_context("kmin", kmin)
                    .with_context("kmax", kmax),
            ));
        }
        if segments == 0 {
            return Err(BandError::input("no-segments", "at least one coarse segment is required"));
        }
        let width = kmax - kmin;
        let grid = (0..=segments)
            .map(|i| {
                let x = if i == segments {
                    kmax
                } else {
                    kmin + width * i as f64 / segments as f64
                };
                self.push_node(x)
            })
            .collect();
        Ok(grid)
    }

    /// Raw evaluation at a node, calling the evaluator at most once.
    pub fn raw(&mut self, node: NodeId) -> Result<&Evaluation, BandError> {
        if self.nodes[node.0].raw.is_none() {
            let x = self.nodes[node.0].x;
            let evaluation = self.evaluator.evaluate(x)?;
            evaluation.validate(x)?;
            match self.nbands {
                None => self.nbands = Some(evaluation.len()),
                Some(expected) if expected != evaluation.len() => {
                    return Err(BandError::Shape(
                        ErrorInfo::new("band-count-changed", "evaluator changed the number of components")
                            .at(x)
                            .with_context("expected", expected)
                            .with_context("found", evaluation.len()),
                    ));
                }
                Some(_) => {}
            }
            self.stats.evaluations += 1;
            trace!("evaluated k={x} ({} components)", evaluation.len());
            self.nodes[node.0].raw = Some(evaluation);
        }
        match &self.nodes[node.0].raw {
            Some(evaluation) => Ok(evaluation),
            None => Err(BandError::Evaluator(ErrorInfo::new(
                "evaluation-missing",
                "evaluation cache lost an entry",
            ))),
        }
    }

    /// Largest absolute value over the raw evaluations at `nodes`.
    pub fn magnitude(&mut self, nodes: &[NodeId]) -> Result<f64, BandError> {
        let mut magnitude = 0.0f64;
        for &node in nodes {
            let raw = self.raw(node)?;
            magnitude = raw.values.iter().fold(magnitude, |acc, v| acc.max(v.abs()));
        }
        Ok(magnitude)
    }

    fn ordered(&mut self, node: NodeId) -> Result<Sample, BandError> {
        if let Some(sample) = &self.nodes[node.0].ordered {
            return Ok(sample.clone());
        }
        let x = self.nodes[node.0].x;
        let sample = Sample::seed(x, self.raw(node)?);
        self.nodes[node.0].ordered = Some(sample.clone());
        Ok(sample)
    }

    fn matched(&mut self, left: &Sample, node: NodeId) -> Result<Sample, BandError> {
        let x = self.nodes[node.0].x;
        let raw = self.raw(node)?.clone();
        self.matcher.match_right(left, &raw, x)
    }

    fn accept(&mut self, node: NodeId, sample: Sample) {
        self.nodes[node.0].ordered = Some(sample);
    }

    /// Refines every interval of `grid` until `criterion` accepts it or the
    /// task budget runs out.
    ///
    /// The first node of `grid` fixes the canonical band order. Running out
    /// of budget is not an error: the samples accepted so far are returned
    /// with [`MatchStats::budget_exhausted`] set.
    pub fn run<C: IntervalCriterion + ?Sized>(
        &mut self,
        grid: &[NodeId],
        criterion: &C,
    ) -> Result<MatchOutcome, BandError> {
        if grid.len() < 2 {
            return Err(BandError::input("grid-too-short", "at least two grid nodes are required"));
        }
        self.ordered(grid[0])?;

        let mut stack: Vec<Task> = grid
            .windows(2)
            .rev()
            .map(|pair| Task {
                left: pair[0],
                right: pair[1],
                right_sample: None,
            })
            .collect();

        while let Some(task) = stack.pop() {
            if self.stats.tasks >= self.max_tasks {
                self.stats.budget_exhausted = true;
                break;
            }
            self.stats.tasks += 1;
            let left = self.ordered(task.left)?;
            let right = match task.right_sample {
                Some(sample) => sample,
                None => self.matched(&left, task.right)?,
            };
            let (x_left, x_right) = (left.x, right.x);
            if resolution_reached(x_left, x_right) {
                self.accept(task.right, right);
                continue;
            }

            let mid_node = self.push_node(0.5 * (x_left + x_right));
            let mid = self.matched(&left, mid_node)?;
            if criterion.converged(x_right - x_left, &left, &mid, &right) {
                self.accept(mid_node, mid);
                self.accept(task.right, right);
            } else {
                stack.push(Task {
                    left: mid_node,
                    right: task.right,
                    right_sample: None,
                });
                stack.push(Task {
                    left: task.left,
                    right: mid_node,
                    right_sample: Some(mid),
                });
            }
        }

        let samples = self.collect();
        self.stats.samples = samples.len();
        if self.stats.budget_exhausted {
            warn!(
                "task budget of {} exhausted, returning {} samples that may not meet the tolerance",
                self.max_tasks,
                samples.len()
            );
        } else {
            debug!(
                "matching converged: {} samples, {} evaluations, {} tasks",
                samples.len(),
                self.stats.evaluations,
                self.stats.tasks
            );
        }
        Ok(MatchOutcome {
            samples,
            stats: self.stats,
        })
    }

    fn collect(&self) -> MatchedSamples {
        let mut accepted: Vec<&Sample> = self.nodes.iter().filter_map(|node| node.ordered.as_ref()).collect();
        accepted.sort_by(|a, b| a.x.total_cmp(&b.x));
        let nbands = accepted.first().map(|s| s.len()).unwrap_or(0);
        let n = accepted.len();
        MatchedSamples {
            x: accepted.iter().map(|s| s.x).collect(),
            y: DMatrix::from_fn(n, nbands, |row, col| accepted[row].values[col]),
            dy: DMatrix::from_fn(n, nbands, |row, col| accepted[row].derivatives[col]),
            order: DMatrix::from_fn(n, nbands, |row, col| accepted[row].order[col]),
        }
    }
}

/// Samples `evaluator` on `[kmin, kmax]` and orders its components by
/// continuity.
///
/// The interval is first split into `min_iter` equal pieces, each refined
/// until the cubic error estimate falls below `tol`. At most `max_iter`
/// interval tasks are processed.
pub fn match_functions<E: Evaluator>(
    evaluator: E,
    kmin: f64,
    kmax: f64,
    tol: f64,
    min_iter: usize,
    max_iter: usize,
) -> Result<MatchOutcome, BandError> {
    if !(tol.is_finite() && tol > 0.0) {
        return Err(BandError::Input(
            ErrorInfo::new("tol-invalid", "tolerance must be positive and finite").with_context("tol", tol),
        ));
    }
    if min_iter >= max_iter {
        return Err(BandError::Input(
            ErrorInfo::new("iteration-bounds", "`min_iter` must be smaller than `max_iter`")
                .with_context("min_iter", min_iter)
                .with_context("max_iter", max_iter),
        ));
    }
    let mut engine = BandMatchingEngine::new(evaluator, max_iter);
    let grid = engine.seed_grid(kmin, kmax, min_iter)?;
    engine.run(&grid, &CubicErrorEstimate::new(tol))
}
