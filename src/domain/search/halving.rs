//! Successive-halving grid search
//!
//! Every candidate is scored on a small seeded subsample. The best
//! `1 / factor` survive into the next iteration, which gets `factor` times
//! more rows. The winner of the last completed iteration is refit on the
//! full training set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::KFold;
use crate::domain::model::{EstimatorFamily, ParamGrid, ParamSet, Regressor, TrainedModel};
use crate::domain::{DomainError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Candidate reduction and resource growth per iteration
    pub factor: usize,
    /// Seed for the per-iteration subsamples
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            factor: 3,
            seed: 42,
        }
    }
}

/// Deadline and cancellation shared with a running search
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl SearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once cancelled or past the deadline
    pub fn is_exhausted(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Summary of one completed halving iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalvingIteration {
    pub iteration: usize,
    pub n_resources: usize,
    pub n_candidates: usize,
    pub best_score: f64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_model: TrainedModel,
    pub best_params: ParamSet,
    /// Mean negative MSE of the winner in its last iteration
    pub best_score: f64,
    pub iterations: Vec<HalvingIteration>,
}

/// Schedule derived from the grid and data sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Schedule {
    min_resources: usize,
    n_iterations: usize,
}

/// `floor(log_base(value))` for `value >= 1`
fn floor_log(value: usize, base: usize) -> usize {
    let mut power = 0;
    let mut acc = base;
    while acc <= value {
        power += 1;
        acc = match acc.checked_mul(base) {
            Some(next) => next,
            None => break,
        };
    }
    power
}

fn schedule(
    n_candidates: usize,
    n_samples: usize,
    folds: usize,
    factor: usize,
) -> Result<Schedule, DomainError> {
    let n_required = 1 + floor_log(n_candidates, factor);
    let exhaust = n_samples / factor.saturating_pow((n_required - 1) as u32).max(1);
    let min_resources = (2 * folds).max(exhaust);

    if min_resources > n_samples {
        return Err(DomainError::configuration(format!(
            "{} samples are too few for {}-fold halving search (need at least {})",
            n_samples, folds, min_resources
        )));
    }

    let n_possible = 1 + floor_log(n_samples / min_resources, factor);

    Ok(Schedule {
        min_resources,
        n_iterations: n_required.min(n_possible),
    })
}

fn fit_error(err: DomainError, params: &ParamSet) -> DomainError {
    match err.kind() {
        ErrorKind::Configuration | ErrorKind::TrainingFailure => err,
        _ => DomainError::training(format!("Fit failed for {}: {}", params, err.message())),
    }
}

/// Mean MSE over the folds, or `None` when the search ran out of budget
fn cross_validate(
    family: &dyn EstimatorFamily,
    params: &ParamSet,
    x: &Array2<f64>,
    y: &Array1<f64>,
    kfold: &KFold,
    rows: &[usize],
    ctx: &SearchContext,
) -> Result<Option<f64>, DomainError> {
    let folds = kfold.split_indices(rows)?;
    let mut total = 0.0;

    for fold in &folds {
        if ctx.is_exhausted() {
            return Ok(None);
        }

        let x_train = x.select(Axis(0), &fold.train);
        let y_train = y.select(Axis(0), &fold.train);
        let model = family
            .fit(params, x_train.view(), y_train.view())
            .map_err(|e| fit_error(e, params))?;

        let x_test = x.select(Axis(0), &fold.test);
        let predicted = model.predict(x_test.view())?;
        let sse: f64 = fold
            .test
            .iter()
            .zip(predicted.iter())
            .map(|(&row, p)| (p - y[row]).powi(2))
            .sum();
        total += sse / fold.test.len() as f64;
    }

    Ok(Some(total / folds.len() as f64))
}

/// Successive-halving search over `grid`, scored by k-fold negative MSE
///
/// Ties are broken by enumeration order, so the outcome only depends on the
/// inputs and `config.seed`.
pub fn search(
    family: &dyn EstimatorFamily,
    grid: &ParamGrid,
    x: &Array2<f64>,
    y: &[f64],
    folds: usize,
    config: &SearchConfig,
    ctx: &SearchContext,
) -> Result<SearchOutcome, DomainError> {
    if config.factor < 2 {
        return Err(DomainError::configuration(format!(
            "Halving factor must be at least 2, got {}",
            config.factor
        )));
    }

    let kfold = KFold::new(folds)?;
    let candidates = grid.candidates()?;
    for candidate in &candidates {
        family.validate(candidate)?;
    }

    let n_samples = x.nrows();
    if n_samples != y.len() {
        return Err(DomainError::validation(format!(
            "Feature matrix has {} rows but target has {}",
            n_samples,
            y.len()
        )));
    }

    if n_samples < folds {
        return Err(DomainError::configuration(format!(
            "Cannot run {}-fold cross-validation on {} samples",
            folds, n_samples
        )));
    }

    let plan = schedule(candidates.len(), n_samples, folds, config.factor)?;
    info!(
        estimator = family.name(),
        candidates = candidates.len(),
        samples = n_samples,
        min_resources = plan.min_resources,
        iterations = plan.n_iterations,
        "Starting successive halving search"
    );

    let y = Array1::from(y.to_vec());
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut survivors: Vec<usize> = (0..candidates.len()).collect();
    let mut completed: Option<Vec<(usize, f64)>> = None;
    let mut iterations = Vec::new();

    for iteration in 0..plan.n_iterations {
        if ctx.is_exhausted() {
            warn!(iteration = iteration, "Search budget exhausted before iteration");
            break;
        }

        let n_resources = config
            .factor
            .saturating_pow(iteration as u32)
            .saturating_mul(plan.min_resources)
            .min(n_samples);

        let mut rows = if n_resources == n_samples {
            (0..n_samples).collect::<Vec<_>>()
        } else {
            rand::seq::index::sample(&mut rng, n_samples, n_resources).into_vec()
        };
        rows.sort_unstable();

        let scores: Vec<Option<f64>> = survivors
            .par_iter()
            .map(|&idx| {
                if ctx.is_exhausted() {
                    return Ok(None);
                }
                cross_validate(family, &candidates[idx], x, &y, &kfold, &rows, ctx)
            })
            .collect::<Result<_, DomainError>>()?;

        if scores.iter().any(Option::is_none) {
            warn!(iteration = iteration, "Search budget exhausted during iteration");
            break;
        }

        let mut ranked: Vec<(usize, f64)> = survivors
            .iter()
            .zip(scores.iter().flatten())
            .map(|(&idx, &mse)| (idx, if mse.is_nan() { f64::INFINITY } else { mse }))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        debug!(
            iteration = iteration,
            resources = n_resources,
            candidates = ranked.len(),
            best_mse = ranked[0].1,
            "Completed halving iteration"
        );

        iterations.push(HalvingIteration {
            iteration,
            n_resources,
            n_candidates: ranked.len(),
            best_score: -ranked[0].1,
        });

        let keep = ranked.len().div_ceil(config.factor);
        survivors = ranked.iter().take(keep).map(|(idx, _)| *idx).collect();
        completed = Some(ranked);
    }

    let ranked = completed.ok_or_else(|| {
        DomainError::training("Search was cancelled before any iteration completed")
    })?;
    let (best_idx, best_mse) = ranked[0];
    let best_params = candidates[best_idx].clone();

    let best_model = family
        .fit(&best_params, x.view(), y.view())
        .map_err(|e| fit_error(e, &best_params))?;

    info!(
        params = %best_params,
        score = -best_mse,
        "Selected best candidate"
    );

    Ok(SearchOutcome {
        best_model,
        best_params,
        best_score: -best_mse,
        iterations,
    })
}
