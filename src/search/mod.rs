//! Exhaustive hyperparameter search with stratified cross-validation.
//!
//! Candidates (the cartesian product of a parameter grid) are scored over
//! shared folds, fanned out as independent `(candidate, fold)` tasks on a
//! bounded rayon pool. The best candidate is refit on the full training
//! partition.

use crate::error::{Result, VfError};
use crate::metrics::Scorer;
use crate::model_selection::StratifiedKFold;
use crate::primitives::Matrix;
use crate::traits::Classifier;
use rayon::prelude::*;
use std::fmt;
use std::thread;

/// One tunable hyperparameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Continuous value (regularization strength, learning rate, ...).
    Float(f64),
    /// Integral value (ensemble size, depth, hidden units, ...).
    Int(i64),
}

impl ParamValue {
    /// The value as `f32`, converting integers.
    #[must_use]
    pub fn as_f32(&self) -> f32 {
        match self {
            Self::Float(v) => *v as f32,
            Self::Int(v) => *v as f32,
        }
    }

    /// The value as `usize`, truncating floats and clamping negatives to 0.
    #[must_use]
    pub fn as_usize(&self) -> usize {
        match self {
            Self::Float(v) => v.max(0.0) as usize,
            Self::Int(v) => (*v).max(0) as usize,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

/// Hyperparameter grid: named parameters, each with candidate values.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    params: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    /// Creates an empty grid (a single all-defaults candidate).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter with its candidate values.
    #[must_use]
    pub fn add(mut self, name: &str, values: Vec<ParamValue>) -> Self {
        self.params.push((name.to_string(), values));
        self
    }

    /// Parameter names in sorted order, matching candidate layout and report
    /// columns.
    #[must_use]
    pub fn param_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.params.iter().map(|(n, _)| n.clone()).collect();
        names.sort();
        names
    }

    /// Cartesian product of all parameter values.
    ///
    /// Each candidate is a `(name, value)` list sorted by name. An empty grid
    /// yields one empty candidate.
    #[must_use]
    pub fn candidates(&self) -> Vec<Vec<(String, ParamValue)>> {
        let mut sorted = self.params.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut result: Vec<Vec<(String, ParamValue)>> = vec![Vec::new()];
        for (name, values) in &sorted {
            let mut expanded = Vec::with_capacity(result.len() * values.len());
            for candidate in &result {
                for &value in values {
                    let mut next = candidate.clone();
                    next.push((name.clone(), value));
                    expanded.push(next);
                }
            }
            result = expanded;
        }
        result
    }
}

/// `n` values spaced evenly on a log scale from `10^start_exp` to
/// `10^end_exp`, inclusive.
#[must_use]
pub fn logspace(start_exp: f64, end_exp: f64, n: usize) -> Vec<ParamValue> {
    if n == 1 {
        return vec![ParamValue::Float(10f64.powf(start_exp))];
    }
    let step = (end_exp - start_exp) / (n - 1) as f64;
    (0..n)
        .map(|i| ParamValue::Float(10f64.powf(start_exp + step * i as f64)))
        .collect()
}

/// Integer values from `start` up to (excluding) `end`, stepping by `step`.
#[must_use]
pub fn int_range(start: i64, end: i64, step: i64) -> Vec<ParamValue> {
    (start..end).step_by(step as usize).map(ParamValue::Int).collect()
}

/// Resolves a requested worker count to an actual pool size.
///
/// Non-positive requests and requests beyond the machine's parallelism both
/// resolve to one less than the available cores, never below one.
#[must_use]
pub fn resolve_jobs(jobs: i64) -> usize {
    let cores = thread::available_parallelism().map_or(1, usize::from);
    let auto = cores.saturating_sub(1).max(1);
    if jobs <= 0 || jobs as usize > cores {
        auto
    } else {
        jobs as usize
    }
}

/// The winning model of a grid search.
#[derive(Debug, Clone)]
pub struct SearchOutcome<M> {
    /// Best candidate, refit on the full training partition.
    pub model: M,
    /// The winning parameter assignment, sorted by name.
    pub best_params: Vec<(String, ParamValue)>,
    /// Mean cross-validated score of the winner.
    pub best_score: f32,
}

/// Exhaustive grid search over a [`ParamGrid`].
#[derive(Debug, Clone)]
pub struct GridSearch {
    cv_folds: usize,
    scorer: Scorer,
    n_jobs: usize,
    seed: u64,
}

impl GridSearch {
    /// Creates a search with the given fold count and scorer.
    #[must_use]
    pub fn new(cv_folds: usize, scorer: Scorer) -> Self {
        Self {
            cv_folds,
            scorer,
            n_jobs: 1,
            seed: 0,
        }
    }

    /// Sets the worker pool size.
    #[must_use]
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs.max(1);
        self
    }

    /// Sets the seed for fold shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Scores every candidate over shared stratified folds and refits the
    /// best one on all of `x`, `y`.
    ///
    /// Candidates are ranked by mean fold score; ties keep the earlier
    /// candidate in grid order.
    ///
    /// # Errors
    ///
    /// Returns an error if any candidate fails to fit on any fold, if a
    /// parameter name is unknown to the model, or if the worker pool cannot
    /// be built.
    pub fn fit<M>(
        &self,
        template: &M,
        grid: &ParamGrid,
        x: &Matrix<f32>,
        y: &[u32],
        sample_weight: Option<&[f32]>,
    ) -> Result<SearchOutcome<M>>
    where
        M: Classifier + Clone + Send + Sync,
    {
        let candidates = grid.candidates();
        let folds = StratifiedKFold::new(self.cv_folds)
            .with_random_state(self.seed)
            .split(y);

        let tasks: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_jobs)
            .build()
            .map_err(|e| VfError::Other(format!("worker pool: {e}")))?;

        let fold_scores: Vec<(usize, f32)> = pool.install(|| {
            tasks
                .par_iter()
                .map(|&(c, f)| {
                    let (train_idx, test_idx) = &folds[f];
                    let mut model = template.clone();
                    for (name, value) in &candidates[c] {
                        model.set_param(name, value)?;
                    }

                    let x_train = x.select_rows(train_idx);
                    let y_train: Vec<u32> = train_idx.iter().map(|&i| y[i]).collect();
                    let w_train: Option<Vec<f32>> = sample_weight
                        .map(|w| train_idx.iter().map(|&i| w[i]).collect());
                    model.fit(&x_train, &y_train, w_train.as_deref())?;

                    let x_test = x.select_rows(test_idx);
                    let y_test: Vec<u32> = test_idx.iter().map(|&i| y[i]).collect();
                    let y_pred = model.predict(&x_test);
                    Ok((c, self.scorer.score(&y_test, &y_pred)))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut sums = vec![0.0f32; candidates.len()];
        for &(c, score) in &fold_scores {
            sums[c] += score;
        }
        let n_folds = folds.len() as f32;
        let (best_idx, best_score) = sums
            .iter()
            .map(|sum| sum / n_folds)
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, mean)| {
                if mean > best.1 {
                    (i, mean)
                } else {
                    best
                }
            });

        let mut model = template.clone();
        for (name, value) in &candidates[best_idx] {
            model.set_param(name, value)?;
        }
        model.fit(x, y, sample_weight)?;

        Ok(SearchOutcome {
            model,
            best_params: candidates[best_idx].clone(),
            best_score,
        })
    }
}
