//! The evaluation harness: repeated stratified trials of one classifier
//! family over a labeled dataset, reported as CSV.
//!
//! Each trial splits the data (stratified by raw rhythm annotation), scales
//! the two partitions independently, tunes hyperparameters by cross-validated
//! grid search on the training side, and scores hard predictions (plus ROC
//! operating points where the backend exposes scores) on the held-out side.
//! Trials consume one shared seeded RNG in sequence, so a fixed seed
//! reproduces the whole run.

pub mod report;

use crate::data::LabeledDataset;
use crate::error::Result;
use crate::labels::LabelScheme;
use crate::metrics::{BinaryClassificationResult, MultiClassificationResult, RocCurve, Scorer, FPR_TARGETS};
use crate::model_selection::{sample_weights, stratified_train_test_split};
use crate::models::{self, ModelKind};
use crate::preprocessing::StandardScaler;
use crate::search::GridSearch;
use crate::traits::{Classifier, Transformer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use report::{columns_for_scheme, Cell, ReportWriter, Row};
use std::io::Write;
use tracing::{debug, info};

/// Evaluation run parameters.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Labeling scheme the dataset was labeled under.
    pub scheme: LabelScheme,
    /// Number of independent trials.
    pub n_trials: usize,
    /// Test partition size as a percentage of the dataset.
    pub test_percent: u32,
    /// Cross-validation folds for the hyperparameter search.
    pub cv_folds: usize,
    /// Scorer ranking search candidates.
    pub scorer: Scorer,
    /// Worker pool size for the search.
    pub jobs: usize,
    /// Balance classes by weighting during fitting.
    pub balanced_weight: bool,
    /// Master seed; every trial's randomness derives from it.
    pub seed: u64,
}

impl HarnessConfig {
    /// Test partition size as a fraction, falling back to 30% when the
    /// configured percentage is out of range.
    #[must_use]
    pub fn test_fraction(&self) -> f32 {
        let fraction = self.test_percent as f32 / 100.0;
        if fraction > 1.0 {
            0.3
        } else {
            fraction
        }
    }
}

/// Runs repeated trials and writes one CSV row per trial plus an average
/// row.
#[derive(Debug)]
pub struct EvaluationHarness {
    config: HarnessConfig,
}

impl EvaluationHarness {
    /// Creates a harness with the given configuration.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Evaluates `kind` over `data`, writing the full report to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if a fit fails, a hyperparameter is rejected, or the
    /// report cannot be written.
    pub fn run<W: Write>(&self, data: &LabeledDataset, kind: ModelKind, out: W) -> Result<()> {
        let config = &self.config;
        let (template, grid) = models::build(kind, config.balanced_weight);

        let columns = columns_for_scheme(config.scheme, data.rhythm_names(), &grid.param_names());
        let mut report = ReportWriter::new(out, columns)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        info!(
            model = %kind,
            scheme = %config.scheme,
            trials = config.n_trials,
            seed = config.seed,
            "starting evaluation"
        );

        for trial in 0..config.n_trials {
            info!(trial, "running trial");
            let row = self.run_trial(data, &template, &grid, trial, &mut rng)?;
            report.write_row(&row)?;
        }
        report.finish()
    }

    fn run_trial(
        &self,
        data: &LabeledDataset,
        template: &models::Model,
        grid: &crate::search::ParamGrid,
        trial: usize,
        rng: &mut StdRng,
    ) -> Result<Row> {
        let config = &self.config;

        // Split on raw rhythm annotations so rare rhythm types appear on
        // both sides even when they collapse into one derived label.
        let (train_idx, test_idx) =
            stratified_train_test_split(data.rhythm_ids(), config.test_fraction(), rng);

        let y_train: Vec<u32> = train_idx.iter().map(|&i| data.labels()[i]).collect();
        let y_test: Vec<u32> = test_idx.iter().map(|&i| data.labels()[i]).collect();

        // Train and test partitions are standardized independently.
        let x_train = StandardScaler::new().fit_transform(&data.features().select_rows(&train_idx))?;
        let x_test = StandardScaler::new().fit_transform(&data.features().select_rows(&test_idx))?;

        // Backends without native class weighting get inverse-frequency
        // sample weights, binary schemes only.
        let weights = if config.balanced_weight
            && !template.supports_class_weight()
            && !config.scheme.is_multiclass()
        {
            Some(sample_weights(&y_train))
        } else {
            None
        };

        let mut model = template.clone();
        model.set_random_state(rng.gen());
        let search = GridSearch::new(config.cv_folds, config.scorer)
            .with_n_jobs(config.jobs)
            .with_seed(rng.gen());
        let outcome = search.fit(&model, grid, &x_train, &y_train, weights.as_deref())?;
        debug!(
            trial,
            score = outcome.best_score,
            params = ?outcome.best_params,
            "grid search complete"
        );

        let y_pred = outcome.model.predict(&x_test);

        let mut row = Row::new();
        row.set("iter", Cell::Text(trial.to_string()));
        if config.scheme.is_multiclass() {
            self.fill_multiclass(&mut row, data, &test_idx, &y_test, &y_pred);
        } else {
            let scores = outcome.model.predict_score(&x_test);
            fill_binary(&mut row, &y_test, &y_pred, scores.as_deref());
        }
        for (name, value) in &outcome.best_params {
            row.set(name, Cell::Param(*value));
        }
        Ok(row)
    }

    /// Per-class one-vs-rest rates, then the per-rhythm breakdown: each raw
    /// rhythm type's test samples scored as their own binary subproblem.
    fn fill_multiclass(
        &self,
        row: &mut Row,
        data: &LabeledDataset,
        test_idx: &[usize],
        y_test: &[u32],
        y_pred: &[u32],
    ) {
        let scheme = self.config.scheme;
        let multi = MultiClassificationResult::new(y_test, y_pred, scheme.classes());
        for (name, result) in scheme.class_names().iter().zip(multi.results.iter()) {
            row.set_rate(&format!("TPR[{name}]"), result.sensitivity());
            row.set_rate(&format!("TNR[{name}]"), result.specificity());
            row.set_rate(&format!("PPV[{name}]"), result.precision());
        }

        for (rhythm_id, rhythm_name) in data.rhythm_names().iter().enumerate() {
            let mut truth = Vec::new();
            let mut pred = Vec::new();
            for (pos, &i) in test_idx.iter().enumerate() {
                if data.rhythm_ids()[i] == rhythm_id as u32 {
                    truth.push(y_test[pos]);
                    pred.push(y_pred[pos]);
                }
            }
            let result = BinaryClassificationResult::new(&truth, &pred);
            row.set_rate(&format!("TPR[{rhythm_name}]"), result.sensitivity());
            row.set_rate(&format!("TNR[{rhythm_name}]"), result.specificity());
            row.set_rate(&format!("PPV[{rhythm_name}]"), result.precision());
        }
    }
}

fn fill_binary(row: &mut Row, y_test: &[u32], y_pred: &[u32], scores: Option<&[f32]>) {
    let result = BinaryClassificationResult::new(y_test, y_pred);
    row.set_rate("Se", result.sensitivity());
    row.set_rate("Sp", result.specificity());
    row.set_rate("PPV", result.precision());
    row.set_rate("Acc", result.accuracy());
    row.set("TP", Cell::Count(result.tp));
    row.set("TN", Cell::Count(result.tn));
    row.set("FP", Cell::Count(result.fp));
    row.set("FN", Cell::Count(result.fn_));

    // Operating points exist only when the backend exposes scores.
    if let Some(scores) = scores {
        let roc = RocCurve::new(y_test, scores);
        for (target, column) in FPR_TARGETS.iter().zip(["Se(Sp95)", "Se(Sp97)", "Se(Sp99)"]) {
            row.set_rate(column, roc.sensitivity_at_fpr(*target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, SegmentInfo};
    use crate::primitives::Matrix;

    fn synthetic_dataset(n_per_class: usize) -> LabeledDataset {
        // VF segments cluster negative, sinus rhythm positive, in one
        // informative feature plus one noise feature.
        let mut values = Vec::new();
        let mut segments = Vec::new();
        for i in 0..n_per_class {
            let jitter = (i % 7) as f32 * 0.05;
            values.extend_from_slice(&[-2.0 - jitter, 0.3]);
            segments.push(SegmentInfo::new("(VF", 0.5, 0.0));
            values.extend_from_slice(&[2.0 + jitter, 0.3]);
            segments.push(SegmentInfo::new("(N", 0.8, 75.0));
        }
        let features =
            Matrix::from_vec(2 * n_per_class, 2, values).expect("valid dims");
        Dataset::from_parts(features, segments)
            .expect("matching lengths")
            .labeled(LabelScheme::BinaryVf)
    }

    fn config(scheme: LabelScheme, n_trials: usize) -> HarnessConfig {
        HarnessConfig {
            scheme,
            n_trials,
            test_percent: 30,
            cv_folds: 3,
            scorer: Scorer::Accuracy,
            jobs: 1,
            balanced_weight: false,
            seed: 1234,
        }
    }

    #[test]
    fn test_test_fraction_coercion() {
        let mut cfg = config(LabelScheme::BinaryVf, 1);
        assert!((cfg.test_fraction() - 0.3).abs() < 1e-6);
        cfg.test_percent = 150;
        assert!((cfg.test_fraction() - 0.3).abs() < 1e-6);
        cfg.test_percent = 50;
        assert!((cfg.test_fraction() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_binary_run_layout() {
        let data = synthetic_dataset(30);
        let harness = EvaluationHarness::new(config(LabelScheme::BinaryVf, 2));
        let mut out = Vec::new();
        harness
            .run(&data, ModelKind::LogisticRegression, &mut out)
            .expect("run");

        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        // Header, two trial rows, one average row.
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("iter,Se,Sp,PPV,Acc"));
        assert!(lines[0].ends_with(",C"));
        assert!(lines[1].starts_with("0,"));
        assert!(lines[3].starts_with("average,"));

        // Easy separable data: sensitivity close to perfect.
        let header: Vec<&str> = lines[0].split(',').collect();
        let first: Vec<&str> = lines[1].split(',').collect();
        let se_idx = header.iter().position(|&c| c == "Se").expect("Se column");
        let se: f32 = first[se_idx].parse().expect("numeric Se");
        assert!(se > 0.9);
    }

    #[test]
    fn test_run_is_reproducible_for_fixed_seed() {
        let data = synthetic_dataset(20);
        let harness = EvaluationHarness::new(config(LabelScheme::BinaryVf, 2));

        let mut a = Vec::new();
        let mut b = Vec::new();
        harness
            .run(&data, ModelKind::LogisticRegression, &mut a)
            .expect("run");
        harness
            .run(&data, ModelKind::LogisticRegression, &mut b)
            .expect("run");
        assert_eq!(a, b);
    }

    #[test]
    fn test_per_rhythm_breakdown_values() {
        // Two (N and three (VF segments; one fine VF lands in the
        // intermediate class, so the AHA labels are 0,0,1,1,2.
        let features = Matrix::from_vec(5, 1, vec![0.0; 5]).expect("valid dims");
        let segments = vec![
            SegmentInfo::new("(N", 0.9, 70.0),
            SegmentInfo::new("(N", 0.9, 72.0),
            SegmentInfo::new("(VF", 0.5, 0.0),
            SegmentInfo::new("(VF", 0.5, 0.0),
            SegmentInfo::new("(VF", 0.1, 0.0),
        ];
        let data = Dataset::from_parts(features, segments)
            .expect("matching lengths")
            .labeled(LabelScheme::Aha);
        assert_eq!(data.labels(), &[0, 0, 1, 1, 2]);

        let harness = EvaluationHarness::new(config(LabelScheme::Aha, 1));
        let y_test = data.labels().to_vec();
        let y_pred = vec![0, 1, 1, 2, 2];
        let mut row = Row::new();
        harness.fill_multiclass(&mut row, &data, &[0, 1, 2, 3, 4], &y_test, &y_pred);

        let rate = |column: &str| match row.get(column) {
            Some(Cell::Float(v)) => Some(*v),
            _ => None,
        };

        // One-vs-rest rates over the derived labels.
        assert_eq!(rate("TPR[non-shockable]"), Some(0.5));
        assert_eq!(rate("PPV[shockable]"), Some(0.5));
        assert_eq!(rate("TPR[intermediate]"), Some(1.0));

        // (N partition: derived labels 0,0 against predictions 0,1. No
        // true positives exist, so the TPR cell stays blank.
        assert_eq!(rate("TPR[(N]"), None);
        assert_eq!(rate("TNR[(N]"), Some(0.5));
        assert_eq!(rate("PPV[(N]"), Some(0.0));

        // (VF partition: labels 1,1,2 against predictions 1,2,2, all
        // positive on both sides. No negatives, so TNR stays blank.
        assert_eq!(rate("TPR[(VF]"), Some(1.0));
        assert_eq!(rate("TNR[(VF]"), None);
        assert_eq!(rate("PPV[(VF]"), Some(1.0));
    }

    #[test]
    fn test_multiclass_run_layout() {
        // Mixed rhythms so the AHA scheme produces all three classes.
        let mut values = Vec::new();
        let mut segments = Vec::new();
        for i in 0..25 {
            let jitter = (i % 5) as f32 * 0.1;
            values.push(-3.0 - jitter);
            segments.push(SegmentInfo::new("(N", 0.9, 70.0));
            values.push(0.0 + jitter);
            segments.push(SegmentInfo::new("(VF", 0.1, 0.0)); // fine VF: intermediate
            values.push(3.0 + jitter);
            segments.push(SegmentInfo::new("(VF", 0.5, 0.0)); // coarse VF: shockable
        }
        let features = Matrix::from_vec(75, 1, values).expect("valid dims");
        let data = Dataset::from_parts(features, segments)
            .expect("matching lengths")
            .labeled(LabelScheme::Aha);

        let harness = EvaluationHarness::new(config(LabelScheme::Aha, 1));
        let mut out = Vec::new();
        harness
            .run(&data, ModelKind::LogisticRegression, &mut out)
            .expect("run");

        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("TPR[non-shockable]"));
        assert!(lines[0].contains("PPV[(VF]"));
        // Binary operating-point columns never appear in the AHA layout.
        assert!(!lines[0].contains("Se(Sp95)"));
    }
}
