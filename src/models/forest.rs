//! Random forest: bagged Gini trees with majority voting.

use crate::error::{Result, VfError};
use crate::models::common::{balanced_class_weights, class_set, weighted_sample_indices};
use crate::models::tree::DecisionTreeClassifier;
use crate::primitives::Matrix;
use crate::search::ParamValue;
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Random forest classifier.
///
/// Each tree trains on a bootstrap resample of the training partition. With
/// class balancing or explicit sample weights, resampling is drawn
/// proportionally to weight, so rare classes appear more often in the
/// bootstraps.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    n_estimators: usize,
    balanced: bool,
    random_state: u64,
    classes: Vec<u32>,
    trees: Vec<DecisionTreeClassifier>,
}

impl RandomForestClassifier {
    /// Creates a forest with 10 trees.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 10,
            balanced: false,
            random_state: 0,
            classes: Vec::new(),
            trees: Vec::new(),
        }
    }

    /// Sets the number of trees.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Enables native inverse-frequency class weighting.
    #[must_use]
    pub fn with_balanced_class_weight(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    /// Seeds the bootstrap resampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Per-sample vote fraction for `class`.
    fn vote_fraction(&self, x: &Matrix<f32>, class: u32) -> Vec<f32> {
        let mut votes = vec![0u32; x.n_rows()];
        for tree in &self.trees {
            for (count, pred) in votes.iter_mut().zip(tree.predict(x)) {
                if pred == class {
                    *count += 1;
                }
            }
        }
        votes
            .into_iter()
            .map(|v| v as f32 / self.trees.len() as f32)
            .collect()
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Matrix<f32>, y: &[u32], sample_weight: Option<&[f32]>) -> Result<()> {
        if y.is_empty() {
            return Err(VfError::from("Cannot fit on empty data"));
        }
        if x.n_rows() != y.len() {
            return Err(VfError::DimensionMismatch {
                expected: format!("{} labels", x.n_rows()),
                actual: format!("{}", y.len()),
            });
        }
        if self.n_estimators == 0 {
            return Err(VfError::InvalidHyperparameter {
                param: "n_estimators".to_string(),
                value: "0".to_string(),
                constraint: "must be positive".to_string(),
            });
        }

        self.classes = class_set(y);
        let mut weight: Vec<f32> = match sample_weight {
            Some(w) => w.to_vec(),
            None => vec![1.0; y.len()],
        };
        if self.balanced {
            let class_w = balanced_class_weights(y, &self.classes);
            for (w, &label) in weight.iter_mut().zip(y.iter()) {
                *w *= class_w[&label];
            }
        }

        let mut rng = StdRng::seed_from_u64(self.random_state);
        self.trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let indices = weighted_sample_indices(&weight, y.len(), &mut rng);
            let x_boot = x.select_rows(&indices);
            let y_boot: Vec<u32> = indices.iter().map(|&i| y[i]).collect();

            let mut tree = DecisionTreeClassifier::new();
            tree.fit(&x_boot, &y_boot)?;
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        assert!(!self.trees.is_empty(), "Model not fitted");

        let per_tree: Vec<Vec<u32>> = self.trees.iter().map(|t| t.predict(x)).collect();
        (0..x.n_rows())
            .map(|i| {
                let mut votes: BTreeMap<u32, usize> = BTreeMap::new();
                for preds in &per_tree {
                    *votes.entry(preds[i]).or_default() += 1;
                }
                // Ties go to the smallest label.
                votes
                    .iter()
                    .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                    .map(|(&label, _)| label)
                    .unwrap_or(0)
            })
            .collect()
    }

    fn predict_score(&self, x: &Matrix<f32>) -> Option<Vec<f32>> {
        if self.classes.len() != 2 {
            return None;
        }
        let positive = *self.classes.last()?;
        Some(self.vote_fraction(x, positive))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => {
                let n = value.as_usize();
                if n == 0 {
                    return Err(VfError::InvalidHyperparameter {
                        param: "n_estimators".to_string(),
                        value: value.to_string(),
                        constraint: "must be positive".to_string(),
                    });
                }
                self.n_estimators = n;
                Ok(())
            }
            other => Err(VfError::InvalidHyperparameter {
                param: other.to_string(),
                value: value.to_string(),
                constraint: "unknown parameter".to_string(),
            }),
        }
    }

    fn supports_class_weight(&self) -> bool {
        true
    }
}
