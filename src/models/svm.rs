//! Linear support vector classifier, trained by stochastic subgradient
//! descent on the hinge loss.
//!
//! One-vs-rest for problems with more than two classes. Binary problems
//! expose a squashed margin as the score channel.

use crate::error::{Result, VfError};
use crate::models::common::{balanced_class_weights, class_set, sigmoid};
use crate::primitives::Matrix;
use crate::search::ParamValue;
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Linear SVM classifier.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    c: f32,
    learning_rate: f32,
    epochs: usize,
    balanced: bool,
    random_state: u64,
    classes: Vec<u32>,
    coef: Vec<(Vec<f32>, f32)>,
}

impl LinearSvc {
    /// Creates a model with default hyperparameters (`C = 1.0`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.01,
            epochs: 50,
            balanced: false,
            random_state: 0,
            classes: Vec::new(),
            coef: Vec::new(),
        }
    }

    /// Enables native inverse-frequency class weighting.
    #[must_use]
    pub fn with_balanced_class_weight(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    /// Seeds the epoch shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    fn decision(&self, x: &Matrix<f32>, k: usize) -> Vec<f32> {
        let (weights, bias) = &self.coef[k];
        (0..x.n_rows())
            .map(|i| {
                x.row(i)
                    .iter()
                    .zip(weights.iter())
                    .map(|(xi, wi)| xi * wi)
                    .sum::<f32>()
                    + bias
            })
            .collect()
    }

    /// Fits one binary subproblem with targets in {-1, +1}.
    fn fit_binary(&self, x: &Matrix<f32>, target: &[f32], weight: &[f32]) -> (Vec<f32>, f32) {
        let (n_samples, n_features) = x.shape();
        let lambda = 1.0 / (self.c * n_samples as f32);

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut weights = vec![0.0f32; n_features];
        let mut bias = 0.0f32;

        for _ in 0..self.epochs {
            order.shuffle(&mut rng);
            for &i in &order {
                let row = x.row(i);
                let margin = target[i]
                    * (row
                        .iter()
                        .zip(weights.iter())
                        .map(|(xi, wi)| xi * wi)
                        .sum::<f32>()
                        + bias);
                if margin < 1.0 {
                    for (w, xi) in weights.iter_mut().zip(row.iter()) {
                        *w += self.learning_rate * (weight[i] * target[i] * xi - lambda * *w);
                    }
                    bias += self.learning_rate * weight[i] * target[i];
                } else {
                    for w in &mut weights {
                        *w -= self.learning_rate * lambda * *w;
                    }
                }
            }
        }
        (weights, bias)
    }
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LinearSvc {
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

        let signed = |class: u32| -> Vec<f32> {
            y.iter()
                .map(|&l| if l == class { 1.0 } else { -1.0 })
                .collect()
        };

        self.coef = if self.classes.len() <= 2 {
            let positive = *self.classes.last().expect("non-empty class set");
            vec![self.fit_binary(x, &signed(positive), &weight)]
        } else {
            self.classes
                .iter()
                .map(|&class| self.fit_binary(x, &signed(class), &weight))
                .collect()
        };
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        assert!(!self.coef.is_empty(), "Model not fitted");

        if self.classes.len() <= 2 {
            let negative = self.classes[0];
            let positive = *self.classes.last().expect("non-empty class set");
            self.decision(x, 0)
                .into_iter()
                .map(|z| if z > 0.0 { positive } else { negative })
                .collect()
        } else {
            let scores: Vec<Vec<f32>> =
                (0..self.classes.len()).map(|k| self.decision(x, k)).collect();
            (0..x.n_rows())
                .map(|i| {
                    let best = (0..self.classes.len())
                        .max_by(|&a, &b| scores[a][i].total_cmp(&scores[b][i]))
                        .expect("at least one class");
                    self.classes[best]
                })
                .collect()
        }
    }

    fn predict_score(&self, x: &Matrix<f32>) -> Option<Vec<f32>> {
        if self.classes.len() != 2 {
            return None;
        }
        Some(self.decision(x, 0).into_iter().map(sigmoid).collect())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "C" => {
                let c = value.as_f32();
                if c <= 0.0 {
                    return Err(VfError::InvalidHyperparameter {
                        param: "C".to_string(),
                        value: value.to_string(),
                        constraint: "must be positive".to_string(),
                    });
                }
                self.c = c;
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
