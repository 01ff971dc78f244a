//! L2-regularized logistic regression, trained by batch gradient descent.
//!
//! Binary problems fit a single decision function; problems with more
//! classes fit one-vs-rest and predict the class with the highest score.

use crate::error::{Result, VfError};
use crate::models::common::{balanced_class_weights, class_set, sigmoid};
use crate::primitives::Matrix;
use crate::search::ParamValue;
use crate::traits::Classifier;

/// Logistic regression classifier.
///
/// The `C` hyperparameter is the inverse regularization strength, so smaller
/// values shrink the weights harder.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    c: f32,
    learning_rate: f32,
    max_iter: usize,
    balanced: bool,
    classes: Vec<u32>,
    // One (weights, bias) per one-vs-rest problem; a single entry when
    // the fitted problem is binary.
    coef: Vec<(Vec<f32>, f32)>,
}

impl LogisticRegression {
    /// Creates a model with default hyperparameters (`C = 1.0`).
    #[must_use]
    pub fn new() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 200,
            balanced: false,
            classes: Vec::new(),
            coef: Vec::new(),
        }
    }

    /// Sets the inverse regularization strength.
    #[must_use]
    pub fn with_c(mut self, c: f32) -> Self {
        self.c = c;
        self
    }

    /// Enables native inverse-frequency class weighting.
    #[must_use]
    pub fn with_balanced_class_weight(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    /// Scores for one one-vs-rest problem, pre-sigmoid.
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

    /// Fits one binary subproblem with targets in {0, 1}.
    fn fit_binary(&self, x: &Matrix<f32>, target: &[f32], weight: &[f32]) -> (Vec<f32>, f32) {
        let (n_samples, n_features) = x.shape();
        let w_total: f32 = weight.iter().sum();
        let lambda = 1.0 / self.c;

        let mut weights = vec![0.0f32; n_features];
        let mut bias = 0.0f32;
        for _ in 0..self.max_iter {
            let mut grad_w = vec![0.0f32; n_features];
            let mut grad_b = 0.0f32;
            for i in 0..n_samples {
                let row = x.row(i);
                let z: f32 = row
                    .iter()
                    .zip(weights.iter())
                    .map(|(xi, wi)| xi * wi)
                    .sum::<f32>()
                    + bias;
                let err = weight[i] * (sigmoid(z) - target[i]);
                for (g, xi) in grad_w.iter_mut().zip(row.iter()) {
                    *g += err * xi;
                }
                grad_b += err;
            }
            for (w, g) in weights.iter_mut().zip(grad_w.iter()) {
                *w -= self.learning_rate * (g / w_total + lambda * *w / w_total);
            }
            bias -= self.learning_rate * grad_b / w_total;
        }
        (weights, bias)
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LogisticRegression {
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

        self.coef = if self.classes.len() <= 2 {
            let positive = *self.classes.last().expect("non-empty class set");
            let target: Vec<f32> = y.iter().map(|&l| f32::from(u8::from(l == positive))).collect();
            vec![self.fit_binary(x, &target, &weight)]
        } else {
            self.classes
                .iter()
                .map(|&class| {
                    let target: Vec<f32> =
                        y.iter().map(|&l| f32::from(u8::from(l == class))).collect();
                    self.fit_binary(x, &target, &weight)
                })
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
