//! Boosted ensembles: AdaBoost over decision stumps and gradient boosting
//! over shallow regression trees.

use crate::error::{Result, VfError};
use crate::models::common::{class_set, sigmoid, weighted_sample_indices};
use crate::models::tree::{DecisionTreeClassifier, RegressionTree};
use crate::primitives::Matrix;
use crate::search::ParamValue;
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// AdaBoost classifier using the multi-class SAMME weight update.
///
/// Each round fits a depth-1 stump to a weighted resample of the training
/// partition, then upweights the samples the stump missed.
#[derive(Debug, Clone)]
pub struct AdaBoostClassifier {
    n_estimators: usize,
    learning_rate: f32,
    random_state: u64,
    classes: Vec<u32>,
    stumps: Vec<(DecisionTreeClassifier, f32)>,
}

impl AdaBoostClassifier {
    /// Creates an ensemble of 50 stumps with unit learning rate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            random_state: 0,
            classes: Vec::new(),
            stumps: Vec::new(),
        }
    }

    /// Seeds the per-round resampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }
}

impl Default for AdaBoostClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for AdaBoostClassifier {
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
        let k = self.classes.len() as f32;
        let n = y.len();

        let mut weight: Vec<f32> = match sample_weight {
            Some(w) => w.to_vec(),
            None => vec![1.0; n],
        };
        let total: f32 = weight.iter().sum();
        for w in &mut weight {
            *w /= total;
        }

        let mut rng = StdRng::seed_from_u64(self.random_state);
        self.stumps = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let indices = weighted_sample_indices(&weight, n, &mut rng);
            let x_round = x.select_rows(&indices);
            let y_round: Vec<u32> = indices.iter().map(|&i| y[i]).collect();

            let mut stump = DecisionTreeClassifier::new().with_max_depth(1);
            stump.fit(&x_round, &y_round)?;

            let pred = stump.predict(x);
            let err: f32 = weight
                .iter()
                .zip(pred.iter().zip(y.iter()))
                .filter(|(_, (p, t))| p != t)
                .map(|(w, _)| w)
                .sum();

            // A stump no better than chance contributes nothing further.
            if err >= 1.0 - 1.0 / k {
                break;
            }
            if err <= 0.0 {
                self.stumps.push((stump, 1.0));
                break;
            }

            let alpha = self.learning_rate * (((1.0 - err) / err).ln() + (k - 1.0).ln());
            for (w, (p, t)) in weight.iter_mut().zip(pred.iter().zip(y.iter())) {
                if p != t {
                    *w *= alpha.exp();
                }
            }
            let total: f32 = weight.iter().sum();
            for w in &mut weight {
                *w /= total;
            }
            self.stumps.push((stump, alpha));
        }

        if self.stumps.is_empty() {
            return Err(VfError::Other(
                "boosting found no stump better than chance".to_string(),
            ));
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        assert!(!self.stumps.is_empty(), "Model not fitted");

        let per_stump: Vec<Vec<u32>> = self.stumps.iter().map(|(s, _)| s.predict(x)).collect();
        (0..x.n_rows())
            .map(|i| {
                let best = self
                    .classes
                    .iter()
                    .map(|&class| {
                        let score: f32 = self
                            .stumps
                            .iter()
                            .zip(per_stump.iter())
                            .filter(|((_, _), preds)| preds[i] == class)
                            .map(|((_, alpha), _)| alpha)
                            .sum();
                        (class, score)
                    })
                    // Ties go to the smallest label.
                    .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
                    .map(|(class, _)| class);
                best.unwrap_or(0)
            })
            .collect()
    }

    fn predict_score(&self, x: &Matrix<f32>) -> Option<Vec<f32>> {
        if self.classes.len() != 2 {
            return None;
        }
        let positive = *self.classes.last()?;
        let alpha_total: f32 = self.stumps.iter().map(|(_, a)| a).sum();
        let per_stump: Vec<Vec<u32>> = self.stumps.iter().map(|(s, _)| s.predict(x)).collect();
        Some(
            (0..x.n_rows())
                .map(|i| {
                    let positive_alpha: f32 = self
                        .stumps
                        .iter()
                        .zip(per_stump.iter())
                        .filter(|(_, preds)| preds[i] == positive)
                        .map(|((_, alpha), _)| alpha)
                        .sum();
                    positive_alpha / alpha_total
                })
                .collect(),
        )
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
            "learning_rate" => {
                let lr = value.as_f32();
                if lr <= 0.0 {
                    return Err(VfError::InvalidHyperparameter {
                        param: "learning_rate".to_string(),
                        value: value.to_string(),
                        constraint: "must be positive".to_string(),
                    });
                }
                self.learning_rate = lr;
                Ok(())
            }
            other => Err(VfError::InvalidHyperparameter {
                param: other.to_string(),
                value: value.to_string(),
                constraint: "unknown parameter".to_string(),
            }),
        }
    }
}

/// One fitted one-vs-rest boosting stage chain.
#[derive(Debug, Clone)]
struct BoostedChain {
    f0: f32,
    trees: Vec<RegressionTree>,
}

impl BoostedChain {
    fn raw_scores(&self, x: &Matrix<f32>, learning_rate: f32) -> Vec<f32> {
        let mut f = vec![self.f0; x.n_rows()];
        for tree in &self.trees {
            for (fi, delta) in f.iter_mut().zip(tree.predict(x)) {
                *fi += learning_rate * delta;
            }
        }
        f
    }
}

/// Gradient boosting classifier over shallow regression trees.
///
/// Stages fit the residual between the {0, 1} target and the current
/// sigmoid-squashed score. Problems with more than two classes boost one
/// chain per class, one-vs-rest.
#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
    n_estimators: usize,
    max_depth: usize,
    learning_rate: f32,
    classes: Vec<u32>,
    chains: Vec<BoostedChain>,
}

impl GradientBoostingClassifier {
    /// Creates an ensemble of 100 depth-3 trees with learning rate 0.1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            classes: Vec::new(),
            chains: Vec::new(),
        }
    }

    fn fit_chain(&self, x: &Matrix<f32>, target: &[f32], weight: &[f32]) -> Result<BoostedChain> {
        let w_total: f32 = weight.iter().sum();
        let p = (target
            .iter()
            .zip(weight.iter())
            .map(|(t, w)| t * w)
            .sum::<f32>()
            / w_total)
            .clamp(1e-6, 1.0 - 1e-6);
        let f0 = (p / (1.0 - p)).ln();

        let mut f = vec![f0; target.len()];
        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let residual: Vec<f32> = target
                .iter()
                .zip(f.iter())
                .map(|(t, fi)| t - sigmoid(*fi))
                .collect();

            let mut tree = RegressionTree::new().with_max_depth(self.max_depth);
            tree.fit(x, &residual, Some(weight))?;
            for (fi, delta) in f.iter_mut().zip(tree.predict(x)) {
                *fi += self.learning_rate * delta;
            }
            trees.push(tree);
        }
        Ok(BoostedChain { f0, trees })
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GradientBoostingClassifier {
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
        let weight: Vec<f32> = match sample_weight {
            Some(w) => w.to_vec(),
            None => vec![1.0; y.len()],
        };

        let target = |class: u32| -> Vec<f32> {
            y.iter().map(|&l| f32::from(u8::from(l == class))).collect()
        };

        self.chains = if self.classes.len() <= 2 {
            let positive = *self.classes.last().expect("non-empty class set");
            vec![self.fit_chain(x, &target(positive), &weight)?]
        } else {
            self.classes
                .iter()
                .map(|&class| self.fit_chain(x, &target(class), &weight))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        assert!(!self.chains.is_empty(), "Model not fitted");

        if self.classes.len() <= 2 {
            let negative = self.classes[0];
            let positive = *self.classes.last().expect("non-empty class set");
            self.chains[0]
                .raw_scores(x, self.learning_rate)
                .into_iter()
                .map(|f| if f > 0.0 { positive } else { negative })
                .collect()
        } else {
            let scores: Vec<Vec<f32>> = self
                .chains
                .iter()
                .map(|c| c.raw_scores(x, self.learning_rate))
                .collect();
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
        Some(
            self.chains[0]
                .raw_scores(x, self.learning_rate)
                .into_iter()
                .map(sigmoid)
                .collect(),
        )
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
            "max_depth" => {
                let d = value.as_usize();
                if d == 0 {
                    return Err(VfError::InvalidHyperparameter {
                        param: "max_depth".to_string(),
                        value: value.to_string(),
                        constraint: "must be positive".to_string(),
                    });
                }
                self.max_depth = d;
                Ok(())
            }
            other => Err(VfError::InvalidHyperparameter {
                param: other.to_string(),
                value: value.to_string(),
                constraint: "unknown parameter".to_string(),
            }),
        }
    }
}
