//! Multi-layer perceptron with tanh hidden layers and a softmax output,
//! trained by per-sample stochastic gradient descent with L2 weight decay.

use crate::error::{Result, VfError};
use crate::models::common::class_set;
use crate::primitives::Matrix;
use crate::search::ParamValue;
use crate::traits::Classifier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// One dense layer: row-major weights of shape `n_out x n_in` plus biases.
#[derive(Debug, Clone)]
struct DenseLayer {
    w: Vec<f32>,
    b: Vec<f32>,
    n_in: usize,
    n_out: usize,
}

impl DenseLayer {
    fn init<R: Rng>(n_in: usize, n_out: usize, rng: &mut R) -> Self {
        let scale = 1.0 / (n_in as f32).sqrt();
        let w = (0..n_in * n_out)
            .map(|_| rng.gen_range(-scale..scale))
            .collect();
        Self {
            w,
            b: vec![0.0; n_out],
            n_in,
            n_out,
        }
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        (0..self.n_out)
            .map(|o| {
                let row = &self.w[o * self.n_in..(o + 1) * self.n_in];
                row.iter().zip(input.iter()).map(|(w, x)| w * x).sum::<f32>() + self.b[o]
            })
            .collect()
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&z| (z - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Feed-forward neural network classifier with one or two tanh hidden
/// layers.
#[derive(Debug, Clone)]
pub struct MlpClassifier {
    n_hidden_layers: usize,
    hidden_units: [usize; 2],
    learning_rate: f32,
    weight_decay: f32,
    epochs: usize,
    random_state: u64,
    classes: Vec<u32>,
    layers: Vec<DenseLayer>,
}

impl MlpClassifier {
    /// Creates a network with `n_hidden_layers` (1 or 2) tanh layers.
    ///
    /// # Panics
    ///
    /// Panics if `n_hidden_layers` is not 1 or 2.
    #[must_use]
    pub fn new(n_hidden_layers: usize) -> Self {
        assert!(
            (1..=2).contains(&n_hidden_layers),
            "supported depths are 1 and 2 hidden layers"
        );
        Self {
            n_hidden_layers,
            hidden_units: [10, 3],
            learning_rate: 0.01,
            weight_decay: 1e-6,
            epochs: 200,
            random_state: 0,
            classes: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// Seeds weight initialization and epoch shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Class probabilities for one sample.
    fn forward(&self, row: &[f32]) -> Vec<f32> {
        let mut activation = row.to_vec();
        for layer in &self.layers[..self.layers.len() - 1] {
            activation = layer.forward(&activation);
            for a in &mut activation {
                *a = a.tanh();
            }
        }
        let logits = self.layers[self.layers.len() - 1].forward(&activation);
        softmax(&logits)
    }

    /// One backprop step on a single sample; returns nothing, updates
    /// weights in place.
    fn train_sample(&mut self, row: &[f32], target: usize, sample_weight: f32) {
        // Forward pass, remembering activations per layer.
        let mut activations: Vec<Vec<f32>> = vec![row.to_vec()];
        for (idx, layer) in self.layers.iter().enumerate() {
            let mut z = layer.forward(activations.last().expect("input pushed"));
            if idx < self.layers.len() - 1 {
                for v in &mut z {
                    *v = v.tanh();
                }
            }
            activations.push(z);
        }
        let probs = softmax(activations.last().expect("output layer"));

        // Output delta for softmax with cross-entropy.
        let mut delta: Vec<f32> = probs
            .iter()
            .enumerate()
            .map(|(k, &p)| sample_weight * (p - f32::from(u8::from(k == target))))
            .collect();

        for idx in (0..self.layers.len()).rev() {
            let input = activations[idx].clone();
            let next_delta = if idx > 0 {
                let layer = &self.layers[idx];
                let mut upstream = vec![0.0f32; layer.n_in];
                for (o, d) in delta.iter().enumerate() {
                    for (i, u) in upstream.iter_mut().enumerate() {
                        *u += d * layer.w[o * layer.n_in + i];
                    }
                }
                // Through the tanh of the layer below.
                for (u, a) in upstream.iter_mut().zip(input.iter()) {
                    *u *= 1.0 - a * a;
                }
                Some(upstream)
            } else {
                None
            };

            let layer = &mut self.layers[idx];
            for (o, d) in delta.iter().enumerate() {
                for (i, &a) in input.iter().enumerate() {
                    let w = &mut layer.w[o * layer.n_in + i];
                    *w -= self.learning_rate * (d * a + self.weight_decay * *w);
                }
                layer.b[o] -= self.learning_rate * d;
            }

            match next_delta {
                Some(upstream) => delta = upstream,
                None => break,
            }
        }
    }
}

impl Classifier for MlpClassifier {
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
        let n_features = x.n_cols();
        let n_classes = self.classes.len();

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut sizes = vec![n_features];
        sizes.extend_from_slice(&self.hidden_units[..self.n_hidden_layers]);
        sizes.push(n_classes);
        self.layers = sizes
            .windows(2)
            .map(|pair| DenseLayer::init(pair[0], pair[1], &mut rng))
            .collect();

        let targets: Vec<usize> = y
            .iter()
            .map(|&label| {
                self.classes
                    .binary_search(&label)
                    .expect("label drawn from class set")
            })
            .collect();
        let weight: Vec<f32> = match sample_weight {
            Some(w) => w.to_vec(),
            None => vec![1.0; y.len()],
        };

        let mut order: Vec<usize> = (0..y.len()).collect();
        for _ in 0..self.epochs {
            order.shuffle(&mut rng);
            for &i in &order {
                let row = x.row(i).to_vec();
                self.train_sample(&row, targets[i], weight[i]);
            }
        }
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        assert!(!self.layers.is_empty(), "Model not fitted");
        (0..x.n_rows())
            .map(|i| {
                let probs = self.forward(x.row(i));
                let best = (0..probs.len())
                    .max_by(|&a, &b| probs[a].total_cmp(&probs[b]))
                    .expect("at least one class");
                self.classes[best]
            })
            .collect()
    }

    fn predict_score(&self, x: &Matrix<f32>) -> Option<Vec<f32>> {
        if self.classes.len() != 2 {
            return None;
        }
        Some((0..x.n_rows()).map(|i| self.forward(x.row(i))[1]).collect())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        let positive_units = |value: &ParamValue, param: &str| -> Result<usize> {
            let n = value.as_usize();
            if n == 0 {
                return Err(VfError::InvalidHyperparameter {
                    param: param.to_string(),
                    value: value.to_string(),
                    constraint: "must be positive".to_string(),
                });
            }
            Ok(n)
        };

        match name {
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
            "weight_decay" => {
                let wd = value.as_f32();
                if wd < 0.0 {
                    return Err(VfError::InvalidHyperparameter {
                        param: "weight_decay".to_string(),
                        value: value.to_string(),
                        constraint: "must be non-negative".to_string(),
                    });
                }
                self.weight_decay = wd;
                Ok(())
            }
            "hidden0_units" => {
                self.hidden_units[0] = positive_units(value, "hidden0_units")?;
                Ok(())
            }
            "hidden1_units" => {
                if self.n_hidden_layers < 2 {
                    return Err(VfError::InvalidHyperparameter {
                        param: "hidden1_units".to_string(),
                        value: value.to_string(),
                        constraint: "network has a single hidden layer".to_string(),
                    });
                }
                self.hidden_units[1] = positive_units(value, "hidden1_units")?;
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
