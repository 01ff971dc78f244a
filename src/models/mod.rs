//! Classifier backends and their tuning grids.
//!
//! The harness drives every backend through the [`Classifier`] trait; the
//! [`Model`] enum gives it a single concrete type to clone across search
//! workers. [`build`] pairs each backend with the hyperparameter grid the
//! evaluation sweeps.

mod boosting;
mod common;
mod forest;
mod logistic;
mod mlp;
mod svm;
mod tree;

pub use boosting::{AdaBoostClassifier, GradientBoostingClassifier};
pub use forest::RandomForestClassifier;
pub use logistic::LogisticRegression;
pub use mlp::MlpClassifier;
pub use svm::LinearSvc;
pub use tree::{DecisionTreeClassifier, RegressionTree};

use crate::error::Result;
use crate::primitives::Matrix;
use crate::search::{int_range, logspace, ParamGrid, ParamValue};
use crate::traits::Classifier;
use std::fmt;
use std::str::FromStr;

/// The classifier families the harness can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// L2-regularized logistic regression.
    LogisticRegression,
    /// Bagged Gini trees with majority voting.
    RandomForest,
    /// SAMME-boosted decision stumps.
    AdaBoost,
    /// Gradient-boosted shallow regression trees.
    GradientBoosting,
    /// Linear support vector classifier.
    Svc,
    /// Perceptron with one tanh hidden layer.
    Mlp1,
    /// Perceptron with two tanh hidden layers.
    Mlp2,
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "logistic_regression" => Ok(Self::LogisticRegression),
            "random_forest" => Ok(Self::RandomForest),
            "adaboost" => Ok(Self::AdaBoost),
            "gradient_boosting" => Ok(Self::GradientBoosting),
            "svc" => Ok(Self::Svc),
            "mlp1" => Ok(Self::Mlp1),
            "mlp2" => Ok(Self::Mlp2),
            other => Err(format!(
                "unknown model '{other}' (expected logistic_regression, random_forest, \
                 adaboost, gradient_boosting, svc, mlp1, or mlp2)"
            )),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LogisticRegression => "logistic_regression",
            Self::RandomForest => "random_forest",
            Self::AdaBoost => "adaboost",
            Self::GradientBoosting => "gradient_boosting",
            Self::Svc => "svc",
            Self::Mlp1 => "mlp1",
            Self::Mlp2 => "mlp2",
        };
        write!(f, "{name}")
    }
}

/// A classifier backend behind a single concrete type.
#[derive(Debug, Clone)]
pub enum Model {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForestClassifier),
    AdaBoost(AdaBoostClassifier),
    GradientBoosting(GradientBoostingClassifier),
    Svc(LinearSvc),
    Mlp(MlpClassifier),
}

impl Model {
    /// Reseeds the backend's internal randomness where it has any.
    pub fn set_random_state(&mut self, seed: u64) {
        match self {
            Self::RandomForest(m) => {
                *m = m.clone().with_random_state(seed);
            }
            Self::AdaBoost(m) => {
                *m = m.clone().with_random_state(seed);
            }
            Self::Svc(m) => {
                *m = m.clone().with_random_state(seed);
            }
            Self::Mlp(m) => {
                *m = m.clone().with_random_state(seed);
            }
            Self::LogisticRegression(_) | Self::GradientBoosting(_) => {}
        }
    }
}

impl Classifier for Model {
    fn fit(&mut self, x: &Matrix<f32>, y: &[u32], sample_weight: Option<&[f32]>) -> Result<()> {
        match self {
            Self::LogisticRegression(m) => m.fit(x, y, sample_weight),
            Self::RandomForest(m) => m.fit(x, y, sample_weight),
            Self::AdaBoost(m) => m.fit(x, y, sample_weight),
            Self::GradientBoosting(m) => m.fit(x, y, sample_weight),
            Self::Svc(m) => m.fit(x, y, sample_weight),
            Self::Mlp(m) => m.fit(x, y, sample_weight),
        }
    }

    fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        match self {
            Self::LogisticRegression(m) => m.predict(x),
            Self::RandomForest(m) => m.predict(x),
            Self::AdaBoost(m) => m.predict(x),
            Self::GradientBoosting(m) => m.predict(x),
            Self::Svc(m) => m.predict(x),
            Self::Mlp(m) => m.predict(x),
        }
    }

    fn predict_score(&self, x: &Matrix<f32>) -> Option<Vec<f32>> {
        match self {
            Self::LogisticRegression(m) => m.predict_score(x),
            Self::RandomForest(m) => m.predict_score(x),
            Self::AdaBoost(m) => m.predict_score(x),
            Self::GradientBoosting(m) => m.predict_score(x),
            Self::Svc(m) => m.predict_score(x),
            Self::Mlp(m) => m.predict_score(x),
        }
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match self {
            Self::LogisticRegression(m) => m.set_param(name, value),
            Self::RandomForest(m) => m.set_param(name, value),
            Self::AdaBoost(m) => m.set_param(name, value),
            Self::GradientBoosting(m) => m.set_param(name, value),
            Self::Svc(m) => m.set_param(name, value),
            Self::Mlp(m) => m.set_param(name, value),
        }
    }

    fn supports_class_weight(&self) -> bool {
        match self {
            Self::LogisticRegression(m) => m.supports_class_weight(),
            Self::RandomForest(m) => m.supports_class_weight(),
            Self::AdaBoost(m) => m.supports_class_weight(),
            Self::GradientBoosting(m) => m.supports_class_weight(),
            Self::Svc(m) => m.supports_class_weight(),
            Self::Mlp(m) => m.supports_class_weight(),
        }
    }
}

/// Instantiates a backend and its tuning grid.
///
/// `balanced` turns on native class weighting for the backends that have it;
/// the others stay unweighted here and may receive sample weights at fit
/// time instead.
#[must_use]
pub fn build(kind: ModelKind, balanced: bool) -> (Model, ParamGrid) {
    match kind {
        ModelKind::LogisticRegression => (
            Model::LogisticRegression(
                LogisticRegression::new().with_balanced_class_weight(balanced),
            ),
            ParamGrid::new().add("C", logspace(-4.0, 4.0, 10)),
        ),
        ModelKind::RandomForest => (
            Model::RandomForest(
                RandomForestClassifier::new().with_balanced_class_weight(balanced),
            ),
            ParamGrid::new().add("n_estimators", int_range(10, 110, 10)),
        ),
        ModelKind::AdaBoost => (
            Model::AdaBoost(AdaBoostClassifier::new()),
            ParamGrid::new()
                .add("n_estimators", int_range(30, 150, 10))
                .add("learning_rate", logspace(-1.0, 0.0, 2)),
        ),
        ModelKind::GradientBoosting => (
            Model::GradientBoosting(GradientBoostingClassifier::new()),
            ParamGrid::new()
                .add("n_estimators", int_range(150, 250, 10))
                .add("max_depth", int_range(3, 8, 1)),
        ),
        ModelKind::Svc => (
            Model::Svc(LinearSvc::new().with_balanced_class_weight(balanced)),
            ParamGrid::new().add("C", logspace(0.0, 1.0, 2)),
        ),
        ModelKind::Mlp1 => (
            Model::Mlp(MlpClassifier::new(1)),
            ParamGrid::new()
                .add("learning_rate", vec![ParamValue::Float(1e-4)])
                .add("weight_decay", logspace(-6.0, -5.0, 2))
                .add("hidden0_units", int_range(5, 26, 1)),
        ),
        ModelKind::Mlp2 => (
            Model::Mlp(MlpClassifier::new(2)),
            ParamGrid::new()
                .add("learning_rate", vec![ParamValue::Float(1e-4)])
                .add("weight_decay", logspace(-6.0, -5.0, 2))
                .add("hidden0_units", int_range(2, 5, 1))
                .add("hidden1_units", int_range(2, 5, 1)),
        ),
    }
}
