//! Core traits for classifier backends and data transformers.
//!
//! These traits define the API contracts the evaluation harness relies on.
//! Every backend, whatever its internal shape, is driven through the same
//! capability interface: fit with optional per-sample weights, hard
//! predictions, and (optionally) calibrated positive-class scores.

use crate::error::Result;
use crate::primitives::Matrix;
use crate::search::ParamValue;

/// Capability interface for classifier backends.
///
/// Labels are small unsigned integers as produced by the rhythm labeling
/// engine. Backends discover the class set from the training labels.
///
/// # Examples
///
/// ```
/// use vfeval::prelude::*;
/// use vfeval::models::LogisticRegression;
///
/// let x = Matrix::from_vec(4, 1, vec![-2.0, -1.0, 1.0, 2.0]).unwrap();
/// let y = vec![0, 0, 1, 1];
///
/// let mut model = LogisticRegression::new();
/// model.fit(&x, &y, None).unwrap();
/// assert_eq!(model.predict(&x), y);
/// ```
pub trait Classifier {
    /// Fits the model to training data.
    ///
    /// `sample_weight`, when given, scales each sample's contribution to the
    /// fitting objective. Backends without a native notion of class
    /// weighting receive inverse-class-frequency weights through this
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (dimension mismatch, empty data,
    /// etc.).
    fn fit(&mut self, x: &Matrix<f32>, y: &[u32], sample_weight: Option<&[f32]>) -> Result<()>;

    /// Predicts one class label per sample.
    ///
    /// # Panics
    ///
    /// Panics if called before `fit`.
    fn predict(&self, x: &Matrix<f32>) -> Vec<u32>;

    /// Positive-class scores (higher = more positive), one per sample.
    ///
    /// Returns `None` when the backend exposes no calibrated score, or when
    /// the fitted problem is not binary. Threshold-based report columns are
    /// omitted in that case.
    fn predict_score(&self, x: &Matrix<f32>) -> Option<Vec<f32>> {
        let _ = x;
        None
    }

    /// Applies one tuned hyperparameter by name.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown parameter name or an out-of-range
    /// value.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Whether the backend balances classes natively when asked to.
    ///
    /// When true, the harness never injects inverse-frequency sample
    /// weights; the backend's own mechanism is used instead.
    fn supports_class_weight(&self) -> bool {
        false
    }
}

/// Trait for data transformers (scalers, encoders, etc.).
pub trait Transformer {
    /// Learns transformation parameters from data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails (e.g. empty data).
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Applies the learned transformation.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `fit` or on mismatched dimensions.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// Fits to the data, then transforms it.
    ///
    /// # Errors
    ///
    /// Returns an error if either step fails.
    fn fit_transform(&mut self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}
