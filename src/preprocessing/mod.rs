//! Feature preprocessing.
//!
//! The harness standardizes each data partition with its own fitted scaler,
//! so train and test statistics never mix.

use crate::error::{Result, VfError};
use crate::primitives::Matrix;
use crate::traits::Transformer;

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// Uses the population standard deviation. Near-constant features (std below
/// 1e-10) are centered but not scaled, so they never divide by zero.
///
/// # Examples
///
/// ```
/// use vfeval::preprocessing::StandardScaler;
/// use vfeval::primitives::Matrix;
/// use vfeval::traits::Transformer;
///
/// let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&x).unwrap();
///
/// let mean: f32 = (0..3).map(|i| scaled.get(i, 0)).sum::<f32>() / 3.0;
/// assert!(mean.abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f32>>,
}

impl StandardScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and standard deviation of each feature.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(VfError::from("Cannot fit with zero samples"));
        }

        let mut mean = Vec::with_capacity(n_features);
        let mut std = Vec::with_capacity(n_features);
        for j in 0..n_features {
            let column = x.column(j);
            let m = column.mean();
            let var = column.iter().map(|&v| (v - m) * (v - m)).sum::<f32>()
                / n_samples as f32;
            mean.push(m);
            std.push(var.sqrt());
        }

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| VfError::from("Scaler not fitted"))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| VfError::from("Scaler not fitted"))?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(VfError::DimensionMismatch {
                expected: format!("{} features", mean.len()),
                actual: format!("{n_features}"),
            });
        }

        let mut result = vec![0.0; n_samples * n_features];
        for i in 0..n_samples {
            for j in 0..n_features {
                let mut val = x.get(i, j) - mean[j];
                if std[j] > 1e-10 {
                    val /= std[j];
                }
                result[i * n_features + j] = val;
            }
        }
        Matrix::from_vec(n_samples, n_features, result).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_standardizes() {
        let x = Matrix::from_vec(4, 2, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
            .expect("valid dims");
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).expect("fit");

        for j in 0..2 {
            let mean: f32 = (0..4).map(|i| scaled.get(i, j)).sum::<f32>() / 4.0;
            let var: f32 = (0..4).map(|i| scaled.get(i, j).powi(2)).sum::<f32>() / 4.0;
            assert!(mean.abs() < 1e-5);
            assert!((var - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_constant_feature_not_scaled() {
        let x = Matrix::from_vec(3, 1, vec![5.0, 5.0, 5.0]).expect("valid dims");
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).expect("fit");
        for i in 0..3 {
            assert_eq!(scaled.get(i, 0), 0.0);
        }
    }

    #[test]
    fn test_transform_before_fit_errors() {
        let x = Matrix::from_vec(1, 1, vec![1.0]).expect("valid dims");
        let scaler = StandardScaler::new();
        assert!(scaler.transform(&x).is_err());
    }

    #[test]
    fn test_transform_dimension_mismatch() {
        let x = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).expect("valid dims");
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).expect("fit");

        let wrong = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]).expect("valid dims");
        assert!(scaler.transform(&wrong).is_err());
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let x = Matrix::from_vec(0, 2, vec![]).expect("valid dims");
        let mut scaler = StandardScaler::new();
        assert!(scaler.fit(&x).is_err());
    }
}
