//! Scoring functions for cross-validated hyperparameter search.
//!
//! Every scorer is greater-is-better, so candidate selection is a plain
//! maximum. The balanced error rate is negated to fit that convention.

use crate::metrics::classification::BinaryClassificationResult;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Metric used to rank hyperparameter candidates during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scorer {
    /// Fraction of correct predictions.
    Accuracy,
    /// Negated balanced error rate (mean per-class miss rate).
    Ber,
    /// F1 of the positive (non-zero) class.
    F1,
    /// Support-weighted mean of per-class F1 scores.
    F1Weighted,
    /// Precision of the positive (non-zero) class.
    Precision,
}

impl Scorer {
    /// Scores predictions against truth. Greater is better.
    ///
    /// Undefined components (empty class, no predicted positives) contribute
    /// zero, so a degenerate fold ranks low instead of failing.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different lengths.
    #[must_use]
    pub fn score(&self, y_true: &[u32], y_pred: &[u32]) -> f32 {
        assert_eq!(y_true.len(), y_pred.len(), "Vectors must have same length");

        match self {
            Self::Accuracy => {
                if y_true.is_empty() {
                    return 0.0;
                }
                let correct = y_true
                    .iter()
                    .zip(y_pred.iter())
                    .filter(|(t, p)| t == p)
                    .count();
                correct as f32 / y_true.len() as f32
            }
            Self::Ber => -balanced_error_rate(y_true, y_pred),
            Self::F1 => {
                let r = BinaryClassificationResult::new(y_true, y_pred);
                f1_from_counts(&r)
            }
            Self::F1Weighted => f1_weighted(y_true, y_pred),
            Self::Precision => BinaryClassificationResult::new(y_true, y_pred)
                .precision()
                .unwrap_or(0.0),
        }
    }
}

impl FromStr for Scorer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accuracy" => Ok(Self::Accuracy),
            "ber" => Ok(Self::Ber),
            "f1" => Ok(Self::F1),
            "f1_weighted" => Ok(Self::F1Weighted),
            "precision" => Ok(Self::Precision),
            other => Err(format!(
                "unknown scorer '{other}' (expected accuracy, ber, f1, f1_weighted, or precision)"
            )),
        }
    }
}

impl fmt::Display for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accuracy => "accuracy",
            Self::Ber => "ber",
            Self::F1 => "f1",
            Self::F1Weighted => "f1_weighted",
            Self::Precision => "precision",
        };
        write!(f, "{name}")
    }
}

fn f1_from_counts(r: &BinaryClassificationResult) -> f32 {
    let p = r.precision().unwrap_or(0.0);
    let s = r.sensitivity().unwrap_or(0.0);
    if p + s == 0.0 {
        0.0
    } else {
        2.0 * p * s / (p + s)
    }
}

fn observed_classes(y_true: &[u32], y_pred: &[u32]) -> Vec<u32> {
    y_true
        .iter()
        .chain(y_pred.iter())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn one_vs_rest(y: &[u32], class: u32) -> Vec<u32> {
    y.iter().map(|&v| u32::from(v == class)).collect()
}

/// Support-weighted mean of per-class one-vs-rest F1 scores.
fn f1_weighted(y_true: &[u32], y_pred: &[u32]) -> f32 {
    let total = y_true.len();
    if total == 0 {
        return 0.0;
    }
    observed_classes(y_true, y_pred)
        .into_iter()
        .map(|class| {
            let support = y_true.iter().filter(|&&v| v == class).count() as f32;
            let r = BinaryClassificationResult::new(
                &one_vs_rest(y_true, class),
                &one_vs_rest(y_pred, class),
            );
            support / total as f32 * f1_from_counts(&r)
        })
        .sum()
}

/// Mean per-class miss rate over classes present in `y_true`.
fn balanced_error_rate(y_true: &[u32], y_pred: &[u32]) -> f32 {
    let classes: Vec<u32> = y_true.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    if classes.is_empty() {
        return 0.0;
    }
    let miss_sum: f32 = classes
        .iter()
        .map(|&class| {
            let r = BinaryClassificationResult::new(
                &one_vs_rest(y_true, class),
                &one_vs_rest(y_pred, class),
            );
            1.0 - r.sensitivity().unwrap_or(0.0)
        })
        .sum();
    miss_sum / classes.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_parse_round_trip() {
        for name in ["accuracy", "ber", "f1", "f1_weighted", "precision"] {
            let scorer: Scorer = name.parse().expect("known scorer");
            assert_eq!(scorer.to_string(), name);
        }
        assert!("gini".parse::<Scorer>().is_err());
    }

    #[test]
    fn test_perfect_prediction_scores() {
        let y = [0, 1, 1, 0, 1];
        assert!((Scorer::Accuracy.score(&y, &y) - 1.0).abs() < EPS);
        assert!((Scorer::F1.score(&y, &y) - 1.0).abs() < EPS);
        assert!((Scorer::F1Weighted.score(&y, &y) - 1.0).abs() < EPS);
        assert!((Scorer::Precision.score(&y, &y) - 1.0).abs() < EPS);
        // Perfect prediction has zero balanced error.
        assert!(Scorer::Ber.score(&y, &y).abs() < EPS);
    }

    #[test]
    fn test_accuracy() {
        let y_true = [0, 1, 1, 0];
        let y_pred = [0, 1, 0, 1];
        assert!((Scorer::Accuracy.score(&y_true, &y_pred) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_f1_binary() {
        let y_true = [1, 1, 1, 0, 0];
        let y_pred = [1, 1, 0, 0, 1];
        // precision 2/3, recall 2/3 -> f1 2/3.
        assert!((Scorer::F1.score(&y_true, &y_pred) - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_f1_no_positives_predicted() {
        let y_true = [1, 1, 0];
        let y_pred = [0, 0, 0];
        assert!(Scorer::F1.score(&y_true, &y_pred).abs() < EPS);
    }

    #[test]
    fn test_f1_weighted_multiclass() {
        let y_true = [0, 0, 0, 1, 2, 2];
        let y_pred = [0, 0, 1, 1, 2, 0];
        // class 0: p=3/4? no: tp=2, fp=1, fn=1 -> p=2/3, r=2/3, f1=2/3, w=3/6
        // class 1: tp=1, fp=1, fn=0 -> p=1/2, r=1, f1=2/3, w=1/6
        // class 2: tp=1, fp=0, fn=1 -> p=1, r=1/2, f1=2/3, w=2/6
        let expected = 2.0 / 3.0;
        assert!((Scorer::F1Weighted.score(&y_true, &y_pred) - expected).abs() < EPS);
    }

    #[test]
    fn test_ber_negated() {
        let y_true = [1, 1, 0, 0];
        let y_pred = [1, 0, 0, 0];
        // class 1 misses half, class 0 misses none -> ber 0.25.
        assert!((Scorer::Ber.score(&y_true, &y_pred) + 0.25).abs() < EPS);
        // Greater is better: perfect beats imperfect.
        assert!(Scorer::Ber.score(&y_true, &y_true) > Scorer::Ber.score(&y_true, &y_pred));
    }
}
