//! Confusion-matrix-derived classification results.
//!
//! A label is "positive" when it is non-zero, which coincides with exact
//! equality comparison on {0, 1} vectors. Rates with a zero denominator are
//! `None`, never a silently substituted zero.

/// Counts and rates for one binary prediction.
///
/// # Examples
///
/// ```
/// use vfeval::metrics::BinaryClassificationResult;
///
/// let result = BinaryClassificationResult::new(&[1, 1, 0, 0], &[1, 0, 0, 1]);
/// assert_eq!(result.tp, 1);
/// assert_eq!(result.fn_, 1);
/// assert_eq!(result.sensitivity(), Some(0.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryClassificationResult {
    /// True positives.
    pub tp: u32,
    /// True negatives.
    pub tn: u32,
    /// False positives.
    pub fp: u32,
    /// False negatives.
    pub fn_: u32,
}

fn rate(num: u32, den: u32) -> Option<f32> {
    (den > 0).then(|| num as f32 / den as f32)
}

impl BinaryClassificationResult {
    /// Computes counts from true and predicted label vectors.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different lengths.
    #[must_use]
    pub fn new(y_true: &[u32], y_pred: &[u32]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "Vectors must have same length");

        let mut result = Self {
            tp: 0,
            tn: 0,
            fp: 0,
            fn_: 0,
        };
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t != 0, p != 0) {
                (true, true) => result.tp += 1,
                (false, false) => result.tn += 1,
                (false, true) => result.fp += 1,
                (true, false) => result.fn_ += 1,
            }
        }
        result
    }

    /// True positive rate, tp / (tp + fn).
    #[must_use]
    pub fn sensitivity(&self) -> Option<f32> {
        rate(self.tp, self.tp + self.fn_)
    }

    /// True negative rate, tn / (tn + fp).
    #[must_use]
    pub fn specificity(&self) -> Option<f32> {
        rate(self.tn, self.tn + self.fp)
    }

    /// Positive predictive value, tp / (tp + fp).
    #[must_use]
    pub fn precision(&self) -> Option<f32> {
        rate(self.tp, self.tp + self.fp)
    }

    /// Fraction of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> Option<f32> {
        rate(self.tp + self.tn, self.total())
    }

    /// Total number of samples counted.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// One-vs-rest decomposition of a multi-class prediction.
///
/// One [`BinaryClassificationResult`] per class, in the order of the class
/// enumeration: that class is "positive", all others collapse to "negative".
#[derive(Debug, Clone)]
pub struct MultiClassificationResult {
    /// Per-class binary results, matching the class order given to `new`.
    pub results: Vec<BinaryClassificationResult>,
}

impl MultiClassificationResult {
    /// Decomposes `y_true` vs `y_pred` one-vs-rest over `classes`.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different lengths.
    #[must_use]
    pub fn new(y_true: &[u32], y_pred: &[u32], classes: &[u32]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "Vectors must have same length");

        let results = classes
            .iter()
            .map(|&class| {
                let t: Vec<u32> = y_true.iter().map(|&v| u32::from(v == class)).collect();
                let p: Vec<u32> = y_pred.iter().map(|&v| u32::from(v == class)).collect();
                BinaryClassificationResult::new(&t, &p)
            })
            .collect();
        Self { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_counts() {
        let y_true = [1, 1, 1, 0, 0, 0];
        let y_pred = [1, 1, 0, 0, 1, 0];
        let r = BinaryClassificationResult::new(&y_true, &y_pred);
        assert_eq!((r.tp, r.tn, r.fp, r.fn_), (2, 2, 1, 1));
        assert_eq!(r.total(), 6);
    }

    #[test]
    fn test_binary_rates() {
        let r = BinaryClassificationResult {
            tp: 8,
            tn: 6,
            fp: 2,
            fn_: 4,
        };
        assert_eq!(r.sensitivity(), Some(8.0 / 12.0));
        assert_eq!(r.specificity(), Some(6.0 / 8.0));
        assert_eq!(r.precision(), Some(8.0 / 10.0));
        assert_eq!(r.accuracy(), Some(14.0 / 20.0));
    }

    #[test]
    fn test_rates_in_unit_interval_and_counts_total() {
        let y_true = [1, 0, 1, 0, 1, 1, 0];
        let y_pred = [1, 1, 0, 0, 1, 0, 1];
        let r = BinaryClassificationResult::new(&y_true, &y_pred);
        assert_eq!(r.total() as usize, y_true.len());
        for value in [r.sensitivity(), r.specificity(), r.precision(), r.accuracy()] {
            let v = value.expect("defined for mixed classes");
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_zero_denominator_is_undefined_not_zero() {
        // No positive samples and no positive predictions.
        let r = BinaryClassificationResult::new(&[0, 0], &[0, 0]);
        assert_eq!(r.sensitivity(), None);
        assert_eq!(r.precision(), None);
        assert_eq!(r.specificity(), Some(1.0));

        // No negatives at all.
        let r = BinaryClassificationResult::new(&[1, 1], &[1, 1]);
        assert_eq!(r.specificity(), None);
        assert_eq!(r.sensitivity(), Some(1.0));
    }

    #[test]
    fn test_empty_partition_all_undefined() {
        let r = BinaryClassificationResult::new(&[], &[]);
        assert_eq!(r.accuracy(), None);
        assert_eq!(r.sensitivity(), None);
        assert_eq!(r.specificity(), None);
        assert_eq!(r.precision(), None);
    }

    #[test]
    fn test_one_vs_rest_order_preserved() {
        let y_true = [0, 1, 2, 1, 0, 2];
        let y_pred = [0, 1, 1, 1, 2, 2];
        let multi = MultiClassificationResult::new(&y_true, &y_pred, &[0, 1, 2]);
        assert_eq!(multi.results.len(), 3);
        // Class 0: one correct, one missed (predicted 2).
        assert_eq!(multi.results[0].tp, 1);
        assert_eq!(multi.results[0].fn_, 1);
        // Class 1: both true 1s hit, one spurious (true 2 predicted 1).
        assert_eq!(multi.results[1].tp, 2);
        assert_eq!(multi.results[1].fp, 1);
    }

    #[test]
    fn test_one_vs_rest_tp_sum_equals_correct_count() {
        let y_true = [0, 1, 2, 1, 0, 2, 2, 0];
        let y_pred = [0, 2, 2, 1, 1, 0, 2, 0];
        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count() as u32;
        let multi = MultiClassificationResult::new(&y_true, &y_pred, &[0, 1, 2]);
        let tp_sum: u32 = multi.results.iter().map(|r| r.tp).sum();
        assert_eq!(tp_sum, correct);
    }
}
