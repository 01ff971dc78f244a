//! ROC curves and sensitivity at fixed specificity operating points.

/// False positive rate targets for the threshold-based report columns, in the
/// order they appear in the report: Se(Sp95), Se(Sp97), Se(Sp99).
pub const FPR_TARGETS: [f32; 3] = [0.05, 0.03, 0.01];

/// A receiver operating characteristic curve.
///
/// Points are stored with `fpr` non-decreasing, so the curve supports binary
/// search by false positive rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    fpr: Vec<f32>,
    tpr: Vec<f32>,
}

impl RocCurve {
    /// Builds the curve from binary labels and continuous scores (higher =
    /// more positive).
    ///
    /// Sweeps the decision threshold down through the distinct score values,
    /// accumulating true and false positive counts. Returns an empty curve
    /// when either class is absent, since no rate is defined then.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different lengths.
    #[must_use]
    pub fn new(y_true: &[u32], scores: &[f32]) -> Self {
        assert_eq!(y_true.len(), scores.len(), "Vectors must have same length");

        let n_pos = y_true.iter().filter(|&&t| t != 0).count();
        let n_neg = y_true.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Self {
                fpr: Vec::new(),
                tpr: Vec::new(),
            };
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut fpr = vec![0.0];
        let mut tpr = vec![0.0];
        let mut tp = 0usize;
        let mut fp = 0usize;
        for (rank, &i) in order.iter().enumerate() {
            if y_true[i] != 0 {
                tp += 1;
            } else {
                fp += 1;
            }
            // Emit a point only after the last sample of a tied score group.
            let next = order.get(rank + 1);
            if next.map_or(true, |&j| scores[j] < scores[i]) {
                fpr.push(fp as f32 / n_neg as f32);
                tpr.push(tp as f32 / n_pos as f32);
            }
        }
        Self { fpr, tpr }
    }

    /// Builds a curve from precomputed points.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different lengths or `fpr` is not
    /// non-decreasing.
    #[must_use]
    pub fn from_points(fpr: Vec<f32>, tpr: Vec<f32>) -> Self {
        assert_eq!(fpr.len(), tpr.len(), "Vectors must have same length");
        assert!(
            fpr.windows(2).all(|w| w[0] <= w[1]),
            "fpr must be non-decreasing"
        );
        Self { fpr, tpr }
    }

    /// Whether the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }

    /// Sensitivity at the first achieved false positive rate reaching
    /// `target`.
    ///
    /// Left insertion on the fpr axis: the answer is the tpr of the point
    /// where `target` would be inserted. Returns `None` on an empty curve or
    /// when `target` exceeds every achieved rate.
    #[must_use]
    pub fn sensitivity_at_fpr(&self, target: f32) -> Option<f32> {
        let idx = self.fpr.partition_point(|&f| f < target);
        self.tpr.get(idx).copied()
    }
}
