//! Decision trees: the building blocks for the ensemble backends.
//!
//! `DecisionTreeClassifier` grows axis-aligned splits by Gini impurity;
//! `RegressionTree` minimizes weighted squared error and predicts leaf
//! means. Both are deterministic given their inputs: features are scanned in
//! index order and a split must strictly improve to win.

use crate::error::{Result, VfError};
use crate::primitives::Matrix;
use std::collections::BTreeMap;

/// A node in a fitted tree.
#[derive(Debug, Clone)]
enum TreeNode<L> {
    Leaf(L),
    Split {
        feature_idx: usize,
        threshold: f32,
        left: Box<TreeNode<L>>,
        right: Box<TreeNode<L>>,
    },
}

impl<L: Copy> TreeNode<L> {
    fn predict_one(&self, row: &[f32]) -> L {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(value) => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Gini impurity of a label multiset given its class counts and total.
fn gini_from_counts(counts: &BTreeMap<u32, usize>, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let sum_sq: f32 = counts
        .values()
        .map(|&c| {
            let p = c as f32 / total as f32;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Most frequent label; ties go to the smallest label.
fn majority_class(counts: &BTreeMap<u32, usize>) -> u32 {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(&label, _)| label)
        .unwrap_or(0)
}

/// Classification tree split by Gini impurity.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    max_depth: Option<usize>,
    tree: Option<TreeNode<u32>>,
}

impl DecisionTreeClassifier {
    /// Creates an unfitted tree with no depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            tree: None,
        }
    }

    /// Limits tree depth; depth 1 is a decision stump.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Grows the tree on the given samples.
    ///
    /// # Errors
    ///
    /// Returns an error on empty data or a row/label count mismatch.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[u32]) -> Result<()> {
        if y.is_empty() {
            return Err(VfError::from("Cannot fit on empty data"));
        }
        if x.n_rows() != y.len() {
            return Err(VfError::DimensionMismatch {
                expected: format!("{} labels", x.n_rows()),
                actual: format!("{}", y.len()),
            });
        }
        let indices: Vec<usize> = (0..y.len()).collect();
        self.tree = Some(self.build(x, y, &indices, 0));
        Ok(())
    }

    /// Predicts one label per row.
    ///
    /// # Panics
    ///
    /// Panics if called before `fit`.
    #[must_use]
    pub fn predict(&self, x: &Matrix<f32>) -> Vec<u32> {
        let tree = self.tree.as_ref().expect("Model not fitted");
        (0..x.n_rows()).map(|i| tree.predict_one(x.row(i))).collect()
    }

    fn build(&self, x: &Matrix<f32>, y: &[u32], indices: &[usize], depth: usize) -> TreeNode<u32> {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for &i in indices {
            *counts.entry(y[i]).or_default() += 1;
        }

        let pure = counts.len() <= 1;
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        if pure || depth_reached || indices.len() < 2 {
            return TreeNode::Leaf(majority_class(&counts));
        }

        let Some((feature_idx, threshold)) = best_gini_split(x, y, indices, &counts) else {
            return TreeNode::Leaf(majority_class(&counts));
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x.get(i, feature_idx) <= threshold);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, &left_idx, depth + 1)),
            right: Box::new(self.build(x, y, &right_idx, depth + 1)),
        }
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Best (feature, threshold) by weighted Gini over candidate midpoints.
///
/// Returns `None` when no split separates the samples.
fn best_gini_split(
    x: &Matrix<f32>,
    y: &[u32],
    indices: &[usize],
    parent_counts: &BTreeMap<u32, usize>,
) -> Option<(usize, f32)> {
    let n_total = indices.len();
    let parent_gini = gini_from_counts(parent_counts, n_total);

    let mut best: Option<(usize, f32)> = None;
    let mut best_gain = 0.0f32;

    for feature_idx in 0..x.n_cols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| x.get(a, feature_idx).total_cmp(&x.get(b, feature_idx)));

        let mut left_counts: BTreeMap<u32, usize> = BTreeMap::new();
        for split_at in 1..n_total {
            let moved = order[split_at - 1];
            *left_counts.entry(y[moved]).or_default() += 1;

            let prev = x.get(order[split_at - 1], feature_idx);
            let next = x.get(order[split_at], feature_idx);
            if prev == next {
                continue;
            }

            let n_left = split_at;
            let n_right = n_total - split_at;
            let mut right_counts = parent_counts.clone();
            for (label, count) in &left_counts {
                *right_counts.get_mut(label).expect("subset of parent") -= count;
            }

            let split_gini = (n_left as f32 * gini_from_counts(&left_counts, n_left)
                + n_right as f32 * gini_from_counts(&right_counts, n_right))
                / n_total as f32;
            let gain = parent_gini - split_gini;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature_idx, (prev + next) / 2.0));
            }
        }
    }
    best
}

/// Regression tree minimizing weighted squared error, predicting leaf means.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    max_depth: Option<usize>,
    tree: Option<TreeNode<f32>>,
}

impl RegressionTree {
    /// Creates an unfitted tree with no depth limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            tree: None,
        }
    }

    /// Limits tree depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Grows the tree on continuous targets, optionally sample-weighted.
    ///
    /// # Errors
    ///
    /// Returns an error on empty data or a row/target count mismatch.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &[f32], sample_weight: Option<&[f32]>) -> Result<()> {
        if y.is_empty() {
            return Err(VfError::from("Cannot fit on empty data"));
        }
        if x.n_rows() != y.len() {
            return Err(VfError::DimensionMismatch {
                expected: format!("{} targets", x.n_rows()),
                actual: format!("{}", y.len()),
            });
        }
        let weights: Vec<f32> = match sample_weight {
            Some(w) => w.to_vec(),
            None => vec![1.0; y.len()],
        };
        let indices: Vec<usize> = (0..y.len()).collect();
        self.tree = Some(self.build(x, y, &weights, &indices, 0));
        Ok(())
    }

    /// Predicts one value per row.
    ///
    /// # Panics
    ///
    /// Panics if called before `fit`.
    #[must_use]
    pub fn predict(&self, x: &Matrix<f32>) -> Vec<f32> {
        let tree = self.tree.as_ref().expect("Model not fitted");
        (0..x.n_rows()).map(|i| tree.predict_one(x.row(i))).collect()
    }

    fn build(
        &self,
        x: &Matrix<f32>,
        y: &[f32],
        w: &[f32],
        indices: &[usize],
        depth: usize,
    ) -> TreeNode<f32> {
        let leaf_value = weighted_mean(y, w, indices);
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < 2 {
            return TreeNode::Leaf(leaf_value);
        }

        let Some((feature_idx, threshold)) = best_sse_split(x, y, w, indices) else {
            return TreeNode::Leaf(leaf_value);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x.get(i, feature_idx) <= threshold);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, w, &left_idx, depth + 1)),
            right: Box::new(self.build(x, y, w, &right_idx, depth + 1)),
        }
    }
}

impl Default for RegressionTree {
    fn default() -> Self {
        Self::new()
    }
}

fn weighted_mean(y: &[f32], w: &[f32], indices: &[usize]) -> f32 {
    let w_sum: f32 = indices.iter().map(|&i| w[i]).sum();
    if w_sum == 0.0 {
        return 0.0;
    }
    indices.iter().map(|&i| w[i] * y[i]).sum::<f32>() / w_sum
}

/// Best (feature, threshold) by weighted sum of squared errors.
///
/// Uses the identity `SSE = sum(w * y^2) - (sum(w * y))^2 / sum(w)` so each
/// feature needs one sorted sweep.
fn best_sse_split(x: &Matrix<f32>, y: &[f32], w: &[f32], indices: &[usize]) -> Option<(usize, f32)> {
    let total_w: f32 = indices.iter().map(|&i| w[i]).sum();
    let total_wy: f32 = indices.iter().map(|&i| w[i] * y[i]).sum();
    let total_wyy: f32 = indices.iter().map(|&i| w[i] * y[i] * y[i]).sum();
    if total_w == 0.0 {
        return None;
    }
    let parent_sse = total_wyy - total_wy * total_wy / total_w;

    let mut best: Option<(usize, f32)> = None;
    let mut best_gain = 1e-12f32;

    for feature_idx in 0..x.n_cols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| x.get(a, feature_idx).total_cmp(&x.get(b, feature_idx)));

        let mut left_w = 0.0f32;
        let mut left_wy = 0.0f32;
        let mut left_wyy = 0.0f32;
        for split_at in 1..order.len() {
            let moved = order[split_at - 1];
            left_w += w[moved];
            left_wy += w[moved] * y[moved];
            left_wyy += w[moved] * y[moved] * y[moved];

            let prev = x.get(order[split_at - 1], feature_idx);
            let next = x.get(order[split_at], feature_idx);
            if prev == next {
                continue;
            }

            let right_w = total_w - left_w;
            if left_w <= 0.0 || right_w <= 0.0 {
                continue;
            }
            let right_wy = total_wy - left_wy;
            let right_wyy = total_wyy - left_wyy;

            let left_sse = left_wyy - left_wy * left_wy / left_w;
            let right_sse = right_wyy - right_wy * right_wy / right_w;
            let gain = parent_sse - (left_sse + right_sse);
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature_idx, (prev + next) / 2.0));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_free_data() -> (Matrix<f32>, Vec<u32>) {
        // Separable with two axis-aligned splits.
        let x = Matrix::from_vec(
            6,
            2,
            vec![1.0, 1.0, 1.5, 0.5, 2.0, 1.0, 5.0, 5.0, 5.5, 4.5, 6.0, 5.0],
        )
        .expect("valid dims");
        let y = vec![0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn test_classifier_fits_separable_data() {
        let (x, y) = xor_free_data();
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).expect("fit");
        assert_eq!(tree.predict(&x), y);
    }

    #[test]
    fn test_stump_depth_one() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 8.0, 9.0]).expect("valid dims");
        let y = vec![0, 0, 1, 1];
        let mut stump = DecisionTreeClassifier::new().with_max_depth(1);
        stump.fit(&x, &y).expect("fit");
        assert_eq!(stump.predict(&x), y);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).expect("valid dims");
        let y = vec![7, 7, 7];
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).expect("fit");
        assert_eq!(tree.predict(&x), vec![7, 7, 7]);
    }

    #[test]
    fn test_constant_features_fall_back_to_majority() {
        let x = Matrix::from_vec(4, 1, vec![1.0; 4]).expect("valid dims");
        let y = vec![0, 1, 1, 1];
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).expect("fit");
        assert_eq!(tree.predict(&x), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_empty_data_rejected() {
        let x = Matrix::from_vec(0, 1, vec![]).expect("valid dims");
        let mut tree = DecisionTreeClassifier::new();
        assert!(tree.fit(&x, &[]).is_err());
    }

    #[test]
    fn test_regression_tree_leaf_means() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 8.0, 9.0]).expect("valid dims");
        let y = vec![0.0, 0.2, 1.0, 1.2];
        let mut tree = RegressionTree::new().with_max_depth(1);
        tree.fit(&x, &y, None).expect("fit");

        let pred = tree.predict(&x);
        assert!((pred[0] - 0.1).abs() < 1e-5);
        assert!((pred[1] - 0.1).abs() < 1e-5);
        assert!((pred[2] - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_regression_tree_respects_weights() {
        // One heavy sample dominates its leaf mean.
        let x = Matrix::from_vec(3, 1, vec![1.0, 1.5, 9.0]).expect("valid dims");
        let y = vec![0.0, 1.0, 5.0];
        let mut tree = RegressionTree::new().with_max_depth(1);
        tree.fit(&x, &y, Some(&[3.0, 1.0, 1.0])).expect("fit");

        let pred = tree.predict(&x);
        // Left leaf mean: (3*0 + 1*1) / 4 = 0.25.
        assert!((pred[0] - 0.25).abs() < 1e-5);
        assert!((pred[2] - 5.0).abs() < 1e-5);
    }
}
