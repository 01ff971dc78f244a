//! Data partitioning utilities: stratified holdout splits, stratified k-fold
//! cross-validation, and inverse-frequency sample weights.
//!
//! All randomness flows through caller-provided seeds or RNGs; nothing here
//! touches global random state.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Splits sample indices into train and test sets, stratified by `strata`.
///
/// Each stratum is shuffled independently and `round(n * test_fraction)` of
/// its samples go to the test side, so the test set preserves stratum
/// proportions. Strata too small to contribute a test sample stay entirely in
/// the training side.
///
/// Returns `(train_indices, test_indices)`.
pub fn stratified_train_test_split<R: Rng>(
    strata: &[u32],
    test_fraction: f32,
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, &stratum) in strata.iter().enumerate() {
        groups.entry(stratum).or_default().push(i);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for indices in groups.values_mut() {
        indices.shuffle(rng);
        let n_test = (indices.len() as f32 * test_fraction).round() as usize;
        let n_test = n_test.min(indices.len());
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Stratified K-Fold cross-validator.
///
/// Maintains approximate class distribution in each fold by splitting each
/// class separately and combining the splits. Iteration over classes is in
/// label order, so a fixed random state yields identical folds across runs
/// and threads.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    /// Create a new Stratified K-Fold cross-validator.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Enable or disable shuffling within each class before folding.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducible shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true; // Shuffle is implied when random_state is set
        self
    }

    /// Generate stratified train/test indices for each fold.
    ///
    /// Returns a vector of (train_indices, test_indices) tuples, one per
    /// fold.
    #[must_use]
    pub fn split(&self, y: &[u32]) -> Vec<(Vec<usize>, Vec<usize>)> {
        let n_samples = y.len();

        // Group indices by class label, in label order.
        let mut class_indices: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label).or_default().push(i);
        }

        if self.shuffle {
            let seed = self.random_state.unwrap_or_else(rand::random);
            let mut rng = StdRng::seed_from_u64(seed);
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Distribute each class across folds.
        let mut fold_indices: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for indices in class_indices.values() {
            let class_size = indices.len();
            let fold_size = class_size / self.n_splits;
            let remainder = class_size % self.n_splits;

            let mut start = 0;
            for (i, fold) in fold_indices.iter_mut().enumerate() {
                let current_size = if i < remainder {
                    fold_size + 1
                } else {
                    fold_size
                };
                let end = start + current_size;
                fold.extend_from_slice(&indices[start..end]);
                start = end;
            }
        }

        let mut result = Vec::with_capacity(self.n_splits);
        for i in 0..self.n_splits {
            let test_indices = fold_indices[i].clone();
            let mut train_indices = Vec::with_capacity(n_samples - test_indices.len());
            for (j, fold) in fold_indices.iter().enumerate() {
                if i != j {
                    train_indices.extend_from_slice(fold);
                }
            }
            result.push((train_indices, test_indices));
        }
        result
    }
}

/// Inverse-class-frequency sample weights: `n_samples / count(class)`.
///
/// Samples of rare classes weigh more, so every class contributes equally to
/// a weighted fitting objective.
#[must_use]
pub fn sample_weights(y: &[u32]) -> Vec<f32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &label in y {
        *counts.entry(label).or_default() += 1;
    }
    let total = y.len() as f32;
    y.iter().map(|label| total / counts[label] as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preserves_proportions() {
        // 40 of class 0, 20 of class 1, 30% test.
        let strata: Vec<u32> = (0..60).map(|i| u32::from(i >= 40)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let (train, test) = stratified_train_test_split(&strata, 0.3, &mut rng);

        assert_eq!(train.len() + test.len(), 60);
        let test_class1 = test.iter().filter(|&&i| strata[i] == 1).count();
        assert_eq!(test.len(), 18);
        assert_eq!(test_class1, 6);
    }

    #[test]
    fn test_split_is_a_partition() {
        let strata = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0];
        let mut rng = StdRng::seed_from_u64(3);
        let (train, test) = stratified_train_test_split(&strata, 0.3, &mut rng);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_seeded_reproducibility() {
        let strata: Vec<u32> = (0..50).map(|i| i % 3).collect();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        assert_eq!(
            stratified_train_test_split(&strata, 0.3, &mut rng_a),
            stratified_train_test_split(&strata, 0.3, &mut rng_b)
        );
    }

    #[test]
    fn test_split_tiny_stratum_stays_in_train() {
        // One sample of class 9: round(1 * 0.3) == 0, so it trains.
        let strata = [0, 0, 0, 0, 0, 0, 0, 0, 0, 9];
        let mut rng = StdRng::seed_from_u64(1);
        let (train, _test) = stratified_train_test_split(&strata, 0.3, &mut rng);
        assert!(train.contains(&9));
    }

    #[test]
    fn test_stratified_kfold_covers_all_samples() {
        let y = [0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
        let folds = StratifiedKFold::new(3).split(&y);
        assert_eq!(folds.len(), 3);

        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, test)| test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 12);
            // Each fold holds both classes.
            assert!(test.iter().any(|&i| y[i] == 0));
            assert!(test.iter().any(|&i| y[i] == 1));
        }
    }

    #[test]
    fn test_stratified_kfold_seeded_reproducibility() {
        let y: Vec<u32> = (0..30).map(|i| i % 2).collect();
        let a = StratifiedKFold::new(5).with_random_state(11).split(&y);
        let b = StratifiedKFold::new(5).with_random_state(11).split(&y);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_weights_inverse_frequency() {
        let y = [0, 0, 0, 1];
        let w = sample_weights(&y);
        assert_eq!(w, vec![4.0 / 3.0, 4.0 / 3.0, 4.0 / 3.0, 4.0]);
    }

    #[test]
    fn test_sample_weights_balanced_classes_uniform() {
        let y = [0, 1, 0, 1];
        assert_eq!(sample_weights(&y), vec![2.0; 4]);
    }
}
