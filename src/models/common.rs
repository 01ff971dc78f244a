//! Shared numeric helpers for the classifier backends.

use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Sorted distinct labels.
pub(crate) fn class_set(y: &[u32]) -> Vec<u32> {
    y.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Inverse-frequency class weights: `n_samples / (n_classes * count)`.
pub(crate) fn balanced_class_weights(y: &[u32], classes: &[u32]) -> BTreeMap<u32, f32> {
    let mut counts: BTreeMap<u32, usize> = classes.iter().map(|&c| (c, 0)).collect();
    for &label in y {
        *counts.entry(label).or_default() += 1;
    }
    let n = y.len() as f32;
    let k = classes.len() as f32;
    counts
        .into_iter()
        .map(|(label, count)| (label, n / (k * count.max(1) as f32)))
        .collect()
}

/// Logistic function, clamped to avoid overflow in `exp`.
pub(crate) fn sigmoid(z: f32) -> f32 {
    let z = z.clamp(-30.0, 30.0);
    1.0 / (1.0 + (-z).exp())
}

/// Draws `n` indices with replacement, each index weighted by `weights`.
///
/// Weights need not be normalized; they must be non-negative with a positive
/// sum.
pub(crate) fn weighted_sample_indices<R: Rng>(weights: &[f32], n: usize, rng: &mut R) -> Vec<usize> {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0f32;
    for &w in weights {
        total += w;
        cumulative.push(total);
    }

    (0..n)
        .map(|_| {
            let draw = rng.gen::<f32>() * total;
            cumulative.partition_point(|&c| c < draw).min(weights.len() - 1)
        })
        .collect()
}
