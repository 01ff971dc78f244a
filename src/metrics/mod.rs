//! Evaluation metrics for classifier runs.
//!
//! Includes confusion-matrix-derived binary and one-vs-rest results,
//! ROC-based sensitivity at fixed specificity operating points, and the
//! scoring functions used by cross-validated hyperparameter search.

pub mod classification;
pub mod scorer;
pub mod threshold;

pub use classification::{BinaryClassificationResult, MultiClassificationResult};
pub use scorer::Scorer;
pub use threshold::{RocCurve, FPR_TARGETS};
