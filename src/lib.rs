//! Vfeval: evaluation harness for shockable-rhythm ECG classifiers.
//!
//! Vfeval labels ECG segments from their clinical annotations, then runs
//! repeated stratified trials of a chosen classifier family, tuning
//! hyperparameters by cross-validated grid search and reporting per-trial
//! metrics as CSV.
//!
//! # Quick Start
//!
//! ```
//! use vfeval::prelude::*;
//!
//! // Two annotated segments and their features.
//! let features = Matrix::from_vec(2, 1, vec![0.4, 2.1]).unwrap();
//! let segments = vec![
//!     SegmentInfo::new("(VF", 0.5, 0.0),
//!     SegmentInfo::new("(N", 0.8, 72.0),
//! ];
//!
//! let data = Dataset::from_parts(features, segments)
//!     .unwrap()
//!     .labeled(LabelScheme::BinaryVf);
//! assert_eq!(data.labels(), &[1, 0]);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`data`]: Dataset loading and segment annotations
//! - [`labels`]: Rhythm labeling schemes (AHA and binary variants)
//! - [`models`]: Classifier backends and their tuning grids
//! - [`metrics`]: Evaluation metrics and ROC operating points
//! - [`model_selection`]: Stratified splitting and k-fold cross-validation
//! - [`preprocessing`]: Data transformers (standard scaler)
//! - [`search`]: Cross-validated hyperparameter grid search
//! - [`eval`]: The trial harness and CSV reporting

pub mod data;
pub mod error;
pub mod eval;
pub mod labels;
pub mod metrics;
pub mod model_selection;
pub mod models;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod search;
pub mod traits;

pub use error::{Result, VfError};
