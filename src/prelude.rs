//! Convenient re-exports for common usage.
//!
//! ```
//! use vfeval::prelude::*;
//! ```

pub use crate::data::{Dataset, LabeledDataset, SegmentInfo};
pub use crate::error::{Result, VfError};
pub use crate::eval::{EvaluationHarness, HarnessConfig};
pub use crate::labels::LabelScheme;
pub use crate::metrics::{BinaryClassificationResult, MultiClassificationResult, RocCurve, Scorer};
pub use crate::model_selection::StratifiedKFold;
pub use crate::models::{Model, ModelKind};
pub use crate::preprocessing::StandardScaler;
pub use crate::primitives::{Matrix, Vector};
pub use crate::search::{GridSearch, ParamGrid, ParamValue};
pub use crate::traits::{Classifier, Transformer};
