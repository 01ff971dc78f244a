//! Dataset loading and per-segment metadata.
//!
//! The feature extractor (an external tool) produces a JSON artifact with a
//! feature matrix and one [`SegmentInfo`] record per row:
//!
//! ```json
//! {
//!   "features": [[0.1, 2.3], [0.2, 1.9]],
//!   "segments": [
//!     {"rhythm": "(VF", "amplitude": 0.31, "heart_rate": 0.0},
//!     {"rhythm": "(N",  "amplitude": 0.80, "heart_rate": 72.5}
//!   ]
//! }
//! ```
//!
//! The metadata is read-only to the core: labeling derives from it, nothing
//! writes back.

use crate::error::{Result, VfError};
use crate::labels::{self, LabelScheme};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Immutable clinical annotation for one ECG segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInfo {
    rhythm: String,
    amplitude: f32,
    /// Beats per minute; 0.0 means the rate could not be computed.
    #[serde(default)]
    heart_rate: f32,
}

impl SegmentInfo {
    /// Creates a segment annotation.
    #[must_use]
    pub fn new(rhythm: &str, amplitude: f32, heart_rate: f32) -> Self {
        Self {
            rhythm: rhythm.to_string(),
            amplitude,
            heart_rate,
        }
    }

    /// Categorical rhythm annotation code (e.g. `"(VF"`, `"(VT"`).
    #[must_use]
    pub fn rhythm(&self) -> &str {
        &self.rhythm
    }

    /// Peak-to-peak waveform amplitude in mV.
    #[must_use]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Heart rate in BPM; 0.0 when not computable.
    #[must_use]
    pub fn heart_rate(&self) -> f32 {
        self.heart_rate
    }
}

#[derive(Deserialize)]
struct DatasetFile {
    features: Vec<Vec<f32>>,
    segments: Vec<SegmentInfo>,
}

/// A feature matrix paired index-for-index with segment annotations.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Matrix<f32>,
    segments: Vec<SegmentInfo>,
}

impl Dataset {
    /// Builds a dataset from already-loaded parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix row count and segment count differ.
    pub fn from_parts(features: Matrix<f32>, segments: Vec<SegmentInfo>) -> Result<Self> {
        if features.n_rows() != segments.len() {
            return Err(VfError::DimensionMismatch {
                expected: format!("{} feature rows", segments.len()),
                actual: format!("{}", features.n_rows()),
            });
        }
        Ok(Self { features, segments })
    }

    /// Loads the JSON dataset artifact produced by the feature extractor.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, malformed JSON, ragged feature rows,
    /// or a feature/segment count mismatch.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let file: DatasetFile = serde_json::from_str(&text)?;

        let n_rows = file.features.len();
        let n_cols = file.features.first().map_or(0, Vec::len);
        if file.features.iter().any(|row| row.len() != n_cols) {
            return Err(VfError::InvalidDataset {
                message: "feature rows have inconsistent lengths".to_string(),
            });
        }

        let data: Vec<f32> = file.features.into_iter().flatten().collect();
        let features = Matrix::from_vec(n_rows, n_cols, data)
            .map_err(|e| VfError::InvalidDataset {
                message: e.to_string(),
            })?;
        Self::from_parts(features, file.segments)
    }

    /// Restricts the feature matrix to the given column subset, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a column index is out of range.
    pub fn with_feature_subset(mut self, columns: &[usize]) -> Result<Self> {
        self.features = self
            .features
            .select_columns(columns)
            .map_err(|e| VfError::InvalidDataset {
                message: e.to_string(),
            })?;
        Ok(self)
    }

    /// Number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.segments.len()
    }

    /// The feature matrix.
    #[must_use]
    pub fn features(&self) -> &Matrix<f32> {
        &self.features
    }

    /// The segment annotations.
    #[must_use]
    pub fn segments(&self) -> &[SegmentInfo] {
        &self.segments
    }

    /// Derives labels under `scheme` and encodes rhythm types, consuming the
    /// dataset.
    #[must_use]
    pub fn labeled(self, scheme: LabelScheme) -> LabeledDataset {
        let labels = labels::make_labels(&self.segments, scheme);
        let (rhythm_ids, rhythm_names) = encode_rhythms(&self.segments);
        LabeledDataset {
            features: self.features,
            segments: self.segments,
            labels,
            rhythm_ids,
            rhythm_names,
            scheme,
        }
    }
}

/// Encodes rhythm annotation strings as dense integer ids.
///
/// Ids follow the lexicographic order of the distinct rhythm names, so the
/// encoding is deterministic for a given dataset.
#[must_use]
pub fn encode_rhythms(segments: &[SegmentInfo]) -> (Vec<u32>, Vec<String>) {
    let names: Vec<String> = segments
        .iter()
        .map(|s| s.rhythm().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let ids = segments
        .iter()
        .map(|s| {
            names
                .binary_search_by(|name| name.as_str().cmp(s.rhythm()))
                .expect("every rhythm is in the encoding") as u32
        })
        .collect();
    (ids, names)
}

/// A dataset with its derived label column and rhythm encoding.
///
/// Invariant: the feature matrix row count, segment count, label count and
/// rhythm-id count are always equal.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    features: Matrix<f32>,
    segments: Vec<SegmentInfo>,
    labels: Vec<u32>,
    rhythm_ids: Vec<u32>,
    rhythm_names: Vec<String>,
    scheme: LabelScheme,
}

impl LabeledDataset {
    /// Number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// The feature matrix.
    #[must_use]
    pub fn features(&self) -> &Matrix<f32> {
        &self.features
    }

    /// The segment annotations.
    #[must_use]
    pub fn segments(&self) -> &[SegmentInfo] {
        &self.segments
    }

    /// The derived label column.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Encoded rhythm type per sample.
    #[must_use]
    pub fn rhythm_ids(&self) -> &[u32] {
        &self.rhythm_ids
    }

    /// Distinct rhythm names, in id order.
    #[must_use]
    pub fn rhythm_names(&self) -> &[String] {
        &self.rhythm_names
    }

    /// The scheme the labels were derived under.
    #[must_use]
    pub fn scheme(&self) -> LabelScheme {
        self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tiny_dataset() -> Dataset {
        let features =
            Matrix::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("valid dims");
        let segments = vec![
            SegmentInfo::new("(VF", 0.3, 0.0),
            SegmentInfo::new("(N", 0.8, 70.0),
            SegmentInfo::new("(VF", 0.1, 0.0),
        ];
        Dataset::from_parts(features, segments).expect("matching lengths")
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let features = Matrix::from_vec(2, 1, vec![1.0, 2.0]).expect("valid dims");
        let segments = vec![SegmentInfo::new("(N", 0.5, 60.0)];
        assert!(Dataset::from_parts(features, segments).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"features": [[0.1, 2.0], [0.4, 1.0]],
                "segments": [{{"rhythm": "(VF", "amplitude": 0.3}},
                             {{"rhythm": "(N", "amplitude": 0.9, "heart_rate": 72.0}}]}}"#
        )
        .expect("write");

        let ds = Dataset::from_json_file(file.path()).expect("parse");
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.features().shape(), (2, 2));
        assert_eq!(ds.segments()[0].rhythm(), "(VF");
        // heart_rate defaults to "not computable" when absent.
        assert_eq!(ds.segments()[0].heart_rate(), 0.0);
        assert_eq!(ds.segments()[1].heart_rate(), 72.0);
    }

    #[test]
    fn test_from_json_ragged_rows_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"features": [[0.1, 2.0], [0.4]],
                "segments": [{{"rhythm": "(VF", "amplitude": 0.3}},
                             {{"rhythm": "(N", "amplitude": 0.9}}]}}"#
        )
        .expect("write");
        assert!(Dataset::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_feature_subset() {
        let ds = tiny_dataset().with_feature_subset(&[1]).expect("in range");
        assert_eq!(ds.features().shape(), (3, 1));
        assert_eq!(ds.features().get(0, 0), 2.0);
    }

    #[test]
    fn test_encode_rhythms_sorted_and_stable() {
        let ds = tiny_dataset();
        let (ids, names) = encode_rhythms(ds.segments());
        assert_eq!(names, vec!["(N".to_string(), "(VF".to_string()]);
        assert_eq!(ids, vec![1, 0, 1]);
    }

    #[test]
    fn test_labeled_dataset_invariant() {
        let labeled = tiny_dataset().labeled(LabelScheme::BinaryVf);
        assert_eq!(labeled.n_samples(), 3);
        assert_eq!(labeled.features().n_rows(), 3);
        assert_eq!(labeled.labels(), &[1, 0, 1]);
        assert_eq!(labeled.rhythm_ids().len(), 3);
    }
}
