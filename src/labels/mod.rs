//! Rhythm labeling engine.
//!
//! Converts raw clinical annotations (rhythm code, waveform amplitude,
//! heart rate) into integer labels under one of several schemes, from the
//! three-way AHA triage used by automated external defibrillators down to
//! simple binary VF detection.

use crate::data::SegmentInfo;
use crate::error::VfError;
use std::fmt;
use std::str::FromStr;

/// Label value for rhythms that must not be shocked.
pub const NON_SHOCKABLE: u32 = 0;
/// Label value for shockable rhythms (coarse VF, rapid VT, VFL).
pub const SHOCKABLE: u32 = 1;
/// Label value for borderline rhythms (fine VF, slow VT).
pub const INTERMEDIATE: u32 = 2;

/// The three AHA triage classes, in label order.
pub const AHA_CLASSES: [u32; 3] = [NON_SHOCKABLE, SHOCKABLE, INTERMEDIATE];

/// Human-readable names for [`AHA_CLASSES`], used as report column suffixes.
pub const AHA_CLASS_NAMES: [&str; 3] = ["non-shockable", "shockable", "intermediate"];

const MULTICLASS3_CLASSES: [u32; 3] = [0, 1, 2];
const MULTICLASS3_CLASS_NAMES: [&str; 3] = ["other", "VF", "VFL/VT"];
const BINARY_CLASSES: [u32; 2] = [0, 1];

/// Rapid VT threshold in BPM.
///
/// Reference: Nishiyama et al. 2015. Diagnosis of Automated External
/// Defibrillators (JAHA).
pub const RAPID_VT_RATE: f32 = 180.0;

/// Coarse VF amplitude threshold in mV, as suggested by AHA recommendations
/// for AEDs. The comparison is strict: a segment at exactly 0.2 mV is fine VF.
pub const COARSE_VF_THRESHOLD: f32 = 0.2;

/// Selects which labeling rule applies to a dataset.
///
/// Fixed for the duration of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScheme {
    /// Three-way AHA triage: shockable / intermediate / non-shockable.
    Aha,
    /// Binary: VF vs. everything else.
    BinaryVf,
    /// Binary: VF or VFL vs. everything else.
    BinaryVfVfl,
    /// Binary: VF, VFL or VT vs. everything else.
    BinaryVfVflVt,
    /// Multi-class: others (0), VF (1), VFL/VT (2).
    Multiclass3,
}

impl LabelScheme {
    /// The finite set of labels this scheme can produce, in class order.
    #[must_use]
    pub fn classes(&self) -> &'static [u32] {
        match self {
            LabelScheme::Aha => &AHA_CLASSES,
            LabelScheme::Multiclass3 => &MULTICLASS3_CLASSES,
            _ => &BINARY_CLASSES,
        }
    }

    /// Class names matching [`classes`](Self::classes), for report columns.
    ///
    /// # Panics
    ///
    /// Panics for binary schemes, whose report columns are fixed and not
    /// per-class.
    #[must_use]
    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            LabelScheme::Aha => &AHA_CLASS_NAMES,
            LabelScheme::Multiclass3 => &MULTICLASS3_CLASS_NAMES,
            _ => panic!("binary schemes have no per-class report columns"),
        }
    }

    /// True for the schemes with more than two classes (`aha`,
    /// `multiclass-3`). These are excluded from the sample-weight fallback
    /// and get per-class report columns.
    #[must_use]
    pub fn is_multiclass(&self) -> bool {
        matches!(self, LabelScheme::Aha | LabelScheme::Multiclass3)
    }
}

impl FromStr for LabelScheme {
    type Err = VfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aha" => Ok(LabelScheme::Aha),
            "0" => Ok(LabelScheme::BinaryVf),
            "1" => Ok(LabelScheme::BinaryVfVfl),
            "2" => Ok(LabelScheme::BinaryVfVflVt),
            "3" => Ok(LabelScheme::Multiclass3),
            other => Err(VfError::InvalidHyperparameter {
                param: "label-method".to_string(),
                value: other.to_string(),
                constraint: "one of aha, 0, 1, 2, 3".to_string(),
            }),
        }
    }
}

impl fmt::Display for LabelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelScheme::Aha => "aha",
            LabelScheme::BinaryVf => "0",
            LabelScheme::BinaryVfVfl => "1",
            LabelScheme::BinaryVfVflVt => "2",
            LabelScheme::Multiclass3 => "3",
        };
        write!(f, "{name}")
    }
}

/// Labels one annotated segment under the given scheme.
///
/// Total, deterministic and side-effect-free: every segment maps to exactly
/// one label in [`LabelScheme::classes`].
///
/// Under `aha`:
/// - `(VF` is SHOCKABLE when its peak-to-peak amplitude exceeds
///   [`COARSE_VF_THRESHOLD`] (coarse VF), INTERMEDIATE otherwise (fine VF);
/// - `(VT` is SHOCKABLE at or above [`RAPID_VT_RATE`] BPM, INTERMEDIATE for
///   a defined slower rate, NON_SHOCKABLE when the rate is not computable;
/// - `(VFL` is always SHOCKABLE (ventricular flutter is inherently rapid);
/// - anything else is NON_SHOCKABLE.
///
/// # Examples
///
/// ```
/// use vfeval::data::SegmentInfo;
/// use vfeval::labels::{label, LabelScheme, INTERMEDIATE, SHOCKABLE};
///
/// let coarse = SegmentInfo::new("(VF", 0.3, 0.0);
/// let fine = SegmentInfo::new("(VF", 0.2, 0.0);
/// assert_eq!(label(&coarse, LabelScheme::Aha), SHOCKABLE);
/// assert_eq!(label(&fine, LabelScheme::Aha), INTERMEDIATE);
/// ```
#[must_use]
pub fn label(info: &SegmentInfo, scheme: LabelScheme) -> u32 {
    let rhythm = info.rhythm();
    match scheme {
        LabelScheme::Aha => match rhythm {
            "(VF" => {
                if info.amplitude() > COARSE_VF_THRESHOLD {
                    SHOCKABLE
                } else {
                    INTERMEDIATE
                }
            }
            "(VT" => {
                let hr = info.heart_rate();
                if hr >= RAPID_VT_RATE {
                    SHOCKABLE
                } else if hr > 0.0 {
                    INTERMEDIATE
                } else {
                    NON_SHOCKABLE
                }
            }
            "(VFL" => SHOCKABLE,
            _ => NON_SHOCKABLE,
        },
        LabelScheme::BinaryVf => u32::from(rhythm == "(VF"),
        LabelScheme::BinaryVfVfl => u32::from(matches!(rhythm, "(VF" | "(VFL")),
        LabelScheme::BinaryVfVflVt => u32::from(matches!(rhythm, "(VF" | "(VFL" | "(VT")),
        LabelScheme::Multiclass3 => match rhythm {
            "(VF" => 1,
            // VFL is VF with a rate above 240 BPM, treated as rapid VT.
            "(VT" | "(VFL" => 2,
            _ => 0,
        },
    }
}

/// Labels a whole segment sequence.
///
/// Applied once over the full dataset before any sampling; the labels are a
/// dataset-wide derived column, never re-derived per trial.
#[must_use]
pub fn make_labels(segments: &[SegmentInfo], scheme: LabelScheme) -> Vec<u32> {
    segments.iter().map(|info| label(info, scheme)).collect()
}
