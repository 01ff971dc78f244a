//! End-to-end evaluation runs through the public API: JSON artifact in,
//! CSV report out.

use std::io::Write as _;
use vfeval::prelude::*;

/// A JSON artifact with clearly separable VF and sinus-rhythm clusters.
fn write_artifact(n_per_class: usize) -> tempfile::NamedTempFile {
    let mut features = Vec::new();
    let mut segments = Vec::new();
    for i in 0..n_per_class {
        let jitter = (i % 9) as f64 * 0.04;
        features.push(format!("[{}, {}]", -1.5 - jitter, 0.2));
        segments.push(r#"{"rhythm": "(VF", "amplitude": 0.45, "heart_rate": 0.0}"#.to_string());
        features.push(format!("[{}, {}]", 1.5 + jitter, 0.2));
        segments.push(r#"{"rhythm": "(N", "amplitude": 0.9, "heart_rate": 74.0}"#.to_string());
    }

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"features": [{}], "segments": [{}]}}"#,
        features.join(", "),
        segments.join(", ")
    )
    .expect("write artifact");
    file
}

fn config(scheme: LabelScheme, n_trials: usize, seed: u64) -> HarnessConfig {
    HarnessConfig {
        scheme,
        n_trials,
        test_percent: 30,
        cv_folds: 3,
        scorer: Scorer::F1Weighted,
        jobs: 2,
        balanced_weight: false,
        seed,
    }
}

#[test]
fn binary_report_from_json_artifact() {
    let artifact = write_artifact(25);
    let data = Dataset::from_json_file(artifact.path())
        .expect("load")
        .labeled(LabelScheme::BinaryVf);
    assert_eq!(data.n_samples(), 50);

    let mut out = Vec::new();
    EvaluationHarness::new(config(LabelScheme::BinaryVf, 3, 77))
        .run(&data, ModelKind::LogisticRegression, &mut out)
        .expect("run");

    let text = String::from_utf8(out).expect("utf-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);

    let header: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(header[0], "iter");
    assert!(header.contains(&"Se(Sp95)"));
    assert_eq!(*header.last().expect("non-empty"), "C");

    // Trial rows carry their index; the last row is the average.
    for (trial, line) in lines[1..4].iter().enumerate() {
        assert!(line.starts_with(&format!("{trial},")));
    }
    assert!(lines[4].starts_with("average,"));

    // Counts sum to the test partition size in every trial: each 25-sample
    // rhythm stratum contributes round(25 * 0.3) = 8 test samples.
    let col = |name: &str| header.iter().position(|&c| c == name).expect("column");
    for line in &lines[1..4] {
        let cells: Vec<&str> = line.split(',').collect();
        let total: u32 = ["TP", "TN", "FP", "FN"]
            .iter()
            .map(|name| cells[col(name)].parse::<u32>().expect("count"))
            .sum();
        assert_eq!(total, 16);
    }
}

#[test]
fn fixed_seed_reproduces_the_report() {
    let artifact = write_artifact(20);
    let data = Dataset::from_json_file(artifact.path())
        .expect("load")
        .labeled(LabelScheme::BinaryVf);

    let mut first = Vec::new();
    let mut second = Vec::new();
    for out in [&mut first, &mut second] {
        EvaluationHarness::new(config(LabelScheme::BinaryVf, 2, 99))
            .run(&data, ModelKind::RandomForest, out)
            .expect("run");
    }
    assert_eq!(first, second);
}

#[test]
fn aha_report_has_per_class_and_per_rhythm_columns() {
    let artifact = write_artifact(20);
    let data = Dataset::from_json_file(artifact.path())
        .expect("load")
        .labeled(LabelScheme::Aha);

    let mut out = Vec::new();
    EvaluationHarness::new(config(LabelScheme::Aha, 1, 5))
        .run(&data, ModelKind::LogisticRegression, &mut out)
        .expect("run");

    let text = String::from_utf8(out).expect("utf-8");
    let header = text.lines().next().expect("header");
    for column in [
        "TPR[non-shockable]",
        "TNR[shockable]",
        "PPV[intermediate]",
        "TPR[(N]",
        "PPV[(VF]",
    ] {
        assert!(header.contains(column), "missing {column}");
    }
    assert!(!header.contains("Se(Sp95)"));
}

#[test]
fn multiclass3_report_uses_per_class_layout() {
    let artifact = write_artifact(20);
    let data = Dataset::from_json_file(artifact.path())
        .expect("load")
        .labeled(LabelScheme::Multiclass3);

    let mut out = Vec::new();
    EvaluationHarness::new(config(LabelScheme::Multiclass3, 1, 31))
        .run(&data, ModelKind::LogisticRegression, &mut out)
        .expect("run");

    let text = String::from_utf8(out).expect("utf-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);

    let header = lines[0];
    for column in ["TPR[other]", "TNR[VF]", "PPV[VFL/VT]", "TPR[(N]", "TNR[(VF]"] {
        assert!(header.contains(column), "missing {column}");
    }
    assert!(!header.contains("Se(Sp95)"));
    assert!(lines[2].starts_with("average,"));
}

#[test]
fn feature_subset_restricts_the_matrix() {
    let artifact = write_artifact(10);
    let dataset = Dataset::from_json_file(artifact.path())
        .expect("load")
        .with_feature_subset(&[0])
        .expect("in range");
    assert_eq!(dataset.features().shape(), (20, 1));
    assert!(dataset.clone().with_feature_subset(&[3]).is_err());
}

#[test]
fn balanced_weighting_still_produces_a_full_report() {
    let artifact = write_artifact(25);
    let data = Dataset::from_json_file(artifact.path())
        .expect("load")
        .labeled(LabelScheme::BinaryVfVfl);

    let mut cfg = config(LabelScheme::BinaryVfVfl, 1, 11);
    cfg.balanced_weight = true;

    let mut out = Vec::new();
    // Gradient boosting has no native class weighting, so this exercises
    // the sample-weight injection path.
    EvaluationHarness::new(cfg)
        .run(&data, ModelKind::GradientBoosting, &mut out)
        .expect("run");

    let text = String::from_utf8(out).expect("utf-8");
    assert_eq!(text.lines().count(), 3);
}
