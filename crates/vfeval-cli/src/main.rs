//! vfeval - shockable-rhythm classifier evaluation CLI
//!
//! Usage:
//!   vfeval -m random_forest -i features.json -o report.csv
//!   vfeval -m svc -i features.json -o report.csv -l 0 -t 10 -b
//!   vfeval -m mlp1 -i features.json -o report.csv --seed 42 -f 0 2 5

use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use vfeval::prelude::*;

mod error;

use error::{CliError, Result};

/// Evaluate a shockable-rhythm classifier over repeated stratified trials.
#[derive(Parser)]
#[command(name = "vfeval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Classifier family to evaluate
    #[arg(short, long, value_parser = ModelKind::from_str)]
    model: ModelKind,

    /// Input dataset (JSON feature artifact)
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV report
    #[arg(short, long)]
    output: PathBuf,

    /// Search worker count; non-positive means all cores but one
    #[arg(short, long, default_value_t = -1)]
    jobs: i64,

    /// Number of independent trials
    #[arg(short = 't', long = "iter", default_value_t = 1)]
    iter: usize,

    /// Scorer ranking hyperparameter candidates
    #[arg(short, long, default_value = "f1_weighted", value_parser = Scorer::from_str)]
    scorer: Scorer,

    /// Cross-validation folds
    #[arg(short, long = "cv-fold", default_value_t = 5)]
    cv_fold: usize,

    /// Test partition size in percent
    #[arg(short = 'p', long = "test-percent", default_value_t = 30)]
    test_percent: u32,

    /// Balance class weighting during fitting
    #[arg(short, long = "balanced-weight")]
    balanced_weight: bool,

    /// Restrict to these feature columns
    #[arg(short, long, num_args = 1..)]
    features: Option<Vec<usize>>,

    /// Labeling scheme: aha, or 0 (VF), 1 (VF+VFL), 2 (VF+VFL+VT), 3 (multi-class)
    #[arg(short, long = "label-method", default_value = "aha", value_parser = LabelScheme::from_str)]
    label_method: LabelScheme,

    /// Master seed; omitted means one drawn from OS entropy
    #[arg(long)]
    seed: Option<u64>,
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.input.is_file() {
        return Err(CliError::FileNotFound(cli.input.clone()));
    }
    if cli.iter == 0 {
        return Err(CliError::InvalidArgument(
            "--iter must be at least 1".to_string(),
        ));
    }
    if cli.cv_fold < 2 {
        return Err(CliError::InvalidArgument(
            "--cv-fold must be at least 2".to_string(),
        ));
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "run seed");

    let mut dataset = Dataset::from_json_file(&cli.input)?;
    if let Some(features) = &cli.features {
        dataset = dataset.with_feature_subset(features)?;
    }
    tracing::info!(
        samples = dataset.n_samples(),
        features = dataset.features().n_cols(),
        "dataset loaded"
    );
    let data = dataset.labeled(cli.label_method);

    let config = HarnessConfig {
        scheme: cli.label_method,
        n_trials: cli.iter,
        test_percent: cli.test_percent,
        cv_folds: cli.cv_fold,
        scorer: cli.scorer,
        jobs: vfeval::search::resolve_jobs(cli.jobs),
        balanced_weight: cli.balanced_weight,
        seed,
    };

    let out = BufWriter::new(File::create(&cli.output)?);
    EvaluationHarness::new(config).run(&data, cli.model, out)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_short_flags() {
        let cli = Cli::parse_from([
            "vfeval", "-m", "random_forest", "-i", "in.json", "-o", "out.csv", "-t", "5", "-l",
            "0", "-b",
        ]);
        assert_eq!(cli.model, ModelKind::RandomForest);
        assert_eq!(cli.iter, 5);
        assert_eq!(cli.label_method, LabelScheme::BinaryVf);
        assert!(cli.balanced_weight);
        assert_eq!(cli.jobs, -1);
        assert_eq!(cli.cv_fold, 5);
        assert_eq!(cli.test_percent, 30);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_model() {
        assert!(Cli::try_parse_from([
            "vfeval", "-m", "perceptron", "-i", "in.json", "-o", "out.csv"
        ])
        .is_err());
    }

    #[test]
    fn test_run_writes_report() {
        use std::io::Write as _;

        let mut input = tempfile::NamedTempFile::new().expect("temp file");
        let mut features = Vec::new();
        let mut segments = Vec::new();
        for i in 0..15 {
            let jitter = (i % 5) as f64 * 0.1;
            features.push(format!("[{}]", -2.0 - jitter));
            segments.push(r#"{"rhythm": "(VF", "amplitude": 0.4}"#.to_string());
            features.push(format!("[{}]", 2.0 + jitter));
            segments.push(r#"{"rhythm": "(N", "amplitude": 0.9, "heart_rate": 70.0}"#.to_string());
        }
        write!(
            input,
            r#"{{"features": [{}], "segments": [{}]}}"#,
            features.join(", "),
            segments.join(", ")
        )
        .expect("write artifact");

        let output = tempfile::NamedTempFile::new().expect("temp file");
        let cli = Cli::parse_from([
            "vfeval",
            "-m",
            "logistic_regression",
            "-i",
            input.path().to_str().expect("utf-8 path"),
            "-o",
            output.path().to_str().expect("utf-8 path"),
            "-l",
            "0",
            "-c",
            "3",
            "-j",
            "1",
            "--seed",
            "7",
        ]);
        run(&cli).expect("run");

        let report = std::fs::read_to_string(output.path()).expect("report written");
        let lines: Vec<&str> = report.lines().collect();
        assert!(lines[0].starts_with("iter,Se,Sp"));
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("average,"));
    }

    #[test]
    fn test_cli_feature_list_and_seed() {
        let cli = Cli::parse_from([
            "vfeval",
            "-m",
            "svc",
            "-i",
            "in.json",
            "-o",
            "out.csv",
            "-f",
            "0",
            "2",
            "5",
            "--seed",
            "42",
        ]);
        assert_eq!(cli.features, Some(vec![0, 2, 5]));
        assert_eq!(cli.seed, Some(42));
    }
}
