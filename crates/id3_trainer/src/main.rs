//! ID3 Trainer CLI
//!
//! Deterministic offline trainer for producing reproducible ID3 decision trees.

use anyhow::{bail, Context, Result};
use clap::Parser;
use id3_core::{serde_canon::to_canonical_json, Column, ColumnKind, Dataset, TrainedModel};
use id3_trainer::{sweep_bin_counts, CsvLoader, CsvSchema, Id3Trainer, TrainerConfig};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "id3-train")]
#[command(author = "IPPAN Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic ID3 decision tree trainer", long_about = None)]
struct Args {
    /// Input CSV dataset path (last column is the label)
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for model and hash
    #[arg(short, long, default_value = "models/id3")]
    output: PathBuf,

    /// TOML configuration file; command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum tree depth (unlimited when omitted)
    #[arg(long)]
    depth_limit: Option<usize>,

    /// Number of bins for continuous features
    #[arg(long)]
    bins: Option<usize>,

    /// Use equal-frequency (quantile) bins instead of equal-width bins
    #[arg(long)]
    equal_frequency: bool,

    /// Add unbounded bins below the minimum and above the maximum
    #[arg(long)]
    exterior_bins: bool,

    /// Column schema as name:kind pairs (categorical, nominal, continuous)
    #[arg(long)]
    columns: Option<CsvSchema>,

    /// Input has no header row; columns are named c0..cN
    #[arg(long)]
    no_header: bool,

    /// Sweep bin counts MIN..MAX and keep the most accurate model
    #[arg(long, value_parser = parse_bin_range)]
    sweep: Option<RangeInclusive<usize>>,

    /// Unlabelled CSV to predict with the trained model
    #[arg(long)]
    predict: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_bin_range(raw: &str) -> Result<RangeInclusive<usize>, String> {
    let (min, max) = raw
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX, got `{raw}`"))?;
    let min: usize = min.trim().parse().map_err(|e| format!("invalid MIN: {e}"))?;
    let max: usize = max
        .trim()
        .trim_start_matches('=')
        .parse()
        .map_err(|e| format!("invalid MAX: {e}"))?;
    Ok(min..=max)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrainerConfig::load_from_file(path).context("Failed to load config")?,
        None => TrainerConfig::default(),
    };
    apply_overrides(&args, &mut config);

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(config.logging.with_target)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("ID3 Decision Tree Trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════");

    // Load dataset
    info!("Loading dataset from: {}", args.input.display());
    let dataset = CsvLoader::new()
        .with_headers(!args.no_header)
        .with_schema(args.columns.clone())
        .load_path(&args.input)
        .context("Failed to load dataset")?;

    info!(
        "Loaded {} rows with {} features",
        dataset.n_rows(),
        dataset.n_features()
    );
    log_feature_stats(&dataset);

    let params = &config.training;
    info!("Training configuration:");
    info!("  Depth limit: {:?}", params.depth_limit);
    info!("  Bins: {:?}", params.bin_count);
    info!("  Strategy: {:?}", params.strategy());
    info!("  Exterior bins: {}", params.exterior_bins);
    for (feature, (min, max)) in &params.feature_ranges {
        info!("  Range of {}: [{}, {}]", feature, min, max);
    }

    std::fs::create_dir_all(&args.output).context("Failed to create output directory")?;

    // Train model
    info!("═══════════════════════════════════════════");
    info!("Starting training...");
    let model = match config.sweep.map(|s| s.range()) {
        Some(range) => {
            let report = sweep_bin_counts(&dataset, params, range)?;
            for attempt in &report.attempts {
                info!("  bins={:>3} accuracy={:.4}", attempt.bin_count, attempt.accuracy);
            }
            info!(
                "Best bin count: {} (accuracy {:.4})",
                report.best_bin_count, report.best_accuracy
            );

            let sweep_path = args.output.join("sweep.json");
            let report_json = to_canonical_json(&report).context("Failed to serialize sweep")?;
            std::fs::write(&sweep_path, report_json).context("Failed to write sweep report")?;
            report.model
        }
        None => Id3Trainer::new(params.clone()).train(&dataset)?,
    };

    let accuracy = model.accuracy(&dataset)?;
    info!("Training complete!");
    info!("  Depth: {}", model.depth());
    info!("  Leaves: {}", model.leaf_count());
    info!("  Training accuracy: {:.4}", accuracy);

    let (model_path, hash_path, hash_hex) = write_model(&model, &args.output)?;

    if let Some(path) = &args.predict {
        let predictions_path = args.output.join("predictions.csv");
        write_predictions(&model, path, !args.no_header, &predictions_path)?;
    }

    info!("═══════════════════════════════════════════");
    info!("✓ Training completed successfully");
    info!("  Model: {}", model_path.display());
    info!("  Hash: {} ({})", hash_path.display(), hash_hex);

    Ok(())
}

fn apply_overrides(args: &Args, config: &mut TrainerConfig) {
    let training = &mut config.training;
    if args.depth_limit.is_some() {
        training.depth_limit = args.depth_limit;
    }
    if args.bins.is_some() {
        training.bin_count = args.bins;
    }
    if args.equal_frequency {
        training.equal_frequency_binning = true;
    }
    if args.exterior_bins {
        training.exterior_bins = true;
    }
    if let Some(range) = &args.sweep {
        config.sweep = Some(id3_trainer::SweepConfig {
            min_bins: *range.start(),
            max_bins: *range.end(),
        });
    }
}

fn log_feature_stats(dataset: &Dataset) {
    info!("Feature statistics:");
    for column in dataset.features() {
        match column.kind() {
            ColumnKind::Continuous => {
                let values = column.numeric_values().unwrap_or_default();
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                info!("  {} (continuous): min={}, max={}", column.name(), min, max);
            }
            kind => {
                let mut distinct: Vec<&str> = column
                    .text_values()
                    .unwrap_or_default()
                    .iter()
                    .map(String::as_str)
                    .collect();
                distinct.sort_unstable();
                distinct.dedup();
                info!("  {} ({}): {} distinct values", column.name(), kind, distinct.len());
            }
        }
    }
    if let Some(label) = dataset.label_column().map(Column::name) {
        info!("  Label column: {}", label);
    }
}

/// Save the model as canonical JSON alongside its BLAKE3 hash
fn write_model(model: &TrainedModel, output: &Path) -> Result<(PathBuf, PathBuf, String)> {
    let model_path = output.join("model.json");
    info!("Saving model to: {}", model_path.display());

    let canonical_json = model
        .to_canonical_json()
        .context("Failed to serialize model")?;
    std::fs::write(&model_path, &canonical_json).context("Failed to write model file")?;

    let hash_hex = model.hash_hex().context("Failed to hash model")?;
    let hash_path = output.join("model.hash");
    info!("Saving hash to: {}", hash_path.display());
    std::fs::write(&hash_path, &hash_hex).context("Failed to write hash file")?;

    Ok((model_path, hash_path, hash_hex))
}

fn write_predictions(
    model: &TrainedModel,
    input: &Path,
    has_headers: bool,
    output: &Path,
) -> Result<()> {
    info!("Predicting rows from: {}", input.display());
    // Input columns must follow the model's feature order and kinds.
    let schema = model
        .features
        .iter()
        .map(|f| (f.name.clone(), f.kind))
        .collect();
    let dataset = CsvLoader::new()
        .with_headers(has_headers)
        .with_schema(Some(CsvSchema::new(schema)))
        .unlabeled()
        .load_path(input)
        .context("Failed to load prediction input")?;
    if dataset.is_empty() {
        bail!("Prediction input has no rows");
    }

    let predictions = model.predict_par(&dataset)?;
    let mut writer = csv::Writer::from_path(output).context("Failed to create predictions file")?;
    writer.write_record([model.label.as_str()])?;
    for label in &predictions {
        writer.write_record([label.as_str()])?;
    }
    writer.flush()?;

    info!("Wrote {} predictions to: {}", predictions.len(), output.display());
    Ok(())
}
