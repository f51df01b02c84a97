//! CLI entry point for the booking preprocessing pipeline.

use anyhow::{Context, Result, anyhow};
use booking_processing::config::paths;
use booking_processing::{AppConfig, DataProcessor, EncodingMode, PathsConfig, ProcessingSummary};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// CLI-compatible encoding mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEncodingMode {
    /// Fit label encodings on train, apply them to test
    FitOnTrain,
    /// Fit fresh label encodings on every table
    PerTable,
}

impl From<CliEncodingMode> for EncodingMode {
    fn from(cli: CliEncodingMode) -> Self {
        match cli {
            CliEncodingMode::FitOnTrain => EncodingMode::FitOnTrain,
            CliEncodingMode::PerTable => EncodingMode::PerTable,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Hotel booking cancellation data preprocessing pipeline",
    long_about = "Cleans, encodes, skew-corrects, balances and feature-selects the raw\n\
                  train/test booking tables and writes the processed tables.\n\n\
                  EXAMPLES:\n  \
                  # Default paths (artifacts/raw -> artifacts/processed)\n  \
                  booking-processing\n\n  \
                  # Custom inputs and output directory\n  \
                  booking-processing --train data/train.csv --test data/test.csv -o out/\n\n  \
                  # Machine-readable summary\n  \
                  booking-processing --json | jq .selection.selected_features"
)]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = paths::CONFIG_PATH)]
    config: PathBuf,

    /// Path to the raw training table
    #[arg(long, default_value = paths::TRAIN_FILE_PATH)]
    train: PathBuf,

    /// Path to the raw test table
    #[arg(long, default_value = paths::TEST_FILE_PATH)]
    test: PathBuf,

    /// Directory for the processed tables
    #[arg(short, long, default_value = paths::PROCESSED_DIR)]
    output_dir: PathBuf,

    /// Override the encoding mode from the config file
    #[arg(long, value_enum)]
    encoding_mode: Option<CliEncodingMode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run summary as JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout only carries the JSON document.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only holds JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    // Config problems must surface before any table is touched.
    let app_config = AppConfig::from_yaml_file(&args.config)
        .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;
    let mut config = app_config.data_processing;
    if let Some(mode) = args.encoding_mode {
        config.encoding_mode = mode.into();
    }
    debug!("Effective configuration: {:?}", config);

    let paths = PathsConfig {
        train_path: args.train.clone(),
        test_path: args.test.clone(),
        processed_dir: args.output_dir.clone(),
    };

    let processor = DataProcessor::builder()
        .config(config)
        .paths(paths)
        .on_progress(|update| {
            debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    info!("{}", "=".repeat(80));
    info!("Starting booking data processing...");
    info!("{}", "=".repeat(80));

    match processor.process() {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if !args.quiet {
                print_human_readable_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed [{}]: {}", e.error_code(), e))
        }
    }
}

/// Print a human-readable summary of a completed run.
fn print_human_readable_summary(summary: &ProcessingSummary) {
    println!();
    println!("{}", "=".repeat(80));
    println!("PROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Train: {} rows -> {} ({} rows x {} columns)",
        summary.train.rows_before,
        summary.train_output.display(),
        summary.train_rows,
        summary.output_columns.len()
    );
    println!(
        "Test:  {} rows -> {} ({} rows x {} columns)",
        summary.test.rows_before,
        summary.test_output.display(),
        summary.test_rows,
        summary.output_columns.len()
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Duplicates removed: {} (train), {} (test)",
        summary.train.duplicates_removed, summary.test.duplicates_removed
    );
    if !summary.train.log_transformed.is_empty() {
        println!("  Log-transformed: {}", summary.train.log_transformed.join(", "));
    }
    println!(
        "  Balancing: {} -> {} rows ({} synthetic)",
        summary.balancing.rows_before(),
        summary.balancing.rows_after(),
        summary.balancing.synthetic_rows
    );
    for (class, count) in &summary.balancing.class_counts_after {
        println!("    class {}: {}", class, count);
    }
    println!();

    println!("Feature Ranking:");
    for (rank, entry) in summary.selection.ranking.iter().enumerate() {
        let marker = if rank < summary.selection.selected_features.len() {
            "*"
        } else {
            " "
        };
        println!("  {} {:<40} {:.4}", marker, entry.feature, entry.importance);
    }
    println!();
    println!("Output columns: {}", summary.output_columns.join(", "));
    println!("{}", "=".repeat(80));
}
