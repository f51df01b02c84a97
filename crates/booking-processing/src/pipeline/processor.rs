//! The end-to-end train/test processing pipeline.

use chrono::Utc;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::balancing::{Balancer, Smote};
use crate::config::{ConfigValidationError, EncodingMode, PathsConfig, ProcessingConfig};
use crate::error::{ConfigError, PipelineError, Result};
use crate::io::{ensure_dir, load_table, save_table};
use crate::pipeline::progress::{
    ClosureProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate,
};
use crate::preprocessing::{EncoderFit, LabelEncoder, Preprocessor};
use crate::selection::{FeatureSelector, RandomForest};
use crate::types::{BalancingReport, PreprocessingReport, ProcessingSummary, SelectionReport};

/// Both tables after every in-memory stage, ready to be written.
#[derive(Debug, Clone)]
pub struct ProcessedTables {
    pub train: DataFrame,
    pub test: DataFrame,
    pub train_report: PreprocessingReport,
    pub test_report: PreprocessingReport,
    pub balancing: BalancingReport,
    pub selection: SelectionReport,
}

/// Runs load → preprocess → balance → select → align → save over the
/// train and test tables.
///
/// Use [`DataProcessor::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use booking_processing::{AppConfig, DataProcessor, PathsConfig};
///
/// let config = AppConfig::from_yaml_file("config/config.yaml")?;
/// let summary = DataProcessor::builder()
///     .config(config.data_processing)
///     .paths(PathsConfig::default())
///     .build()?
///     .process()?;
/// println!("selected: {:?}", summary.selection.selected_features);
/// ```
pub struct DataProcessor {
    config: ProcessingConfig,
    paths: PathsConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(DataProcessor: Send);

impl DataProcessor {
    pub fn builder() -> DataProcessorBuilder {
        DataProcessorBuilder::default()
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    /// Run the whole pipeline from the configured input files to the
    /// processed output files.
    pub fn process(&self) -> Result<ProcessingSummary> {
        match self.process_internal() {
            Ok(summary) => {
                self.report_progress(ProgressUpdate::complete("Data processing completed successfully"));
                Ok(summary)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Error in preprocessing pipeline: {}", e);
                Err(e)
            }
        }
    }

    /// Run every in-memory stage on already loaded tables.
    pub fn transform(&self, train: DataFrame, test: DataFrame) -> Result<ProcessedTables> {
        self.report_progress(ProgressUpdate::started(ProcessingStage::Preprocessing));
        let preprocessor = Preprocessor::new(&self.config);

        let mut train_encoder = LabelEncoder::new();
        let (train, train_report) =
            preprocessor.preprocess(train, &mut train_encoder, EncoderFit::Refit)?;

        let (test, test_report) = match self.config.encoding_mode {
            EncodingMode::FitOnTrain => {
                preprocessor.preprocess(test, &mut train_encoder, EncoderFit::Reuse)?
            }
            EncodingMode::PerTable => {
                preprocessor.preprocess(test, &mut LabelEncoder::new(), EncoderFit::Refit)?
            }
        };
        self.report_progress(ProgressUpdate::finished(
            ProcessingStage::Preprocessing,
            "Preprocessing complete",
        ));

        self.report_progress(ProgressUpdate::started(ProcessingStage::Balancing));
        let balancer = Balancer::new(
            self.config.target_column.as_str(),
            Smote::new(self.config.smote_k_neighbors, self.config.random_seed),
        );
        let (train, balancing) = balancer.balance(&train)?;
        self.report_progress(ProgressUpdate::finished(
            ProcessingStage::Balancing,
            format!("Balanced training table to {} rows", train.height()),
        ));

        self.report_progress(ProgressUpdate::started(ProcessingStage::FeatureSelection));
        let selector = FeatureSelector::new(
            self.config.target_column.as_str(),
            self.config.no_of_features,
            RandomForest::new(self.config.n_estimators, self.config.random_seed),
        );
        let (train, selection) = selector.select(&train)?;
        self.report_progress(ProgressUpdate::finished(
            ProcessingStage::FeatureSelection,
            format!("Selected {} features", selection.selected_features.len()),
        ));

        self.report_progress(ProgressUpdate::started(ProcessingStage::Alignment));
        let test = align_columns(&test, &train)?;
        self.report_progress(ProgressUpdate::finished(
            ProcessingStage::Alignment,
            "Test table aligned",
        ));

        Ok(ProcessedTables {
            train,
            test,
            train_report,
            test_report,
            balancing,
            selection,
        })
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self) -> Result<ProcessingSummary> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        info!("Starting data processing pipeline");

        self.report_progress(ProgressUpdate::started(ProcessingStage::Loading));
        let train = load_table(&self.paths.train_path)?;
        let test = load_table(&self.paths.test_path)?;
        self.report_progress(ProgressUpdate::finished(ProcessingStage::Loading, "Data loaded"));

        let mut tables = self.transform(train, test)?;

        self.report_progress(ProgressUpdate::started(ProcessingStage::Saving));
        let train_output = self.paths.processed_train_path();
        let test_output = self.paths.processed_test_path();
        save_table(&mut tables.train, &train_output)?;
        save_table(&mut tables.test, &test_output)?;
        self.report_progress(ProgressUpdate::finished(ProcessingStage::Saving, "Data saved"));

        let output_columns = tables
            .train
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        info!("Data processing completed successfully");
        Ok(ProcessingSummary {
            started_at,
            duration_ms: start_time.elapsed().as_millis() as u64,
            train_rows: tables.train.height(),
            test_rows: tables.test.height(),
            train: tables.train_report,
            test: tables.test_report,
            balancing: tables.balancing,
            selection: tables.selection,
            output_columns,
            train_output,
            test_output,
        })
    }
}

/// Project `test` onto the columns of `train`, in the same order.
///
/// Every column of `train` missing from `test` is reported at once.
pub fn align_columns(test: &DataFrame, train: &DataFrame) -> Result<DataFrame> {
    let columns: Vec<String> = train
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    test.select(columns.iter().map(String::as_str)).map_err(|_| {
        let missing: Vec<String> = columns
            .iter()
            .filter(|name| test.column(name.as_str()).is_err())
            .cloned()
            .collect();
        PipelineError::Alignment { missing }
    })
}

/// Builder for [`DataProcessor`].
#[derive(Default)]
pub struct DataProcessorBuilder {
    config: Option<ProcessingConfig>,
    paths: Option<PathsConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(DataProcessorBuilder: Send);

impl DataProcessorBuilder {
    pub fn config(mut self, config: ProcessingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Input and output locations; defaults to [`PathsConfig::default()`].
    pub fn paths(mut self, paths: PathsConfig) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Validate the config and create the processed directory.
    pub fn build(self) -> Result<DataProcessor> {
        let config = self.config.ok_or(ConfigError::Invalid(
            ConfigValidationError::MissingField("data_processing"),
        ))?;
        config.validate().map_err(ConfigError::from)?;

        let paths = self.paths.unwrap_or_default();
        ensure_dir(&paths.processed_dir)?;

        Ok(DataProcessor {
            config,
            paths,
            progress_reporter: self.progress_reporter,
        })
    }
}
