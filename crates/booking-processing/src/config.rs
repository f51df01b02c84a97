//! Configuration types for the booking preprocessing pipeline.
//!
//! The pipeline reads a YAML document with a `data_processing` section:
//!
//! ```yaml
//! data_processing:
//!   categorical_columns: [type_of_meal_plan, room_type_reserved, market_segment_type, booking_status]
//!   numerical_columns: [lead_time, avg_price_per_room, no_of_special_requests]
//!   skewness_threshold: 5
//!   no_of_features: 10
//! ```
//!
//! The four keys above are required. Everything else has a default and can
//! also be set through [`ProcessingConfig::builder()`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default file locations used when the caller does not override them.
pub mod paths {
    pub const TRAIN_FILE_PATH: &str = "artifacts/raw/train.csv";
    pub const TEST_FILE_PATH: &str = "artifacts/raw/test.csv";

    pub const PROCESSED_DIR: &str = "artifacts/processed";
    pub const PROCESSED_TRAIN_FILE_NAME: &str = "processed_train.csv";
    pub const PROCESSED_TEST_FILE_NAME: &str = "processed_test.csv";

    pub const CONFIG_PATH: &str = "config/config.yaml";
}

/// How label-encoding maps are shared between the train and test tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Fit one map per column on the training table and reuse it for test.
    /// Test categories never seen in train are an error.
    #[default]
    FitOnTrain,
    /// Refit every column independently on every table. Codes for the same
    /// label may differ between train and test.
    PerTable,
}

/// Column roles and stage parameters for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Columns label-encoded to integer codes.
    pub categorical_columns: Vec<String>,

    /// Columns checked for skew and log-transformed when above threshold.
    pub numerical_columns: Vec<String>,

    /// Skewness above which `ln(1 + x)` is applied.
    pub skewness_threshold: f64,

    /// Number of features kept by feature selection.
    pub no_of_features: usize,

    /// Label column. Never used as a feature.
    /// Default: "booking_status"
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Identifier column dropped before anything else, if present.
    /// Default: "Booking_ID"
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Default: FitOnTrain
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Neighbours used by SMOTE interpolation.
    /// Default: 5
    #[serde(default = "default_smote_k_neighbors")]
    pub smote_k_neighbors: usize,

    /// Seed shared by SMOTE and the random forest.
    /// Default: 42
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Trees in the importance forest.
    /// Default: 100
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
}

fn default_target_column() -> String {
    "booking_status".to_string()
}

fn default_id_column() -> String {
    "Booking_ID".to_string()
}

fn default_smote_k_neighbors() -> usize {
    5
}

fn default_random_seed() -> u64 {
    42
}

fn default_n_estimators() -> usize {
    100
}

impl ProcessingConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.no_of_features == 0 {
            return Err(ConfigValidationError::InvalidFeatureCount(
                self.no_of_features,
            ));
        }

        if !self.skewness_threshold.is_finite() {
            return Err(ConfigValidationError::InvalidSkewnessThreshold(
                self.skewness_threshold,
            ));
        }

        if self.smote_k_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKNeighbors(
                self.smote_k_neighbors,
            ));
        }

        if self.n_estimators == 0 {
            return Err(ConfigValidationError::InvalidEstimators(self.n_estimators));
        }

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetColumn);
        }

        if let Some(col) = self
            .numerical_columns
            .iter()
            .find(|col| self.categorical_columns.contains(col))
        {
            return Err(ConfigValidationError::ConflictingRole(col.clone()));
        }

        if self.numerical_columns.contains(&self.target_column) {
            return Err(ConfigValidationError::ConflictingRole(
                self.target_column.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid no_of_features: {0} (must be at least 1)")]
    InvalidFeatureCount(usize),

    #[error("Invalid skewness_threshold: {0} (must be a finite number)")]
    InvalidSkewnessThreshold(f64),

    #[error("Invalid smote_k_neighbors: {0} (must be at least 1)")]
    InvalidKNeighbors(usize),

    #[error("Invalid n_estimators: {0} (must be at least 1)")]
    InvalidEstimators(usize),

    #[error("target_column must not be empty")]
    EmptyTargetColumn,

    #[error("Column '{0}' is declared with more than one role")]
    ConflictingRole(String),

    #[error("Missing required setting '{0}'")]
    MissingField(&'static str),
}

/// Top-level layout of the YAML config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_processing: ProcessingConfig,
}

impl AppConfig {
    /// Read and validate a YAML config file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse and validate YAML held in memory.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, Path::new("<inline>"))
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.data_processing.validate()?;
        Ok(config)
    }
}

/// Where the pipeline reads and writes its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub processed_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from(paths::TRAIN_FILE_PATH),
            test_path: PathBuf::from(paths::TEST_FILE_PATH),
            processed_dir: PathBuf::from(paths::PROCESSED_DIR),
        }
    }
}

impl PathsConfig {
    /// Output path of the processed training table.
    pub fn processed_train_path(&self) -> PathBuf {
        self.processed_dir.join(paths::PROCESSED_TRAIN_FILE_NAME)
    }

    /// Output path of the processed test table.
    pub fn processed_test_path(&self) -> PathBuf {
        self.processed_dir.join(paths::PROCESSED_TEST_FILE_NAME)
    }
}

/// Builder for [`ProcessingConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessingConfigBuilder {
    categorical_columns: Vec<String>,
    numerical_columns: Vec<String>,
    skewness_threshold: Option<f64>,
    no_of_features: Option<usize>,
    target_column: Option<String>,
    id_column: Option<String>,
    encoding_mode: Option<EncodingMode>,
    smote_k_neighbors: Option<usize>,
    random_seed: Option<u64>,
    n_estimators: Option<usize>,
}

impl ProcessingConfigBuilder {
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn numerical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numerical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the skewness above which a numerical column is log-transformed.
    pub fn skewness_threshold(mut self, threshold: f64) -> Self {
        self.skewness_threshold = Some(threshold);
        self
    }

    /// Set how many features survive selection.
    pub fn no_of_features(mut self, k: usize) -> Self {
        self.no_of_features = Some(k);
        self
    }

    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    pub fn encoding_mode(mut self, mode: EncodingMode) -> Self {
        self.encoding_mode = Some(mode);
        self
    }

    pub fn smote_k_neighbors(mut self, k: usize) -> Self {
        self.smote_k_neighbors = Some(k);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = Some(n);
        self
    }

    /// Build the configuration.
    ///
    /// `skewness_threshold` and `no_of_features` have no default and must be set.
    pub fn build(self) -> Result<ProcessingConfig, ConfigValidationError> {
        let config = ProcessingConfig {
            categorical_columns: self.categorical_columns,
            numerical_columns: self.numerical_columns,
            skewness_threshold: self
                .skewness_threshold
                .ok_or(ConfigValidationError::MissingField("skewness_threshold"))?,
            no_of_features: self
                .no_of_features
                .ok_or(ConfigValidationError::MissingField("no_of_features"))?,
            target_column: self.target_column.unwrap_or_else(default_target_column),
            id_column: self.id_column.unwrap_or_else(default_id_column),
            encoding_mode: self.encoding_mode.unwrap_or_default(),
            smote_k_neighbors: self
                .smote_k_neighbors
                .unwrap_or_else(default_smote_k_neighbors),
            random_seed: self.random_seed.unwrap_or_else(default_random_seed),
            n_estimators: self.n_estimators.unwrap_or_else(default_n_estimators),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
data_processing:
  categorical_columns:
    - type_of_meal_plan
    - required_car_parking_space
    - room_type_reserved
    - market_segment_type
    - repeated_guest
    - booking_status
  numerical_columns:
    - lead_time
    - arrival_year
    - arrival_month
    - avg_price_per_room
  skewness_threshold: 5
  no_of_features: 10
"#;

    #[test]
    fn test_yaml_defaults() {
        let config = AppConfig::from_yaml_str(FULL_YAML).unwrap().data_processing;
        assert_eq!(config.categorical_columns.len(), 6);
        assert_eq!(config.numerical_columns.len(), 4);
        assert_eq!(config.skewness_threshold, 5.0);
        assert_eq!(config.no_of_features, 10);
        assert_eq!(config.target_column, "booking_status");
        assert_eq!(config.id_column, "Booking_ID");
        assert_eq!(config.encoding_mode, EncodingMode::FitOnTrain);
        assert_eq!(config.smote_k_neighbors, 5);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.n_estimators, 100);
    }

    #[test]
    fn test_yaml_missing_no_of_features() {
        let yaml = r#"
data_processing:
  categorical_columns: [a]
  numerical_columns: [b]
  skewness_threshold: 1.0
"#;
        let err = AppConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("no_of_features"));
    }

    #[test]
    fn test_yaml_missing_section() {
        let err = AppConfig::from_yaml_str("other: 1\n").unwrap_err();
        assert!(err.to_string().contains("data_processing"));
    }

    #[test]
    fn test_yaml_encoding_mode() {
        let yaml = format!("{FULL_YAML}  encoding_mode: per_table\n");
        let config = AppConfig::from_yaml_str(&yaml).unwrap().data_processing;
        assert_eq!(config.encoding_mode, EncodingMode::PerTable);
    }

    #[test]
    fn test_yaml_zero_features_rejected() {
        let yaml = FULL_YAML.replace("no_of_features: 10", "no_of_features: 0");
        let err = AppConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigValidationError::InvalidFeatureCount(0))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_yaml_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_builder_requires_threshold_and_count() {
        let err = ProcessingConfig::builder().no_of_features(3).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::MissingField("skewness_threshold")
        ));

        let err = ProcessingConfig::builder()
            .skewness_threshold(1.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::MissingField("no_of_features")
        ));
    }

    #[test]
    fn test_builder_conflicting_roles() {
        let err = ProcessingConfig::builder()
            .categorical_columns(["lead_time"])
            .numerical_columns(["lead_time"])
            .skewness_threshold(1.0)
            .no_of_features(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigValidationError::ConflictingRole(c) if c == "lead_time"));
    }

    #[test]
    fn test_processed_paths() {
        let layout = PathsConfig {
            processed_dir: PathBuf::from("out"),
            ..PathsConfig::default()
        };
        assert_eq!(layout.processed_train_path(), PathBuf::from("out/processed_train.csv"));
        assert_eq!(layout.processed_test_path(), PathBuf::from("out/processed_test.csv"));
        assert_eq!(
            PathsConfig::default().train_path,
            PathBuf::from(paths::TRAIN_FILE_PATH)
        );
    }
}
