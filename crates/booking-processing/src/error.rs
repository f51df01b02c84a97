//! Error types for the booking preprocessing pipeline.
//!
//! Every stage of the pipeline maps its internal failures into exactly one
//! [`PipelineError`] variant, keeping the original cause reachable through
//! [`std::error::Error::source`].
//!
//! Errors are serializable as `{ code, message }` so a caller can report them
//! as JSON without knowing the concrete variant.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

use crate::balancing::SmoteError;
use crate::config::ConfigValidationError;
use crate::preprocessing::EncodingError;
use crate::selection::SelectionError;

/// Failure while reading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML or is missing a required key.
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config parsed but holds invalid values.
    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

/// Sub-step of the preprocessing stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStep {
    /// Dropping the identifier column or duplicate rows.
    Cleaning,
    /// Label-encoding categorical columns.
    Encoding,
    /// Skewness detection and log transform.
    SkewCorrection,
}

impl std::fmt::Display for PreprocessingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cleaning => "cleaning",
            Self::Encoding => "encoding",
            Self::SkewCorrection => "skew correction",
        };
        f.write_str(name)
    }
}

/// Root cause of a preprocessing failure.
#[derive(Error, Debug)]
pub enum PreprocessingCause {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

/// The main error type of the pipeline. One variant per failure kind.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Config file missing, malformed, or missing a required key.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A source table file is missing or unparsable.
    #[error("Failed to load table from '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },

    /// Cleaning, encoding or skew correction failed.
    #[error("Data preprocessing failed during {step}: {source}")]
    Preprocessing {
        step: PreprocessingStep,
        #[source]
        source: PreprocessingCause,
    },

    /// Oversampling failed.
    #[error("Balancing data failed: {0}")]
    Balancing(#[source] SmoteError),

    /// Importance model fit failed or the requested feature count is invalid.
    #[error("Feature selection failed: {0}")]
    FeatureSelection(#[source] SelectionError),

    /// The test table lacks columns selected from the training table.
    #[error("Test table is missing selected columns: {}", missing.join(", "))]
    Alignment { missing: Vec<String> },

    /// Writing an output table failed.
    #[error("Saving data to '{path}' failed: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: polars::error::PolarsError,
    },
}

impl PipelineError {
    /// Build a preprocessing error for the given step.
    pub fn preprocessing(step: PreprocessingStep, cause: impl Into<PreprocessingCause>) -> Self {
        Self::Preprocessing {
            step,
            source: cause.into(),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Load { .. } => "LOAD_ERROR",
            Self::Preprocessing { .. } => "PREPROCESSING_ERROR",
            Self::Balancing(_) => "BALANCING_ERROR",
            Self::FeatureSelection(_) => "FEATURE_SELECTION_ERROR",
            Self::Alignment { .. } => "ALIGNMENT_ERROR",
            Self::Save { .. } => "SAVE_ERROR",
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_code() {
        let err = PipelineError::Alignment {
            missing: vec!["lead_time".to_string()],
        };
        assert_eq!(err.error_code(), "ALIGNMENT_ERROR");
        assert_eq!(
            PipelineError::Balancing(SmoteError::SingleClass).error_code(),
            "BALANCING_ERROR"
        );
    }

    #[test]
    fn test_alignment_message_lists_columns() {
        let err = PipelineError::Alignment {
            missing: vec!["lead_time".to_string(), "avg_price_per_room".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("lead_time, avg_price_per_room"));
    }

    #[test]
    fn test_preprocessing_keeps_cause() {
        let err = PipelineError::preprocessing(
            PreprocessingStep::SkewCorrection,
            PreprocessingCause::ColumnNotFound("lead_time".to_string()),
        );
        assert!(err.to_string().contains("skew correction"));
        let source = err.source().expect("cause should be chained");
        assert!(source.to_string().contains("lead_time"));
    }

    #[test]
    fn test_error_serialization() {
        let err = PipelineError::FeatureSelection(SelectionError::InvalidFeatureCount {
            requested: 0,
            available: 3,
        });
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("FEATURE_SELECTION_ERROR"));
        assert!(json.contains("message"));
    }
}
