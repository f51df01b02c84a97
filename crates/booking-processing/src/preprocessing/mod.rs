//! Table preprocessing: cleaning, label encoding and skew correction.
//!
//! Runs independently on the train and test tables, in this order:
//! 1. Drop the identifier column when present
//! 2. Drop exact-duplicate rows (first occurrence kept, order preserved)
//! 3. Label-encode the declared categorical columns
//! 4. Log-transform declared numerical columns whose skewness exceeds the threshold

mod encoder;
pub mod skew;

pub use encoder::{ColumnEncoding, EncodingError, EncodingMaps, LabelEncoder, NULL_LABEL};

use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::ProcessingConfig;
use crate::error::{PipelineError, PreprocessingCause, PreprocessingStep, Result};
use crate::types::PreprocessingReport;

/// Whether a preprocessing pass learns new encodings or reuses fitted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderFit {
    /// Fit fresh maps on this table, replacing earlier ones.
    Refit,
    /// Apply maps already fitted on another table.
    Reuse,
}

/// Cleans and encodes a single table according to the column roles in config.
pub struct Preprocessor<'a> {
    config: &'a ProcessingConfig,
}

impl<'a> Preprocessor<'a> {
    pub fn new(config: &'a ProcessingConfig) -> Self {
        Self { config }
    }

    /// Preprocess `df`, returning the transformed table and what was done to it.
    pub fn preprocess(
        &self,
        df: DataFrame,
        encoder: &mut LabelEncoder,
        fit: EncoderFit,
    ) -> Result<(DataFrame, PreprocessingReport)> {
        info!("Starting data preprocessing");
        let mut report = PreprocessingReport::new(df.height(), df.width());

        let mut df = self.clean(df, &mut report)?;
        self.encode(&mut df, encoder, fit, &mut report)?;
        self.correct_skew(&mut df, &mut report)?;

        report.rows_after = df.height();
        report.columns_after = df.width();
        info!("Preprocessing completed: shape {:?}", df.shape());
        Ok((df, report))
    }

    fn clean(&self, df: DataFrame, report: &mut PreprocessingReport) -> Result<DataFrame> {
        let cleaning_error = |e: PolarsError| PipelineError::preprocessing(PreprocessingStep::Cleaning, e);
        let id_column = self.config.id_column.as_str();

        let df = if df.column(id_column).is_ok() {
            report.id_column_dropped = true;
            debug!("Dropping identifier column '{}'", id_column);
            df.drop(id_column).map_err(cleaning_error)?
        } else {
            debug!("Identifier column '{}' not present", id_column);
            df
        };

        let before = df.height();
        let df = df
            .unique_stable(None, UniqueKeepStrategy::First, None)
            .map_err(cleaning_error)?;
        report.duplicates_removed = before - df.height();

        if report.duplicates_removed > 0 {
            info!("Removed {} duplicate rows", report.duplicates_removed);
        } else {
            debug!("No duplicate rows found");
        }

        Ok(df)
    }

    fn encode(
        &self,
        df: &mut DataFrame,
        encoder: &mut LabelEncoder,
        fit: EncoderFit,
        report: &mut PreprocessingReport,
    ) -> Result<()> {
        info!("Applying label encoding");
        let columns = &self.config.categorical_columns;

        let outcome = match fit {
            EncoderFit::Refit => encoder.fit_transform(df, columns),
            EncoderFit::Reuse => encoder.transform(df, columns),
        };
        outcome.map_err(|e| PipelineError::preprocessing(PreprocessingStep::Encoding, e))?;

        info!("Label encoding mappings:");
        for col_name in columns {
            if let Some(map) = encoder.mappings().get(col_name) {
                info!("{}: {:?}", col_name, map);
                report.encodings.insert(col_name.clone(), map.clone());
            }
        }
        Ok(())
    }

    fn correct_skew(&self, df: &mut DataFrame, report: &mut PreprocessingReport) -> Result<()> {
        info!("Handling skewness");
        let skew_error = |e: PreprocessingCause| {
            PipelineError::preprocessing(PreprocessingStep::SkewCorrection, e)
        };
        let threshold = self.config.skewness_threshold;

        let mut skewness = BTreeMap::new();
        for col_name in &self.config.numerical_columns {
            let column = df
                .column(col_name)
                .map_err(|_| skew_error(PreprocessingCause::ColumnNotFound(col_name.clone())))?;
            let value = skew::sample_skewness(column.as_materialized_series())
                .map_err(|e| skew_error(e.into()))?;
            if let Some(value) = value {
                skewness.insert(col_name.clone(), value);
            }
        }

        for (col_name, value) in &skewness {
            if *value > threshold {
                debug!(
                    "Column '{}' skewness {:.3} exceeds {}, applying log1p",
                    col_name, value, threshold
                );
                skew::log1p_column(df, col_name).map_err(|e| skew_error(e.into()))?;
                report.log_transformed.push(col_name.clone());
            }
        }

        // Keep declaration order for reporting.
        report
            .log_transformed
            .sort_by_key(|c| self.config.numerical_columns.iter().position(|n| n == c));
        report.skewness = skewness;
        Ok(())
    }
}
