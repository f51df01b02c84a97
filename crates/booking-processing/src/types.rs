use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::preprocessing::EncodingMaps;

/// What a preprocessing pass did to one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub id_column_dropped: bool,
    pub duplicates_removed: usize,
    /// Label → code maps applied to this table, per categorical column.
    pub encodings: EncodingMaps,
    /// Skewness measured per numerical column (before any transform).
    pub skewness: BTreeMap<String, f64>,
    /// Numerical columns that received `ln(1 + x)`, in declaration order.
    pub log_transformed: Vec<String>,
}

impl PreprocessingReport {
    pub fn new(rows_before: usize, columns_before: usize) -> Self {
        Self {
            rows_before,
            columns_before,
            ..Self::default()
        }
    }
}

/// Class distribution around the balancing stage.
///
/// Class labels are rendered as strings so the report does not depend on
/// the target column's dtype.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalancingReport {
    pub class_counts_before: BTreeMap<String, usize>,
    pub class_counts_after: BTreeMap<String, usize>,
    pub synthetic_rows: usize,
}

impl BalancingReport {
    pub fn rows_before(&self) -> usize {
        self.class_counts_before.values().sum()
    }

    pub fn rows_after(&self) -> usize {
        self.class_counts_after.values().sum()
    }
}

/// Importance score of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Outcome of feature selection on the training table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Every feature, sorted by importance descending.
    pub ranking: Vec<FeatureImportance>,
    /// The top-k feature names, in ranking order.
    pub selected_features: Vec<String>,
}

/// Summary of one complete pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub started_at: DateTime<Utc>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub train: PreprocessingReport,
    pub test: PreprocessingReport,
    pub balancing: BalancingReport,
    pub selection: SelectionReport,

    /// Final column order shared by both output tables.
    pub output_columns: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_output: PathBuf,
    pub test_output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balancing_report_row_totals() {
        let report = BalancingReport {
            class_counts_before: BTreeMap::from([("0".to_string(), 20), ("1".to_string(), 80)]),
            class_counts_after: BTreeMap::from([("0".to_string(), 80), ("1".to_string(), 80)]),
            synthetic_rows: 60,
        };
        assert_eq!(report.rows_before(), 100);
        assert_eq!(report.rows_after(), 160);
    }

    #[test]
    fn test_preprocessing_report_serializes() {
        let mut report = PreprocessingReport::new(10, 4);
        report.log_transformed.push("lead_time".to_string());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows_before"], 10);
        assert_eq!(json["log_transformed"][0], "lead_time");
    }
}
