//! Shared helpers for turning tables into the dense shapes the learners use.
//!
//! Balancing and feature selection both work on a row-major `f64` matrix of
//! every non-target column plus a class index per row.

use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::preprocessing::NULL_LABEL;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

// =============================================================================
// Matrix Extraction
// =============================================================================

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Feature column '{column}' is not numeric ({dtype})")]
    NonNumeric { column: String, dtype: String },

    #[error("Feature column '{0}' contains null values")]
    NullValues(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Names of every column except `target`, in table order.
pub fn feature_columns(df: &DataFrame, target: &str) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|name| name.to_string())
        .collect()
}

/// Row-major `f64` matrix of the given columns.
///
/// Every column must be numeric and free of nulls.
pub fn feature_matrix(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<f64>>, MatrixError> {
    let mut matrix = vec![Vec::with_capacity(columns.len()); df.height()];

    for name in columns {
        let series = df.column(name)?.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            return Err(MatrixError::NonNumeric {
                column: name.clone(),
                dtype: series.dtype().to_string(),
            });
        }
        if series.null_count() > 0 {
            return Err(MatrixError::NullValues(name.clone()));
        }

        let floats = series.cast(&DataType::Float64)?;
        for (row, value) in matrix.iter_mut().zip(floats.f64()?.into_no_null_iter()) {
            row.push(value);
        }
    }

    Ok(matrix)
}

/// Class index per row plus the sorted distinct class labels.
///
/// Labels are the target values rendered as strings; nulls become `"null"`.
pub fn class_labels(target: &Series) -> PolarsResult<(Vec<usize>, Vec<String>)> {
    let as_str = target.cast(&DataType::String)?;
    let labels: Vec<String> = as_str
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(NULL_LABEL).to_string())
        .collect();

    let mut index: BTreeMap<&str, usize> = labels.iter().map(|l| (l.as_str(), 0)).collect();
    for (i, slot) in index.values_mut().enumerate() {
        *slot = i;
    }

    let classes = labels.iter().map(|l| index[l.as_str()]).collect();
    let names = index.keys().map(|l| l.to_string()).collect();
    Ok((classes, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::UInt32));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
    }

    #[test]
    fn test_feature_columns_skip_target() {
        let df = df![
            "lead_time" => [1i64],
            "booking_status" => [0u32],
            "no_of_adults" => [2i64],
        ]
        .unwrap();
        assert_eq!(
            feature_columns(&df, "booking_status"),
            vec!["lead_time".to_string(), "no_of_adults".to_string()]
        );
    }

    #[test]
    fn test_feature_matrix_is_row_major() {
        let df = df![
            "lead_time" => [1i64, 2, 3],
            "avg_price_per_room" => [10.5f64, 20.0, 30.0],
        ]
        .unwrap();
        let cols = feature_columns(&df, "booking_status");
        let m = feature_matrix(&df, &cols).unwrap();
        assert_eq!(m, vec![vec![1.0, 10.5], vec![2.0, 20.0], vec![3.0, 30.0]]);
    }

    #[test]
    fn test_feature_matrix_rejects_nulls() {
        let df = df!["lead_time" => [Some(1i64), None]].unwrap();
        let err = feature_matrix(&df, &["lead_time".to_string()]).unwrap_err();
        assert!(matches!(err, MatrixError::NullValues(c) if c == "lead_time"));
    }

    #[test]
    fn test_class_labels_sorted() {
        let target = Series::new("booking_status".into(), &["Not_Canceled", "Canceled", "Not_Canceled"]);
        let (classes, names) = class_labels(&target).unwrap();
        assert_eq!(names, vec!["Canceled".to_string(), "Not_Canceled".to_string()]);
        assert_eq!(classes, vec![1, 0, 1]);
    }
}
