//! Per-column label encoding.
//!
//! Every categorical column owns its own label → code map. Codes are the
//! position of the label in the sorted list of distinct string values, so
//! `["Room_Type 4", "Room_Type 1", "Room_Type 4"]` encodes to `[1, 0, 1]`.

use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

/// Label used for null cells once a column is cast to strings.
pub const NULL_LABEL: &str = "null";

/// Label → code map of a single column, ordered by label.
pub type ColumnEncoding = BTreeMap<String, u32>;

/// Column name → label map.
pub type EncodingMaps = BTreeMap<String, ColumnEncoding>;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Categorical column '{0}' not found in table")]
    ColumnNotFound(String),

    #[error("Column '{0}' has no fitted encoding")]
    NotFitted(String),

    #[error("Column '{column}' contains categories unseen during fit: {}", labels.join(", "))]
    UnseenCategories { column: String, labels: Vec<String> },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Stateful label encoder holding one independent map per column.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    maps: EncodingMaps,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted maps, keyed by column.
    pub fn mappings(&self) -> &EncodingMaps {
        &self.maps
    }

    /// Learn a fresh map for each column, replacing any previous one.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<(), EncodingError> {
        for col_name in columns {
            let labels = column_labels(df, col_name)?;
            let mut distinct: Vec<String> = labels.into_iter().collect();
            distinct.sort();
            distinct.dedup();

            let map = distinct
                .into_iter()
                .enumerate()
                .map(|(code, label)| (label, code as u32))
                .collect();
            self.maps.insert(col_name.clone(), map);
        }
        Ok(())
    }

    /// Replace each column with its `UInt32` codes using the fitted maps.
    pub fn transform(&self, df: &mut DataFrame, columns: &[String]) -> Result<(), EncodingError> {
        for col_name in columns {
            let map = self
                .maps
                .get(col_name)
                .ok_or_else(|| EncodingError::NotFitted(col_name.clone()))?;

            let labels = column_labels(df, col_name)?;
            let mut unseen: Vec<String> = Vec::new();
            let codes: Vec<u32> = labels
                .into_iter()
                .map(|label| match map.get(&label) {
                    Some(&code) => code,
                    None => {
                        if !unseen.contains(&label) {
                            unseen.push(label);
                        }
                        0
                    }
                })
                .collect();

            if !unseen.is_empty() {
                unseen.sort();
                return Err(EncodingError::UnseenCategories {
                    column: col_name.clone(),
                    labels: unseen,
                });
            }

            df.replace(col_name, Series::new(col_name.as_str().into(), codes))?;
        }
        Ok(())
    }

    /// Fit on `df` and encode it in place.
    pub fn fit_transform(
        &mut self,
        df: &mut DataFrame,
        columns: &[String],
    ) -> Result<(), EncodingError> {
        self.fit(df, columns)?;
        self.transform(df, columns)
    }
}

/// Values of a column rendered as strings, nulls included as [`NULL_LABEL`].
fn column_labels(df: &DataFrame, col_name: &str) -> Result<Vec<String>, EncodingError> {
    let column = df
        .column(col_name)
        .map_err(|_| EncodingError::ColumnNotFound(col_name.to_string()))?;
    let as_str = column.as_materialized_series().cast(&DataType::String)?;
    let labels = as_str
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(NULL_LABEL).to_string())
        .collect();
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codes(df: &DataFrame, col: &str) -> Vec<u32> {
        df.column(col)
            .unwrap()
            .as_materialized_series()
            .u32()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn test_codes_follow_sorted_labels() {
        let mut df = df![
            "room_type_reserved" => ["Room_Type 4", "Room_Type 1", "Room_Type 4", "Room_Type 2"],
        ]
        .unwrap();
        let cols = vec!["room_type_reserved".to_string()];

        let mut encoder = LabelEncoder::new();
        encoder.fit_transform(&mut df, &cols).unwrap();

        assert_eq!(codes(&df, "room_type_reserved"), vec![2, 0, 2, 1]);
        let map = &encoder.mappings()["room_type_reserved"];
        assert_eq!(map["Room_Type 1"], 0);
        assert_eq!(map["Room_Type 2"], 1);
        assert_eq!(map["Room_Type 4"], 2);
    }

    #[test]
    fn test_columns_keep_independent_maps() {
        let mut df = df![
            "type_of_meal_plan" => ["Meal Plan 1", "Not Selected", "Meal Plan 2"],
            "booking_status" => ["Not_Canceled", "Canceled", "Not_Canceled"],
        ]
        .unwrap();
        let cols = vec!["type_of_meal_plan".to_string(), "booking_status".to_string()];

        let mut encoder = LabelEncoder::new();
        encoder.fit_transform(&mut df, &cols).unwrap();

        assert_eq!(encoder.mappings().len(), 2);
        assert_eq!(codes(&df, "type_of_meal_plan"), vec![0, 2, 1]);
        assert_eq!(codes(&df, "booking_status"), vec![1, 0, 1]);
    }

    #[test]
    fn test_numeric_values_are_encoded_as_strings() {
        let mut df = df!["repeated_guest" => [1i64, 0, 1, 0]].unwrap();
        let cols = vec!["repeated_guest".to_string()];

        let mut encoder = LabelEncoder::new();
        encoder.fit_transform(&mut df, &cols).unwrap();

        assert_eq!(codes(&df, "repeated_guest"), vec![1, 0, 1, 0]);
        assert!(encoder.mappings()["repeated_guest"].contains_key("0"));
    }

    #[test]
    fn test_nulls_become_their_own_label() {
        let mut df = df!["market_segment_type" => [Some("Online"), None, Some("Aviation")]].unwrap();
        let cols = vec!["market_segment_type".to_string()];

        let mut encoder = LabelEncoder::new();
        encoder.fit_transform(&mut df, &cols).unwrap();

        assert_eq!(codes(&df, "market_segment_type"), vec![1, 2, 0]);
        assert!(encoder.mappings()["market_segment_type"].contains_key(NULL_LABEL));
    }

    #[test]
    fn test_transform_with_unseen_category() {
        let train = df!["market_segment_type" => ["Online", "Offline"]].unwrap();
        let mut test = df!["market_segment_type" => ["Online", "Complementary", "Corporate"]].unwrap();
        let cols = vec!["market_segment_type".to_string()];

        let mut encoder = LabelEncoder::new();
        encoder.fit(&train, &cols).unwrap();
        let err = encoder.transform(&mut test, &cols).unwrap_err();

        match err {
            EncodingError::UnseenCategories { column, labels } => {
                assert_eq!(column, "market_segment_type");
                assert_eq!(labels, vec!["Complementary".to_string(), "Corporate".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column() {
        let mut df = df!["lead_time" => [1i64, 2]].unwrap();
        let err = LabelEncoder::new()
            .fit_transform(&mut df, &["room_type_reserved".to_string()])
            .unwrap_err();
        assert!(matches!(err, EncodingError::ColumnNotFound(c) if c == "room_type_reserved"));
    }

    #[test]
    fn test_transform_without_fit() {
        let mut df = df!["room_type_reserved" => ["a"]].unwrap();
        let err = LabelEncoder::new()
            .transform(&mut df, &["room_type_reserved".to_string()])
            .unwrap_err();
        assert!(matches!(err, EncodingError::NotFitted(_)));
    }
}
