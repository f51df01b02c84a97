//! Feature selection by random-forest importance.
//!
//! The forest is fitted on the balanced training table purely to rank
//! features; it is dropped once the ranking exists. The table is then
//! projected to the top-k features, in ranking order, followed by the target.

mod forest;
mod tree;

pub use forest::{MaxFeatures, RandomForest};
pub use tree::{DecisionTree, TreeData, TreeNode};

use polars::prelude::*;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::{FeatureImportance, SelectionReport};
use crate::utils::{MatrixError, class_labels, feature_columns, feature_matrix};

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Cannot select {requested} features: table has {available} feature columns")]
    InvalidFeatureCount { requested: usize, available: usize },

    #[error("Target column '{0}' not found in table")]
    MissingTarget(String),

    #[error("Cannot rank features of an empty table")]
    EmptyTable,

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub struct FeatureSelector {
    target_column: String,
    no_of_features: usize,
    forest: RandomForest,
}

impl FeatureSelector {
    pub fn new(target_column: impl Into<String>, no_of_features: usize, forest: RandomForest) -> Self {
        Self {
            target_column: target_column.into(),
            no_of_features,
            forest,
        }
    }

    /// Rank every feature of `df` and keep the top `no_of_features`.
    pub fn select(&self, df: &DataFrame) -> Result<(DataFrame, SelectionReport)> {
        info!("Starting feature selection");
        let (selected, report) = self.select_inner(df).map_err(PipelineError::FeatureSelection)?;
        info!("Top {} features: {:?}", self.no_of_features, report.selected_features);
        Ok((selected, report))
    }

    /// Every feature column with its importance, most important first.
    /// Ties keep table order.
    pub fn rank(&self, df: &DataFrame) -> std::result::Result<Vec<FeatureImportance>, SelectionError> {
        let target = df
            .column(&self.target_column)
            .map_err(|_| SelectionError::MissingTarget(self.target_column.clone()))?
            .as_materialized_series();
        if df.height() == 0 {
            return Err(SelectionError::EmptyTable);
        }

        let features = feature_columns(df, &self.target_column);
        let x = feature_matrix(df, &features)?;
        let (y, classes) = class_labels(target)?;

        let mut forest = self.forest.clone();
        forest.fit(&x, &y, classes.len());
        let importances = forest.feature_importances().unwrap_or_default();

        let mut ranking: Vec<FeatureImportance> = features
            .into_iter()
            .zip(importances.iter().copied())
            .map(|(feature, importance)| FeatureImportance { feature, importance })
            .collect();
        ranking.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
        });
        Ok(ranking)
    }

    fn select_inner(
        &self,
        df: &DataFrame,
    ) -> std::result::Result<(DataFrame, SelectionReport), SelectionError> {
        let available = df.width().saturating_sub(1);
        if self.no_of_features == 0 || self.no_of_features > available {
            return Err(SelectionError::InvalidFeatureCount {
                requested: self.no_of_features,
                available,
            });
        }

        let ranking = self.rank(df)?;
        info!("Feature importance ranking:");
        for entry in &ranking {
            info!("  {}: {:.6}", entry.feature, entry.importance);
        }

        let selected_features: Vec<String> = ranking
            .iter()
            .take(self.no_of_features)
            .map(|entry| entry.feature.clone())
            .collect();

        let mut columns = selected_features.clone();
        columns.push(self.target_column.clone());
        let selected = df.select(columns)?;

        Ok((
            selected,
            SelectionReport {
                ranking,
                selected_features,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> DataFrame {
        let n = 40;
        let lead_time: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 5.0 + (i % 7) as f64 } else { 200.0 + (i % 11) as f64 }).collect();
        let adults: Vec<f64> = (0..n).map(|i| ((i * 3) % 4) as f64).collect();
        let weekend: Vec<f64> = (0..n).map(|i| ((i * 5) % 3) as f64).collect();
        let status: Vec<u32> = (0..n).map(|i| (i % 2) as u32).collect();
        df![
            "no_of_adults" => adults,
            "lead_time" => lead_time,
            "no_of_weekend_nights" => weekend,
            "booking_status" => status,
        ]
        .unwrap()
    }

    fn selector(k: usize) -> FeatureSelector {
        FeatureSelector::new("booking_status", k, RandomForest::new(30, 42))
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_top_k_plus_target() {
        let df = table();
        let (selected, report) = selector(2).select(&df).unwrap();

        assert_eq!(selected.width(), 3);
        assert_eq!(selected.height(), df.height());
        assert_eq!(report.selected_features.len(), 2);
        assert_eq!(report.selected_features[0], "lead_time");
        assert_eq!(names(&selected).last().map(String::as_str), Some("booking_status"));
        assert_eq!(names(&selected)[..2], report.selected_features[..]);
        assert_eq!(report.ranking.len(), 3);
    }

    #[test]
    fn test_ranking_is_descending() {
        let ranking = selector(1).rank(&table()).unwrap();
        assert!(ranking.windows(2).all(|w| w[0].importance >= w[1].importance));
        let total: f64 = ranking.iter().map(|r| r.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_table_order() {
        // single class: every importance is zero
        let df = df![
            "b_feature" => [1.0f64, 2.0, 3.0],
            "a_feature" => [3.0f64, 1.0, 2.0],
            "booking_status" => [1u32, 1, 1],
        ]
        .unwrap();
        let ranking = selector(1).rank(&df).unwrap();
        let order: Vec<&str> = ranking.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(order, vec!["b_feature", "a_feature"]);
    }

    #[test]
    fn test_zero_features_is_invalid() {
        let err = selector(0).select(&table()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureSelection(SelectionError::InvalidFeatureCount {
                requested: 0,
                available: 3
            })
        ));
    }

    #[test]
    fn test_too_many_features_is_invalid() {
        let err = selector(4).select(&table()).unwrap_err();
        assert_eq!(err.error_code(), "FEATURE_SELECTION_ERROR");
        assert!(err.to_string().contains("4"));
    }

    #[test]
    fn test_all_features_kept() {
        let (selected, _) = selector(3).select(&table()).unwrap();
        assert_eq!(selected.width(), 4);
    }

    #[test]
    fn test_missing_target() {
        let df = table().drop("booking_status").unwrap();
        let err = selector(1).select(&df).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FeatureSelection(SelectionError::MissingTarget(_))
        ));
    }
}
