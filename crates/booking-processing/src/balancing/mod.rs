//! Class balancing of the training table.
//!
//! Only ever applied to the training split. The target column is separated,
//! SMOTE grows every minority class to the majority count, and the table is
//! reassembled as original rows followed by synthetic rows.

mod smote;

pub use smote::{Resampled, Smote, SmoteError};

use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::types::BalancingReport;
use crate::utils::{class_labels, feature_columns, feature_matrix};

/// Oversamples the minority classes of a table around its target column.
pub struct Balancer {
    target_column: String,
    smote: Smote,
}

impl Balancer {
    pub fn new(target_column: impl Into<String>, smote: Smote) -> Self {
        Self {
            target_column: target_column.into(),
            smote,
        }
    }

    /// Balance `df`, returning the new table and per-class counts.
    pub fn balance(&self, df: &DataFrame) -> Result<(DataFrame, BalancingReport)> {
        info!("Applying SMOTE (only to training data)");
        let (balanced, report) = self.balance_inner(df).map_err(PipelineError::Balancing)?;
        info!(
            "SMOTE balancing completed: {} -> {} rows ({} synthetic)",
            report.rows_before(),
            report.rows_after(),
            report.synthetic_rows
        );
        Ok((balanced, report))
    }

    fn balance_inner(
        &self,
        df: &DataFrame,
    ) -> std::result::Result<(DataFrame, BalancingReport), SmoteError> {
        let target = df
            .column(&self.target_column)
            .map_err(|_| SmoteError::MissingTarget(self.target_column.clone()))?
            .as_materialized_series()
            .clone();

        let features = feature_columns(df, &self.target_column);
        let x = feature_matrix(df, &features)?;
        let (classes, class_names) = class_labels(&target)?;

        let resampled = self.smote.fit_resample(&x, &classes, &class_names)?;
        debug!(
            "Generated {} synthetic rows with k_neighbors={}",
            resampled.rows.len(),
            self.smote.k_neighbors()
        );

        let mut columns: Vec<Column> = Vec::with_capacity(features.len() + 1);
        for (j, name) in features.iter().enumerate() {
            let dtype = df.column(name)?.dtype().clone();
            let values: Vec<f64> = x
                .iter()
                .chain(resampled.rows.iter())
                .map(|row| row[j])
                .collect();
            columns.push(Column::from(restore_dtype(name, values, &dtype)?));
        }

        let take: Vec<IdxSize> = (0..x.len())
            .chain(resampled.base_rows.iter().copied())
            .map(|i| i as IdxSize)
            .collect();
        let balanced_target = target.take(&IdxCa::from_vec("idx".into(), take))?;
        columns.push(Column::from(balanced_target));

        let balanced = DataFrame::new(columns)?;

        let count = |rows: &mut dyn Iterator<Item = usize>| {
            let mut counts: BTreeMap<String, usize> = class_names
                .iter()
                .map(|name| (name.clone(), 0))
                .collect();
            for row in rows {
                if let Some(c) = counts.get_mut(&class_names[classes[row]]) {
                    *c += 1;
                }
            }
            counts
        };
        let report = BalancingReport {
            class_counts_before: count(&mut (0..x.len())),
            class_counts_after: count(&mut (0..x.len()).chain(resampled.base_rows.iter().copied())),
            synthetic_rows: resampled.rows.len(),
        };

        Ok((balanced, report))
    }
}

/// Rebuild a feature column in its source dtype. Integer and boolean
/// columns are rounded first, so interpolated label codes land on a code
/// between the two rows they were grown from.
fn restore_dtype(name: &str, mut values: Vec<f64>, dtype: &DataType) -> PolarsResult<Series> {
    if dtype.is_integer() || dtype.is_bool() {
        for value in &mut values {
            *value = value.round();
        }
    }
    let series = Series::new(name.into(), values);
    if *dtype == DataType::Float64 {
        Ok(series)
    } else {
        series.strict_cast(dtype)
    }
}
