//! Skewness measurement and log correction for numerical columns.

use polars::prelude::*;
use tracing::warn;

/// Adjusted Fisher-Pearson sample skewness of the non-null values.
///
/// Returns `None` for fewer than three values, and `0.0` for a constant
/// column.
pub fn sample_skewness(series: &Series) -> PolarsResult<Option<f64>> {
    let values = non_null_values(series)?;
    let n = values.len();
    if n < 3 {
        return Ok(None);
    }

    let count = n as f64;
    let mean = values.iter().sum::<f64>() / count;
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let m2 = m2 / count;
    let m3 = m3 / count;

    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return Ok(Some(0.0));
    }

    let g1 = m3 / m2.powf(1.5);
    Ok(Some(g1 * (count * (count - 1.0)).sqrt() / (count - 2.0)))
}

/// Replace every value `x` with `ln(1 + x)`, keeping nulls.
pub fn log1p_column(df: &mut DataFrame, col_name: &str) -> PolarsResult<()> {
    let series = df.column(col_name)?.as_materialized_series().cast(&DataType::Float64)?;
    let values = series.f64()?;

    if values.into_iter().flatten().any(|v| v < 0.0) {
        warn!(
            "Column '{}' has negative values; log1p assumes non-negative data",
            col_name
        );
    }

    let transformed: Vec<Option<f64>> = values.into_iter().map(|v| v.map(f64::ln_1p)).collect();
    df.replace(col_name, Series::new(col_name.into(), transformed))?;
    Ok(())
}

fn non_null_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().flatten().collect())
}
