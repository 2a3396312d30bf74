//! Missing value analysis, column screening and the row filter

use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Analyze missing values in the dataset.
///
/// Returns `(column, missing_ratio)` pairs sorted by ratio descending.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    // Handle empty DataFrame
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let rows = df.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count() as f64 / rows))
        .collect();

    // Sort by missing ratio descending
    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Get columns whose missing ratio is strictly above the threshold.
///
/// Protected columns are never returned.
pub fn get_columns_above_threshold(
    missing_ratios: &[(String, f64)],
    threshold: f64,
    protected: &[String],
) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(name, ratio)| *ratio > threshold && !protected.contains(name))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Drop explicitly named columns plus columns that are too sparse.
///
/// Returns the screened frame and the dropped column names (explicit drops first).
/// Naming a column that does not exist is an error.
pub fn screen_columns(
    df: &DataFrame,
    explicit_drops: &[String],
    missing_threshold: f64,
    protected: &[String],
) -> Result<(DataFrame, Vec<String>)> {
    let available: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for name in explicit_drops {
        if !available.contains(name) {
            anyhow::bail!(
                "Column '{}' cannot be dropped: not found. Available columns: {:?}",
                name,
                available
            );
        }
    }

    let ratios = analyze_missing_values(df)?;
    let mut dropped: Vec<String> = explicit_drops.to_vec();
    for name in get_columns_above_threshold(&ratios, missing_threshold, protected) {
        if !dropped.contains(&name) {
            dropped.push(name);
        }
    }

    let screened = df.drop_many(dropped.iter().map(|s| s.as_str()));
    Ok((screened, dropped))
}

/// Output of [`drop_incomplete_rows`].
#[derive(Debug, Clone)]
pub struct RowFilterOutcome {
    pub frame: DataFrame,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl RowFilterOutcome {
    pub fn rows_dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// Keep only rows where every column holds a value. NaN in a float column
/// counts as missing.
///
/// Idempotent; a complete table comes back unchanged and the result may be empty.
pub fn drop_incomplete_rows(df: &DataFrame) -> Result<RowFilterOutcome> {
    let rows_before = df.height();
    let mut frame = df.drop_nulls::<String>(None)?;

    let mut keep = vec![true; frame.height()];
    for col in frame.get_columns().iter().filter(|c| c.dtype().is_float()) {
        let values = col.cast(&DataType::Float64)?;
        for (row, value) in values.f64()?.into_iter().enumerate() {
            if value.is_some_and(f64::is_nan) {
                keep[row] = false;
            }
        }
    }
    if keep.contains(&false) {
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        frame = frame.filter(&mask)?;
    }
    let rows_after = frame.height();

    debug!(rows_before, rows_after, "dropped incomplete rows");

    Ok(RowFilterOutcome {
        frame,
        rows_before,
        rows_after,
    })
}
