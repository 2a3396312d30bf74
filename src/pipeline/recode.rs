//! The recoding pipeline: screen columns, filter rows, map categories, bin years
//!
//! Stages run once, in order, over one frame. Data loss from pruning and
//! out-of-range years is not an error; it is counted in [`RecodeAudit`].

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::category::{map_categories, CategoricalColumn};
use super::decade::bin_years;
use super::error::RecodeError;
use super::missing::{drop_incomplete_rows, screen_columns};
use super::plan::{ColumnRecode, RecodePlan};
use super::views::{ColumnKind, RecodedTable};

/// Run-time switches that are not part of the plan itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecodeOptions {
    /// Drop columns whose missing ratio exceeds this before filtering rows
    pub missing_threshold: Option<f64>,
    /// Skip a column whose recode fails instead of aborting the run
    pub skip_failed_columns: bool,
}

/// Rows set to missing by pruning one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrunedColumn {
    pub column: String,
    pub rows: usize,
}

/// A column left out of the result because its recode failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedColumn {
    pub column: String,
    pub reason: String,
}

/// Record of everything the pipeline removed or could not place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecodeAudit {
    pub rows_before: usize,
    pub rows_after: usize,
    pub dropped_columns: Vec<String>,
    pub pruned: Vec<PrunedColumn>,
    pub out_of_range_years: usize,
    pub skipped: Vec<SkippedColumn>,
}

impl RecodeAudit {
    pub fn rows_dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }

    pub fn total_pruned(&self) -> usize {
        self.pruned.iter().map(|p| p.rows).sum()
    }
}

/// Apply a plan to a loaded frame.
pub fn run_recode(df: &DataFrame, plan: &RecodePlan, options: &RecodeOptions) -> Result<RecodedTable> {
    let mut audit = RecodeAudit::default();

    // No threshold: ratios never exceed 1.0, so nothing is screened as sparse
    let threshold = options.missing_threshold.unwrap_or(1.0);
    let (screened, dropped) = screen_columns(df, &plan.drop_columns, threshold, &plan.referenced_columns())?;
    audit.dropped_columns = dropped;

    let filtered = drop_incomplete_rows(&screened)?;
    audit.rows_before = filtered.rows_before;
    audit.rows_after = filtered.rows_after;
    info!(
        rows_before = filtered.rows_before,
        rows_after = filtered.rows_after,
        "row filter complete"
    );
    let mut frame = filtered.frame;

    let mut kinds: BTreeMap<String, ColumnKind> = BTreeMap::new();

    for recode in &plan.columns {
        match recode_column(&frame, recode) {
            Ok((column, pruned_rows)) => {
                frame
                    .with_column(column.to_column())
                    .with_context(|| format!("Failed to add column '{}'", recode.output))?;
                kinds.insert(
                    recode.output.clone(),
                    ColumnKind::Categorical {
                        domain: column.domain().clone(),
                    },
                );
                audit.pruned.push(PrunedColumn {
                    column: recode.output.clone(),
                    rows: pruned_rows,
                });
            }
            Err(err) if options.skip_failed_columns => {
                warn!(column = %recode.source, error = %err, "skipping column");
                audit.skipped.push(SkippedColumn {
                    column: recode.source.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to recode '{}' into '{}'", recode.source, recode.output)
                });
            }
        }
    }

    if let Some(decade) = &plan.decade {
        let bins = decade.bins().context("Invalid decade intervals")?;
        let binned = bin_years(&frame, &decade.source, &bins, &decade.output)
            .with_context(|| format!("Failed to bin '{}' into decades", decade.source))?;
        audit.out_of_range_years = binned.out_of_range_rows.len();
        frame
            .with_column(binned.column.to_column())
            .with_context(|| format!("Failed to add column '{}'", decade.output))?;
        kinds.insert(
            decade.output.clone(),
            ColumnKind::Categorical {
                domain: bins.domain(),
            },
        );
    }

    for column in frame.get_columns() {
        let name = column.name().to_string();
        if kinds.contains_key(&name) {
            continue;
        }
        let kind = if column.dtype().is_primitive_numeric() {
            ColumnKind::Numeric
        } else if plan.categorize_remaining && column.dtype() == &DataType::String {
            ColumnKind::Categorical {
                domain: CategoricalColumn::from_column(column)?.domain().clone(),
            }
        } else {
            ColumnKind::Text
        };
        kinds.insert(name, kind);
    }

    Ok(RecodedTable::new(frame, kinds, audit))
}

/// Recode one column; returns the new column and the number of pruned rows.
fn recode_column(
    frame: &DataFrame,
    recode: &ColumnRecode,
) -> std::result::Result<(CategoricalColumn, usize), RecodeError> {
    let source = frame
        .column(&recode.source)
        .map_err(|_| RecodeError::ColumnNotFound(recode.source.clone()))?;
    let column = CategoricalColumn::from_column(source)?;
    let mapped = map_categories(&column, &recode.spec)?;
    Ok((mapped.column.renamed(&recode.output), mapped.pruned_rows.len()))
}
