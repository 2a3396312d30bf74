//! Decade binning of a numeric year column
//!
//! Intervals are half-open `[start, end)`. A set of intervals is validated on
//! construction: overlapping intervals are rejected instead of being resolved
//! by iteration order, so every year maps to at most one label.

use std::collections::HashSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::category::{CategoricalColumn, CategoryDomain};
use super::error::{RecodeError, RecodeResult};

/// First year covered by the canonical survey decades
pub const FIRST_DECADE: i64 = 1970;

/// Number of canonical survey decades (1970s through 2010s)
pub const DECADE_COUNT: usize = 5;

/// A labeled half-open year range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeInterval {
    pub start: i64,
    pub end: i64,
    pub label: String,
}

impl DecadeInterval {
    pub fn new(start: i64, end: i64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Ten-year interval starting at `start`, labeled e.g. "1970s".
    pub fn decade(start: i64) -> Self {
        Self::new(start, start + 10, format!("{}s", start))
    }

    pub fn contains(&self, year: i64) -> bool {
        self.start <= year && year < self.end
    }
}

/// A validated, sorted, non-overlapping set of intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecadeBins {
    intervals: Vec<DecadeInterval>,
}

impl DecadeBins {
    /// Validate and sort a set of intervals.
    ///
    /// Fails when an interval is empty, a label repeats, or two intervals
    /// share a year. Gaps between intervals are allowed.
    pub fn new(mut intervals: Vec<DecadeInterval>) -> RecodeResult<Self> {
        for interval in &intervals {
            if interval.start >= interval.end {
                return Err(RecodeError::InvalidInterval {
                    label: interval.label.clone(),
                    start: interval.start,
                    end: interval.end,
                });
            }
        }

        // Duplicate labels would make the output domain ambiguous
        if let Some(label) = first_duplicate(intervals.iter().map(|i| i.label.as_str())) {
            return Err(RecodeError::DuplicateLabel {
                context: "decade intervals".to_string(),
                label: label.to_string(),
            });
        }

        intervals.sort_by_key(|i| (i.start, i.end));
        for pair in intervals.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(RecodeError::OverlappingIntervals {
                    first: pair[0].label.clone(),
                    second: pair[1].label.clone(),
                });
            }
        }

        Ok(Self { intervals })
    }

    /// `count` contiguous decades starting at `first`.
    pub fn decades(first: i64, count: usize) -> Self {
        Self {
            intervals: (0..count as i64)
                .map(|i| DecadeInterval::decade(first + i * 10))
                .collect(),
        }
    }

    /// The survey decades: 1970s, 1980s, 1990s, 2000s, 2010s (1970 to 2019).
    pub fn canonical() -> Self {
        Self::decades(FIRST_DECADE, DECADE_COUNT)
    }

    pub fn intervals(&self) -> &[DecadeInterval] {
        &self.intervals
    }

    /// Label of the interval containing `year`, if any.
    pub fn label_for(&self, year: i64) -> Option<&str> {
        // Intervals are sorted and disjoint: the candidate is the last one starting at or before `year`
        let idx = self.intervals.partition_point(|i| i.start <= year);
        let candidate = self.intervals.get(idx.checked_sub(1)?)?;
        candidate.contains(year).then_some(candidate.label.as_str())
    }

    /// Ordered domain of interval labels, ascending by start.
    pub fn domain(&self) -> CategoryDomain {
        CategoryDomain::from_unique(self.intervals.iter().map(|i| i.label.clone()).collect(), true)
    }

    /// Bin a sequence of numeric values into an ordered categorical column.
    ///
    /// Fractional values are floored before lookup. Present values outside
    /// every interval (including NaN) become missing and are reported.
    pub fn bin_values<I>(&self, name: &str, values: I) -> BinnedColumn
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut out_of_range_rows = Vec::new();
        let labels: Vec<Option<&str>> = values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value?;
                let label = value
                    .is_finite()
                    .then(|| self.label_for(value.floor() as i64))
                    .flatten();
                if label.is_none() {
                    out_of_range_rows.push(row);
                }
                label
            })
            .collect();

        BinnedColumn {
            column: CategoricalColumn::encode(name, self.domain(), labels.into_iter()),
            out_of_range_rows,
        }
    }
}

impl Default for DecadeBins {
    fn default() -> Self {
        Self::canonical()
    }
}

/// A binned column plus the rows whose year fell outside every interval.
#[derive(Debug, Clone)]
pub struct BinnedColumn {
    pub column: CategoricalColumn,
    pub out_of_range_rows: Vec<usize>,
}

/// Bin a numeric column of `df` into a new categorical column named `output`.
pub fn bin_years(
    df: &DataFrame,
    column: &str,
    bins: &DecadeBins,
    output: &str,
) -> RecodeResult<BinnedColumn> {
    let source = df
        .column(column)
        .map_err(|_| RecodeError::ColumnNotFound(column.to_string()))?;

    if !source.dtype().is_primitive_numeric() {
        return Err(RecodeError::NotNumeric {
            column: column.to_string(),
            dtype: source.dtype().to_string(),
        });
    }

    let floats = source.cast(&DataType::Float64)?;
    let binned = bins.bin_values(output, floats.f64()?.into_iter());

    if !binned.out_of_range_rows.is_empty() {
        debug!(
            column,
            rows = binned.out_of_range_rows.len(),
            "years outside every interval set to missing"
        );
    }

    Ok(binned)
}

fn first_duplicate<'a>(mut labels: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    labels.find(|l| !seen.insert(*l))
}
