//! Error types for the recoding pipeline.
//!
//! Each variant is local to the transformation that raised it. None of them
//! are transient: they indicate a mismatch between the data and the recode
//! plan, so callers surface them instead of retrying.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by the category mapper, the decade binner and the table views.
#[derive(Debug, Error)]
pub enum RecodeError {
    /// A label present in the data is not part of the declared domain.
    #[error("Unknown category '{label}' in column '{column}'")]
    UnknownCategory {
        /// Column being recoded
        column: String,
        /// Offending label
        label: String,
    },

    /// A declared order does not cover every retained label.
    ///
    /// `missing` lists the labels present in the data (and not pruned) that
    /// the order omits. Duplicated labels in the order are reported here too.
    #[error("Order for column '{column}' does not cover labels {missing:?}")]
    OrderMismatch {
        /// Column being recoded
        column: String,
        /// Labels the order fails to place
        missing: Vec<String>,
    },

    /// Two decade intervals share at least one value.
    #[error("Intervals '{first}' and '{second}' overlap")]
    OverlappingIntervals {
        /// Label of the lower interval
        first: String,
        /// Label of the higher interval
        second: String,
    },

    /// An interval whose start is not strictly below its end.
    #[error("Interval '{label}' is empty: [{start}, {end})")]
    InvalidInterval {
        /// Interval label
        label: String,
        /// Inclusive start
        start: i64,
        /// Exclusive end
        end: i64,
    },

    /// A label was declared more than once in a domain or interval set.
    #[error("Duplicate label '{label}' in {context}")]
    DuplicateLabel {
        /// Where the duplicate was found
        context: String,
        /// The repeated label
        label: String,
    },

    /// The named column does not exist in the table.
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// The named column cannot be read as numbers.
    #[error("Column '{column}' is not numeric (found {dtype})")]
    NotNumeric {
        /// Column name
        column: String,
        /// Its actual data type
        dtype: String,
    },

    /// The named column is not a categorical column.
    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),

    /// Failure inside polars while reading or building columns.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Convenience alias used throughout the pipeline.
pub type RecodeResult<T> = std::result::Result<T, RecodeError>;
