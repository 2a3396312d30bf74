//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a small survey extract with the columns and spellings of the real data
///
/// Rows:
/// - 0: complete, college degree, 1970s
/// - 1: complete, "DK" opinions and degree, 1980s
/// - 2: missing `age` (dropped by the row filter)
/// - 3: boundary year 1989, inapplicable law enforcement answer
/// - 4: year 2020, outside every decade
/// - 5: boundary year 1979
pub fn create_survey_dataframe() -> DataFrame {
    df! {
        "year" => [1972i64, 1984, 1996, 1989, 2020, 1979],
        "age" => [Some(34.0f64), Some(51.0), None, Some(27.0), Some(45.0), Some(63.0)],
        "household_size" => [3i64, 2, 4, 1, 5, 2],
        "labor_status" => [
            "WORKING FULLTIME", "UNEMPL, LAID OFF", "RETIRED",
            "WORKING PARTTIME", "TEMP NOT WORKING", "KEEPING HOUSE",
        ],
        "marital_status" => [
            "MARRIED", "NEVER MARRIED", "DIVORCED", "MARRIED", "WIDOWED", "MARRIED",
        ],
        "environment" => ["TOO LITTLE", "DK", "TOO MUCH", "ABOUT RIGHT", "TOO LITTLE", "IAP"],
        "law_enforcement" => ["TOO MUCH", "DK", "ABOUT RIGHT", "IAP", "TOO LITTLE", "TOO LITTLE"],
        "drugs" => ["ABOUT RIGHT", "DK", "TOO LITTLE", "TOO MUCH", "TOO MUCH", "ABOUT RIGHT"],
        "degree" => ["BACHELOR", "DK", "GRADUATE", "LT HIGH SCHOOL", "HIGH SCHOOL", "JUNIOR COLLEGE"],
        "inequality" => [None::<&str>, None, None, Some("AGREE"), None, None],
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("gss_sub.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("gss_sub.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Column names of a DataFrame as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols = column_names(df);
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols = column_names(df);
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// String values of a column, `None` for nulls
pub fn string_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect()
}
