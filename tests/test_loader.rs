//! Unit tests for dataset loading and saving

use gssrecode::pipeline::{
    drop_incomplete_rows, get_column_names, load_dataset, load_dataset_with_progress, save_dataset,
};
use polars::prelude::*;
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_load_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "year,degree,environment").unwrap();
    writeln!(file, "1975,BACHELOR,TOO MUCH").unwrap();
    writeln!(file, "1985,DK,TOO LITTLE").unwrap();
    drop(file);

    let (df, rows, cols, mem_mb) = load_dataset_with_progress(&csv_path, 100).unwrap();

    assert_eq!(rows, 2, "Should have 2 data rows");
    assert_eq!(cols, 3, "Should have 3 columns");
    assert_eq!(column_names(&df), vec!["year", "degree", "environment"]);
    assert!(df.column("year").unwrap().dtype().is_primitive_numeric());
    assert_eq!(df.column("degree").unwrap().dtype(), &DataType::String);
    assert!(mem_mb >= 0.0, "Memory estimate should be non-negative");
}

#[test]
fn test_load_csv_keeps_empty_fields_as_nulls() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "year,inequality").unwrap();
    writeln!(file, "1975,").unwrap();
    writeln!(file, "1985,AGREE").unwrap();
    drop(file);

    let (df, _, _, _) = load_dataset_with_progress(&csv_path, 100).unwrap();
    assert_eq!(df.column("inequality").unwrap().null_count(), 1);
}

#[test]
fn test_load_csv_reads_na_tokens_as_nulls() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "year,household_size,marital_status").unwrap();
    writeln!(file, "1980,NaN,MARRIED").unwrap();
    writeln!(file, "1985,3,NA").unwrap();
    writeln!(file, "1990,2,DIVORCED").unwrap();
    drop(file);

    let (df, _, _, _) = load_dataset_with_progress(&csv_path, 100).unwrap();
    assert_eq!(df.column("household_size").unwrap().null_count(), 1);
    assert_eq!(df.column("marital_status").unwrap().null_count(), 1);

    let outcome = drop_incomplete_rows(&df).unwrap();
    assert_eq!(outcome.rows_after, 1);
}

#[test]
fn test_load_parquet_file() {
    let mut df = create_survey_dataframe();
    let (_temp_dir, parquet_path) = create_temp_parquet(&mut df);

    let (loaded, rows, cols, _mem) = load_dataset_with_progress(&parquet_path, 100).unwrap();

    assert_eq!(rows, df.height());
    assert_eq!(cols, df.width());
    assert_eq!(column_names(&loaded), column_names(&df));
}

#[test]
fn test_get_column_names_csv() {
    let mut df = create_survey_dataframe();
    let (_temp_dir, csv_path) = create_temp_csv(&mut df);

    let columns = get_column_names(&csv_path).unwrap();
    assert_eq!(columns, column_names(&df));
}

#[test]
fn test_unsupported_extension_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.xlsx");
    std::fs::write(&path, b"not a table").unwrap();

    let err = load_dataset(&path, 100).err().expect("expected an error");
    assert!(err.to_string().contains("Unsupported file format"));
}

#[test]
fn test_save_csv_round_trip() {
    let mut df = create_survey_dataframe();
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out.csv");

    save_dataset(&mut df, &out).unwrap();
    let (loaded, rows, cols, _) = load_dataset_with_progress(&out, 100).unwrap();

    assert_eq!(rows, 6);
    assert_eq!(cols, 10);
    assert_eq!(string_values(&loaded, "degree"), string_values(&df, "degree"));
}

#[test]
fn test_save_unsupported_extension() {
    let mut df = create_survey_dataframe();
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out.json");

    let err = save_dataset(&mut df, &out).unwrap_err();
    assert!(err.to_string().contains("Unsupported output format"));
}
