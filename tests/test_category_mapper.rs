//! Tests for the category mapper and decade binner against survey columns

use std::cmp::Ordering;

use gssrecode::pipeline::*;
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn degree_mapping() -> CollapseMapping {
    let mut mapping = CollapseMapping::new();
    mapping.insert("LT HIGH SCHOOL".into(), "HIGH SCHOOL".into());
    mapping.insert("BACHELOR".into(), "COLLEGE/UNIVERSITY".into());
    mapping.insert("GRADUATE".into(), "COLLEGE/UNIVERSITY".into());
    mapping.insert("JUNIOR COLLEGE".into(), "COLLEGE/UNIVERSITY".into());
    mapping
}

#[test]
fn test_collapse_law_holds_for_every_row() {
    let df = create_survey_dataframe();
    let degree = CategoricalColumn::from_column(df.column("degree").unwrap()).unwrap();
    let mapping = degree_mapping();

    let collapsed = degree.collapse(&mapping);

    for (before, after) in degree.iter().zip(collapsed.iter()) {
        let before = before.unwrap();
        let expected = mapping.get(before).map(String::as_str).unwrap_or(before);
        assert_eq!(after, Some(expected));
    }
}

#[test]
fn test_prune_law_holds_for_every_row() {
    let df = create_survey_dataframe();
    let environment = CategoricalColumn::from_column(df.column("environment").unwrap()).unwrap();
    let prune = strings(&OPINION_SENTINELS);

    let outcome = environment.remove_categories(&prune);

    for (row, (before, after)) in environment.iter().zip(outcome.column.iter()).enumerate() {
        let before = before.unwrap();
        if prune.iter().any(|p| p == before) {
            assert_eq!(after, None, "row {row} should be pruned");
            assert!(outcome.affected_rows.contains(&row));
        } else {
            assert_eq!(after, Some(before), "row {row} should be unchanged");
        }
    }
}

#[test]
fn test_ordering_law_matches_declared_positions() {
    let df = create_survey_dataframe();
    let column = CategoricalColumn::from_column(df.column("drugs").unwrap()).unwrap();
    let order = strings(&OPINION_ORDER);
    let ordered = column.reorder(&order, true).unwrap();

    for a in 0..ordered.len() {
        for b in 0..ordered.len() {
            let rank_a = order.iter().position(|l| Some(l.as_str()) == ordered.label(a)).unwrap();
            let rank_b = order.iter().position(|l| Some(l.as_str()) == ordered.label(b)).unwrap();
            assert_eq!(ordered.compare(a, b), Some(rank_a.cmp(&rank_b)));
        }
    }
}

#[test]
fn test_mapper_is_deterministic() {
    let df = create_survey_dataframe();
    let degree = CategoricalColumn::from_column(df.column("degree").unwrap()).unwrap();
    let spec = CategorySpec {
        mapping: degree_mapping(),
        order: Some(strings(&["HIGH SCHOOL", "COLLEGE/UNIVERSITY"])),
        prune: strings(&["DK"]),
        ..Default::default()
    };

    let first = map_categories(&degree, &spec).unwrap();
    let second = map_categories(&degree, &spec).unwrap();
    assert_eq!(first.column, second.column);
    assert_eq!(first.pruned_rows, second.pruned_rows);
}

#[test]
fn test_declared_domain_rejects_unknown_label() {
    let df = create_survey_dataframe();
    let labor = CategoricalColumn::from_column(df.column("labor_status").unwrap()).unwrap();
    let spec = CategorySpec {
        domain: Some(strings(&["EMPLOYED", "UNEMPLOYED", "RETIRED"])),
        ..Default::default()
    };

    match map_categories(&labor, &spec).unwrap_err() {
        RecodeError::UnknownCategory { column, label } => {
            assert_eq!(column, "labor_status");
            assert_eq!(label, "KEEPING HOUSE");
        }
        other => panic!("Expected UnknownCategory, got {other:?}"),
    }
}

#[test]
fn test_order_mismatch_names_uncovered_labels() {
    let df = create_survey_dataframe();
    let degree = CategoricalColumn::from_column(df.column("degree").unwrap()).unwrap();
    let spec = CategorySpec {
        mapping: degree_mapping(),
        order: Some(strings(&["HIGH SCHOOL", "COLLEGE/UNIVERSITY"])),
        ..Default::default()
    };

    match map_categories(&degree, &spec).unwrap_err() {
        RecodeError::OrderMismatch { column, missing } => {
            assert_eq!(column, "degree");
            assert_eq!(missing, strings(&["DK"]));
        }
        other => panic!("Expected OrderMismatch, got {other:?}"),
    }
}

#[test]
fn test_two_row_example_end_to_end() {
    let df = df! {
        "degree" => ["BACHELOR", "LT HIGH SCHOOL"],
        "law" => ["TOO MUCH", "DK"],
    }
    .unwrap();

    let mut mapping = CollapseMapping::new();
    mapping.insert("BACHELOR".into(), "COLLEGE/UNIVERSITY".into());
    mapping.insert("LT HIGH SCHOOL".into(), "HIGH SCHOOL".into());

    let plan = RecodePlan {
        columns: vec![
            ColumnRecode::clean(
                "degree",
                CategorySpec {
                    mapping,
                    ..Default::default()
                },
            ),
            ColumnRecode::clean(
                "law",
                CategorySpec {
                    prune: strings(&["DK"]),
                    ..Default::default()
                },
            ),
        ],
        ..Default::default()
    };

    let table = run_recode(&df, &plan, &RecodeOptions::default()).unwrap();

    assert_eq!(
        string_values(table.frame(), "degree_clean"),
        vec![
            Some("COLLEGE/UNIVERSITY".to_string()),
            Some("HIGH SCHOOL".to_string())
        ]
    );
    assert_eq!(
        string_values(table.frame(), "law_clean"),
        vec![Some("TOO MUCH".to_string()), None]
    );
    assert_eq!(table.audit().total_pruned(), 1);
}

#[test]
fn test_decade_examples() {
    let df = df! {
        "year" => [1975i64, 1985, 1995, 2005, 2015, 1969, 2020, 1979, 1989],
    }
    .unwrap();

    let binned = bin_years(&df, "year", &DecadeBins::canonical(), "decade").unwrap();
    let labels: Vec<Option<&str>> = binned.column.iter().collect();

    assert_eq!(
        labels,
        vec![
            Some("1970s"),
            Some("1980s"),
            Some("1990s"),
            Some("2000s"),
            Some("2010s"),
            None,
            None,
            Some("1970s"),
            Some("1980s"),
        ]
    );
    assert_eq!(binned.out_of_range_rows, vec![5, 6]);
    assert_eq!(binned.column.compare(0, 4), Some(Ordering::Less));
}

#[test]
fn test_decade_binning_on_float_years() {
    let df = df! { "year" => [1979.9f64, 1980.0] }.unwrap();
    let binned = bin_years(&df, "year", &DecadeBins::canonical(), "decade").unwrap();
    assert_eq!(binned.column.label(0), Some("1970s"));
    assert_eq!(binned.column.label(1), Some("1980s"));
}

#[test]
fn test_custom_intervals_from_plan() {
    let spec = DecadeSpec {
        source: "year".to_string(),
        output: "era".to_string(),
        intervals: vec![
            DecadeInterval::new(1970, 1990, "early"),
            DecadeInterval::new(1990, 2020, "late"),
        ],
    };
    let bins = spec.bins().unwrap();
    assert_eq!(bins.label_for(1989), Some("early"));
    assert_eq!(bins.label_for(1990), Some("late"));

    let overlapping = DecadeSpec {
        intervals: vec![
            DecadeInterval::new(1970, 1990, "early"),
            DecadeInterval::new(1989, 2020, "late"),
        ],
        ..spec
    };
    assert!(matches!(
        overlapping.bins().unwrap_err(),
        RecodeError::OverlappingIntervals { .. }
    ));
}
