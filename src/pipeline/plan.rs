//! Recode plans: which columns to collapse, order, prune and bin
//!
//! A plan is plain data so it can be stored as JSON next to a dataset.
//! [`RecodePlan::survey_default`] reproduces the recoding of the General
//! Social Survey extract.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::category::{CategorySpec, CollapseMapping};
use super::decade::{DecadeBins, DecadeInterval};
use super::error::RecodeResult;

/// Opinion columns sharing the same ordinal scale
pub const OPINION_COLUMNS: [&str; 3] = ["environment", "law_enforcement", "drugs"];

/// Ordinal scale of the opinion questions, sentinels included
pub const OPINION_ORDER: [&str; 5] = ["TOO LITTLE", "ABOUT RIGHT", "TOO MUCH", "DK", "IAP"];

/// "Don't know" and "inapplicable" answers
pub const OPINION_SENTINELS: [&str; 2] = ["DK", "IAP"];

/// Suffix appended to recoded column names
pub const CLEAN_SUFFIX: &str = "_clean";

/// Recoding of one source column into a new categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecode {
    pub source: String,
    pub output: String,
    #[serde(flatten)]
    pub spec: CategorySpec,
}

impl ColumnRecode {
    /// Recode `source` into `<source>_clean`.
    pub fn clean(source: &str, spec: CategorySpec) -> Self {
        Self {
            source: source.to_string(),
            output: format!("{}{}", source, CLEAN_SUFFIX),
            spec,
        }
    }
}

/// Binning of a numeric year column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeSpec {
    pub source: String,
    pub output: String,
    pub intervals: Vec<DecadeInterval>,
}

impl DecadeSpec {
    /// Validate the intervals into bins.
    pub fn bins(&self) -> RecodeResult<DecadeBins> {
        DecadeBins::new(self.intervals.clone())
    }
}

impl Default for DecadeSpec {
    fn default() -> Self {
        Self {
            source: "year".to_string(),
            output: "decade".to_string(),
            intervals: DecadeBins::canonical().intervals().to_vec(),
        }
    }
}

/// Full description of a recoding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecodePlan {
    /// Columns removed before anything else
    pub drop_columns: Vec<String>,
    /// Categorical recodings, applied in order
    pub columns: Vec<ColumnRecode>,
    /// Optional year binning
    pub decade: Option<DecadeSpec>,
    /// Treat every other text column as an unordered categorical
    pub categorize_remaining: bool,
}

impl RecodePlan {
    /// The General Social Survey recoding.
    pub fn survey_default() -> Self {
        let mut columns = Vec::with_capacity(5);

        columns.push(ColumnRecode::clean(
            "labor_status",
            CategorySpec {
                mapping: mapping(&[
                    ("UNEMPL, LAID OFF", "UNEMPLOYED"),
                    ("TEMP NOT WORKING", "UNEMPLOYED"),
                    ("WORKING FULLTIME", "EMPLOYED"),
                    ("WORKING PARTTIME", "EMPLOYED"),
                ]),
                ..Default::default()
            },
        ));

        for column in OPINION_COLUMNS {
            columns.push(ColumnRecode::clean(
                column,
                CategorySpec {
                    order: Some(to_strings(&OPINION_ORDER)),
                    prune: to_strings(&OPINION_SENTINELS),
                    ..Default::default()
                },
            ));
        }

        columns.push(ColumnRecode::clean(
            "degree",
            CategorySpec {
                mapping: mapping(&[
                    ("LT HIGH SCHOOL", "HIGH SCHOOL"),
                    ("BACHELOR", "COLLEGE/UNIVERSITY"),
                    ("GRADUATE", "COLLEGE/UNIVERSITY"),
                    ("JUNIOR COLLEGE", "COLLEGE/UNIVERSITY"),
                ]),
                order: Some(to_strings(&["HIGH SCHOOL", "COLLEGE/UNIVERSITY"])),
                prune: to_strings(&["DK"]),
                ..Default::default()
            },
        ));

        Self {
            // Mostly empty in the survey extract
            drop_columns: vec!["inequality".to_string()],
            columns,
            decade: Some(DecadeSpec::default()),
            categorize_remaining: true,
        }
    }

    /// Load a plan from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse plan file: {}", path.display()))
    }

    /// Serialize the plan as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize plan")
    }

    /// Source columns the plan reads. These are never screened out as sparse.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = self.columns.iter().map(|c| c.source.clone()).collect();
        if let Some(decade) = &self.decade {
            names.push(decade.source.clone());
        }
        names.sort();
        names.dedup();
        names
    }
}

fn mapping(pairs: &[(&str, &str)]) -> CollapseMapping {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
