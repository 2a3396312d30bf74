//! Read-only views over a recoded table
//!
//! [`RecodedTable`] is what chart rendering consumes: the recoded frame,
//! the declared kind of every column, and the aggregations the charts are
//! built from. Categorical aggregations follow domain order, so ordinal
//! columns come out in rank order rather than alphabetically.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;

use super::category::{CategoricalColumn, CategoryDomain};
use super::error::{RecodeError, RecodeResult};
use super::recode::RecodeAudit;

/// Declared type of a column handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Categorical { domain: CategoryDomain },
}

impl ColumnKind {
    /// Short name used in reports
    pub fn describe(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Categorical { domain } if domain.is_ordered() => "categorical (ordered)",
            ColumnKind::Categorical { .. } => "categorical",
        }
    }
}

/// Frequency table of two categorical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crosstab {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `counts[row][col]`
    pub counts: Vec<Vec<usize>>,
}

impl Crosstab {
    pub fn get(&self, row: &str, col: &str) -> Option<usize> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.col_labels.iter().position(|l| l == col)?;
        Some(self.counts[r][c])
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Share of one label within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupShare {
    pub group: String,
    pub label: String,
    pub proportion: f64,
}

/// Group labels plus each row's group index.
struct Groups {
    labels: Vec<String>,
    rows: Vec<Option<usize>>,
}

/// The finalized table with its column kinds and the audit of how it was built.
#[derive(Debug, Clone)]
pub struct RecodedTable {
    frame: DataFrame,
    kinds: BTreeMap<String, ColumnKind>,
    audit: RecodeAudit,
}

impl RecodedTable {
    pub fn new(frame: DataFrame, kinds: BTreeMap<String, ColumnKind>, audit: RecodeAudit) -> Self {
        Self { frame, kinds, audit }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn kinds(&self) -> &BTreeMap<String, ColumnKind> {
        &self.kinds
    }

    pub fn audit(&self) -> &RecodeAudit {
        &self.audit
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_kind(&self, name: &str) -> Option<&ColumnKind> {
        self.kinds.get(name)
    }

    /// Names of categorical columns, in name order.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.kinds
            .iter()
            .filter(|(_, kind)| matches!(kind, ColumnKind::Categorical { .. }))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Rebuild a categorical column against its declared domain.
    pub fn categorical(&self, name: &str) -> RecodeResult<CategoricalColumn> {
        let domain = match self.kinds.get(name) {
            Some(ColumnKind::Categorical { domain }) => domain.clone(),
            Some(_) => return Err(RecodeError::NotCategorical(name.to_string())),
            None => return Err(RecodeError::ColumnNotFound(name.to_string())),
        };
        let column = self.column(name)?.cast(&DataType::String)?;
        let labels = column.str()?;
        Ok(CategoricalColumn::encode(name, domain, labels.into_iter()))
    }

    /// Row counts per label in domain order, zero counts included.
    pub fn value_counts(&self, name: &str) -> RecodeResult<Vec<(String, usize)>> {
        Ok(self.categorical(name)?.value_counts())
    }

    /// Mean of a numeric column per group. Groups without values get `None`.
    pub fn group_mean(&self, by: &str, value: &str) -> RecodeResult<Vec<(String, Option<f64>)>> {
        let groups = self.groups(by)?;
        let values = self.numeric_values(value)?;

        let mut sums = vec![0.0f64; groups.labels.len()];
        let mut counts = vec![0usize; groups.labels.len()];
        for (group, value) in groups.rows.iter().zip(values) {
            if let (Some(g), Some(v)) = (group, value) {
                sums[*g] += v;
                counts[*g] += 1;
            }
        }

        Ok(groups
            .labels
            .into_iter()
            .zip(sums.into_iter().zip(counts))
            .map(|(label, (sum, count))| (label, (count > 0).then(|| sum / count as f64)))
            .collect())
    }

    /// Frequency table of two columns. Rows missing either value are skipped.
    pub fn crosstab(&self, rows: &str, cols: &str) -> RecodeResult<Crosstab> {
        let row_groups = self.groups(rows)?;
        let col_groups = self.groups(cols)?;

        let mut counts = vec![vec![0usize; col_groups.labels.len()]; row_groups.labels.len()];
        for (r, c) in row_groups.rows.iter().zip(&col_groups.rows) {
            if let (Some(r), Some(c)) = (r, c) {
                counts[*r][*c] += 1;
            }
        }

        Ok(Crosstab {
            row_labels: row_groups.labels,
            col_labels: col_groups.labels,
            counts,
        })
    }

    /// Share of each label of `column` within each group of `group`.
    ///
    /// Groups come in group order; within a group, shares are sorted
    /// descending. Labels with no rows in a group are omitted.
    pub fn normalized_counts(&self, group: &str, column: &str) -> RecodeResult<Vec<GroupShare>> {
        let table = self.crosstab(group, column)?;
        let mut shares = Vec::new();

        for (group_label, counts) in table.row_labels.iter().zip(&table.counts) {
            let total: usize = counts.iter().sum();
            if total == 0 {
                continue;
            }
            let mut group_shares: Vec<GroupShare> = table
                .col_labels
                .iter()
                .zip(counts)
                .filter(|(_, count)| **count > 0)
                .map(|(label, count)| GroupShare {
                    group: group_label.clone(),
                    label: label.clone(),
                    proportion: *count as f64 / total as f64,
                })
                .collect();
            group_shares.sort_by(|a, b| b.proportion.total_cmp(&a.proportion));
            shares.extend(group_shares);
        }

        Ok(shares)
    }

    fn column(&self, name: &str) -> RecodeResult<&Column> {
        self.frame
            .column(name)
            .map_err(|_| RecodeError::ColumnNotFound(name.to_string()))
    }

    fn numeric_values(&self, name: &str) -> RecodeResult<Vec<Option<f64>>> {
        let column = self.column(name)?;
        if !column.dtype().is_primitive_numeric() {
            return Err(RecodeError::NotNumeric {
                column: name.to_string(),
                dtype: column.dtype().to_string(),
            });
        }
        let floats = column.cast(&DataType::Float64)?;
        Ok(floats.f64()?.into_iter().collect())
    }

    /// Grouping keys for a column: domain order for categoricals, ascending
    /// value order for numbers, sorted distinct labels for text.
    fn groups(&self, name: &str) -> RecodeResult<Groups> {
        match self.kinds.get(name) {
            Some(ColumnKind::Categorical { .. }) => {
                let column = self.categorical(name)?;
                Ok(Groups {
                    labels: column.domain().labels().to_vec(),
                    rows: column.codes().iter().map(|c| c.map(|c| c as usize)).collect(),
                })
            }
            Some(ColumnKind::Numeric) => {
                let values = self.numeric_values(name)?;
                let mut distinct: Vec<f64> = values.iter().flatten().copied().collect();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup();
                let rows = values
                    .iter()
                    .map(|v| v.and_then(|v| distinct.binary_search_by(|d| d.total_cmp(&v)).ok()))
                    .collect();
                Ok(Groups {
                    labels: distinct.into_iter().map(format_number).collect(),
                    rows,
                })
            }
            Some(ColumnKind::Text) => {
                let column = CategoricalColumn::from_column(self.column(name)?)?;
                Ok(Groups {
                    labels: column.domain().labels().to_vec(),
                    rows: column.codes().iter().map(|c| c.map(|c| c as usize)).collect(),
                })
            }
            None => Err(RecodeError::ColumnNotFound(name.to_string())),
        }
    }
}

/// Whole numbers print without a fractional part ("1998", not "1998.0").
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RecodedTable {
        let frame = df! {
            "decade" => [Some("1970s"), Some("1980s"), Some("1970s"), None],
            "household_size" => [2.0f64, 4.0, 3.0, 5.0],
            "year" => [1975i64, 1985, 1975, 2020],
            "marital_status" => ["MARRIED", "NEVER MARRIED", "NEVER MARRIED", "MARRIED"],
        }
        .unwrap();

        let mut kinds = BTreeMap::new();
        kinds.insert(
            "decade".to_string(),
            ColumnKind::Categorical {
                domain: CategoryDomain::ordered(vec![
                    "1970s".to_string(),
                    "1980s".to_string(),
                    "1990s".to_string(),
                ])
                .unwrap(),
            },
        );
        kinds.insert("household_size".to_string(), ColumnKind::Numeric);
        kinds.insert("year".to_string(), ColumnKind::Numeric);
        kinds.insert("marital_status".to_string(), ColumnKind::Text);

        RecodedTable::new(frame, kinds, RecodeAudit::default())
    }

    #[test]
    fn test_value_counts_in_domain_order_with_zeros() {
        let counts = table().value_counts("decade").unwrap();
        assert_eq!(
            counts,
            vec![
                ("1970s".to_string(), 2),
                ("1980s".to_string(), 1),
                ("1990s".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_categorical_columns_lists_only_categoricals() {
        assert_eq!(table().categorical_columns(), vec!["decade"]);
    }

    #[test]
    fn test_value_counts_rejects_numeric_column() {
        let err = table().value_counts("year").unwrap_err();
        assert!(matches!(err, RecodeError::NotCategorical(_)));
    }

    #[test]
    fn test_group_mean_by_decade() {
        let means = table().group_mean("decade", "household_size").unwrap();
        assert_eq!(means[0], ("1970s".to_string(), Some(2.5)));
        assert_eq!(means[1], ("1980s".to_string(), Some(4.0)));
        assert_eq!(means[2], ("1990s".to_string(), None));
    }

    #[test]
    fn test_crosstab_skips_missing() {
        let tab = table().crosstab("decade", "marital_status").unwrap();
        assert_eq!(tab.get("1970s", "MARRIED"), Some(1));
        assert_eq!(tab.get("1970s", "NEVER MARRIED"), Some(1));
        assert_eq!(tab.get("1980s", "NEVER MARRIED"), Some(1));
        assert_eq!(tab.total(), 3);
    }

    #[test]
    fn test_normalized_counts_by_numeric_group() {
        let shares = table().normalized_counts("year", "marital_status").unwrap();
        let groups: Vec<&str> = shares.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(groups, vec!["1975", "1975", "1985", "2020"]);
        assert!((shares[0].proportion - 0.5).abs() < 1e-12);
        assert_eq!(shares[2].label, "NEVER MARRIED");
        assert!((shares[2].proportion - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_column() {
        let err = table().group_mean("nope", "household_size").unwrap_err();
        assert!(matches!(err, RecodeError::ColumnNotFound(_)));
    }
}
