//! Categorical columns and the category mapper
//!
//! A [`CategoricalColumn`] stores one code per row pointing into an explicit
//! [`CategoryDomain`]. Every operation returns a new column and rebuilds the
//! codes against the new domain, so a column can never hold a code its domain
//! does not define.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{RecodeError, RecodeResult};

/// Many-to-one relabeling: old label -> new label. Unmapped labels are kept.
pub type CollapseMapping = BTreeMap<String, String>;

/// The finite label set of a categorical column.
///
/// When `ordered` is true the position of a label in `labels` is its rank.
/// Otherwise the order only controls display and grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDomain {
    labels: Vec<String>,
    ordered: bool,
}

impl CategoryDomain {
    /// Create an ordered domain, ranked by position. Fails on duplicate labels.
    pub fn ordered(labels: Vec<String>) -> RecodeResult<Self> {
        Self::build(labels, true)
    }

    fn build(labels: Vec<String>, ordered: bool) -> RecodeResult<Self> {
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(RecodeError::DuplicateLabel {
                    context: "category domain".to_string(),
                    label: label.clone(),
                });
            }
        }
        Ok(Self { labels, ordered })
    }

    /// Domain from labels the caller already guarantees unique.
    pub(crate) fn from_unique(labels: Vec<String>, ordered: bool) -> Self {
        debug_assert!(Self::build(labels.clone(), ordered).is_ok());
        Self { labels, ordered }
    }

    /// Unordered domain made of the distinct labels, sorted lexicographically.
    fn inferred<'a>(labels: impl Iterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = labels.collect();
        Self {
            labels: distinct.into_iter().map(str::to_string).collect(),
            ordered: false,
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of a label in the domain.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }
}

/// A column of labels drawn from a [`CategoryDomain`], with missing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalColumn {
    name: String,
    domain: CategoryDomain,
    codes: Vec<Option<u32>>,
}

impl CategoricalColumn {
    /// Build a column from raw labels. The domain is the sorted set of
    /// distinct present labels and is unordered.
    pub fn from_labels<I, S>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let raw: Vec<Option<String>> = values
            .into_iter()
            .map(|v| v.map(|s| s.as_ref().to_string()))
            .collect();
        let domain = CategoryDomain::inferred(raw.iter().flatten().map(String::as_str));
        Self::encode(name, domain, raw.iter().map(|v| v.as_deref()))
    }

    /// Convert a free-text (or any castable) polars column into a categorical one.
    pub fn from_column(column: &Column) -> RecodeResult<Self> {
        let strings = if column.dtype() == &DataType::String {
            column.clone()
        } else {
            column.cast(&DataType::String)?
        };
        let ca = strings.str()?;
        Ok(Self::from_labels(column.name().as_str(), ca.into_iter()))
    }

    /// Encode labels against a domain. Labels outside the domain become missing.
    pub(crate) fn encode<'a>(
        name: &str,
        domain: CategoryDomain,
        labels: impl Iterator<Item = Option<&'a str>>,
    ) -> Self {
        let index: HashMap<&str, u32> = domain
            .labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i as u32))
            .collect();
        let codes = labels
            .map(|v| v.and_then(|label| index.get(label).copied()))
            .collect();
        Self {
            name: name.to_string(),
            domain,
            codes,
        }
    }

    /// Re-encode this column's labels against another domain.
    fn reencode(&self, domain: CategoryDomain) -> Self {
        Self::encode(&self.name, domain, self.iter())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &CategoryDomain {
        &self.domain
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Label at `row`, `None` when missing or out of bounds.
    pub fn label(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .copied()
            .flatten()
            .map(|code| self.domain.labels[code as usize].as_str())
    }

    /// Iterate row labels in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.codes
            .iter()
            .map(|code| code.map(|c| self.domain.labels[c as usize].as_str()))
    }

    /// Per-row positions into the domain.
    pub fn codes(&self) -> &[Option<u32>] {
        &self.codes
    }

    pub fn missing_count(&self) -> usize {
        self.codes.iter().filter(|c| c.is_none()).count()
    }

    /// Rename the column, keeping domain and values.
    pub fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Distinct labels that occur in at least one row, in domain order.
    pub fn present_labels(&self) -> Vec<&str> {
        let mut present = vec![false; self.domain.len()];
        for code in self.codes.iter().flatten() {
            present[*code as usize] = true;
        }
        self.domain
            .labels
            .iter()
            .zip(present)
            .filter_map(|(label, p)| p.then_some(label.as_str()))
            .collect()
    }

    /// Apply a collapse mapping and re-derive the domain from the result.
    ///
    /// The new domain is unordered: merging labels invalidates any prior rank.
    pub fn collapse(&self, mapping: &CollapseMapping) -> Self {
        let relabeled: Vec<Option<&str>> = self
            .iter()
            .map(|v| v.map(|label| mapping.get(label).map(String::as_str).unwrap_or(label)))
            .collect();
        let domain = CategoryDomain::inferred(relabeled.iter().flatten().copied());
        Self::encode(&self.name, domain, relabeled.into_iter())
    }

    /// Replace the inferred domain with an explicit one.
    ///
    /// Every present label must belong to `labels`; unobserved labels are kept.
    pub fn with_domain(&self, labels: &[String], ordered: bool) -> RecodeResult<Self> {
        let domain = CategoryDomain::build(labels.to_vec(), ordered)?;
        if let Some(label) = self.present_labels().into_iter().find(|l| !domain.contains(l)) {
            return Err(RecodeError::UnknownCategory {
                column: self.name.clone(),
                label: label.to_string(),
            });
        }
        Ok(self.reencode(domain))
    }

    /// Impose a total order (or just a display order when `ordered` is false).
    ///
    /// `order` may name labels that never occur, but it must place every
    /// present label exactly once.
    pub fn reorder(&self, order: &[String], ordered: bool) -> RecodeResult<Self> {
        check_order(&self.name, order, self.present_labels().into_iter())?;
        let domain = CategoryDomain::build(order.to_vec(), ordered)?;
        Ok(self.reencode(domain))
    }

    /// Remove labels from the domain. Rows holding them become missing.
    pub fn remove_categories(&self, prune: &[String]) -> PruneOutcome {
        let prune: HashSet<&str> = prune.iter().map(String::as_str).collect();
        let affected_rows: Vec<usize> = self
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.filter(|l| prune.contains(l)).map(|_| row))
            .collect();

        let domain = CategoryDomain {
            labels: self
                .domain
                .labels
                .iter()
                .filter(|l| !prune.contains(l.as_str()))
                .cloned()
                .collect(),
            ordered: self.domain.ordered,
        };

        if !affected_rows.is_empty() {
            debug!(
                column = %self.name,
                rows = affected_rows.len(),
                "pruned categories set rows to missing"
            );
        }

        PruneOutcome {
            column: self.reencode(domain),
            affected_rows,
        }
    }

    /// Row counts per label, in domain order, including zero counts.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.domain.len()];
        for code in self.codes.iter().flatten() {
            counts[*code as usize] += 1;
        }
        self.domain.labels.iter().cloned().zip(counts).collect()
    }

    /// Compare the values of two rows by declared rank.
    ///
    /// Returns `None` for unordered columns or when either row is missing.
    pub fn compare(&self, a: usize, b: usize) -> Option<Ordering> {
        if !self.domain.ordered {
            return None;
        }
        let a = self.codes.get(a).copied().flatten()?;
        let b = self.codes.get(b).copied().flatten()?;
        Some(a.cmp(&b))
    }

    /// Materialize as a polars string column.
    pub fn to_column(&self) -> Column {
        let values: Vec<Option<&str>> = self.iter().collect();
        Column::new(self.name.as_str().into(), values)
    }
}

/// Result of pruning: the new column plus the rows that lost their value.
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    pub column: CategoricalColumn,
    pub affected_rows: Vec<usize>,
}

impl PruneOutcome {
    pub fn affected_count(&self) -> usize {
        self.affected_rows.len()
    }
}

/// Recoding instructions for one categorical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySpec {
    /// Labels to merge, old -> new
    pub mapping: CollapseMapping,
    /// Explicit final label set; inferred from the data when absent
    pub domain: Option<Vec<String>>,
    /// Total order over the retained labels; makes the column ordinal
    pub order: Option<Vec<String>>,
    /// Sentinel labels to remove
    pub prune: Vec<String>,
}

/// Output of [`map_categories`].
#[derive(Debug, Clone)]
pub struct MappedColumn {
    pub column: CategoricalColumn,
    /// Rows set to missing by pruning
    pub pruned_rows: Vec<usize>,
}

/// Run the category mapper: collapse, validate domain, order, prune.
///
/// The order is checked against the labels that survive pruning, so an
/// order may omit labels that are about to be pruned. Pruned labels are
/// dropped from the order as well. With an explicit domain the order must
/// rank exactly the declared labels that survive pruning.
pub fn map_categories(column: &CategoricalColumn, spec: &CategorySpec) -> RecodeResult<MappedColumn> {
    let mut current = column.collapse(&spec.mapping);

    if let Some(domain) = &spec.domain {
        current = current.with_domain(domain, false)?;
    }

    let pruned: HashSet<&str> = spec.prune.iter().map(String::as_str).collect();

    if let Some(order) = &spec.order {
        let retained: Vec<&str> = match &spec.domain {
            Some(domain) => {
                if let Some(label) = order.iter().find(|l| !domain.contains(l)) {
                    return Err(RecodeError::UnknownCategory {
                        column: current.name.clone(),
                        label: label.clone(),
                    });
                }
                domain.iter().map(String::as_str).collect()
            }
            None => current.present_labels(),
        };
        check_order(
            &current.name,
            order,
            retained.into_iter().filter(|l| !pruned.contains(l)),
        )?;
    }

    let PruneOutcome {
        column: mut current,
        affected_rows,
    } = current.remove_categories(&spec.prune);

    if let Some(order) = &spec.order {
        let order: Vec<String> = order
            .iter()
            .filter(|l| !pruned.contains(l.as_str()))
            .cloned()
            .collect();
        current = current.reorder(&order, true)?;
    }

    Ok(MappedColumn {
        column: current,
        pruned_rows: affected_rows,
    })
}

/// Verify that `order` has no duplicates and places every label in `required`.
fn check_order<'a>(
    column: &str,
    order: &[String],
    required: impl Iterator<Item = &'a str>,
) -> RecodeResult<()> {
    let mut seen = HashSet::with_capacity(order.len());
    let duplicates: Vec<String> = order
        .iter()
        .filter(|l| !seen.insert(l.as_str()))
        .cloned()
        .collect();
    if !duplicates.is_empty() {
        return Err(RecodeError::OrderMismatch {
            column: column.to_string(),
            missing: duplicates,
        });
    }

    let missing: Vec<String> = required
        .filter(|l| !seen.contains(l))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RecodeError::OrderMismatch {
            column: column.to_string(),
            missing,
        })
    }
}
