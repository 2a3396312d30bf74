//! JSON export of a recoding run: what was dropped, pruned and produced

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{ColumnKind, RecodeAudit, RecodedTable};

/// Metadata about the recoding run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// gssrecode version
    pub gssrecode_version: String,
    /// Input file path
    pub input_file: String,
    /// Plan file path, absent for the built-in plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<String>,
    /// Missing value threshold used to screen columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_threshold: Option<f64>,
}

/// One finalized column with its declared kind
#[derive(Serialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
    /// Value counts in domain order; categorical columns only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_counts: Option<Vec<(String, usize)>>,
}

/// Complete audit export
#[derive(Serialize)]
pub struct AuditExport {
    pub metadata: RunMetadata,
    pub audit: RecodeAudit,
    pub columns: Vec<ColumnEntry>,
}

/// Parameters for the audit export metadata
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub plan_file: Option<&'a str>,
    pub missing_threshold: Option<f64>,
}

/// Build the export document for a finished table
pub fn build_audit_export(table: &RecodedTable, params: &ExportParams<'_>) -> AuditExport {
    let columns = table
        .kinds()
        .iter()
        .map(|(name, kind)| ColumnEntry {
            name: name.clone(),
            kind: kind.clone(),
            value_counts: match kind {
                ColumnKind::Categorical { .. } => table.value_counts(name).ok(),
                _ => None,
            },
        })
        .collect();

    AuditExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            gssrecode_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.to_string(),
            plan_file: params.plan_file.map(|s| s.to_string()),
            missing_threshold: params.missing_threshold,
        },
        audit: table.audit().clone(),
        columns,
    }
}

/// Export the audit of a recoding run to a JSON file
pub fn export_audit_json(table: &RecodedTable, output_path: &Path, params: &ExportParams<'_>) -> Result<()> {
    let export = build_audit_export(table, params);

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize audit to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write audit to {}", output_path.display()))?;

    Ok(())
}
