//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gssrecode - Clean, recode and decade-bin categorical survey data
#[derive(Parser, Debug)]
#[command(name = "gssrecode")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to input directory with '_recoded' suffix (e.g., gss.csv -> gss_recoded.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Recode plan (JSON). Defaults to the built-in survey plan.
    #[arg(short, long)]
    pub plan: Option<PathBuf>,

    /// Missing value threshold - drop columns with missing values above this ratio
    /// before incomplete rows are removed. Columns read by the plan are never dropped.
    #[arg(long, value_parser = validate_ratio)]
    pub missing_threshold: Option<f64>,

    /// Extra columns to drop before processing (comma-separated).
    /// Added to the plan's own drop list.
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    /// Skip a column whose recode fails instead of aborting
    #[arg(long, default_value = "false")]
    pub skip_failed_columns: bool,

    /// Write a JSON audit of the run next to the output file
    #[arg(long, default_value = "false")]
    pub export_audit: bool,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the built-in recode plan as JSON, to a file or stdout
    Plan {
        /// Output file path (optional, prints to stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Get the input path, if one was given.
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the output path, deriving from input if not explicitly provided.
    /// The derived path will be in the same directory as the input with a '_recoded' suffix.
    pub fn output_path(&self) -> Option<PathBuf> {
        let input = self.input.as_ref()?;
        Some(self.output.clone().unwrap_or_else(|| {
            let parent = input.parent().unwrap_or_else(|| std::path::Path::new("."));
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let extension = input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("csv");
            parent.join(format!("{}_recoded.{}", stem, extension))
        }))
    }

    /// Get the audit output path, derived from the output file.
    /// The derived path will be next to the output with a '_audit.json' suffix.
    pub fn audit_path(&self) -> Option<PathBuf> {
        let output = self.output_path()?;
        let parent = output.parent().unwrap_or_else(|| std::path::Path::new("."));
        let stem = output.file_stem().and_then(|s| s.to_str())?;
        Some(parent.join(format!("{}_audit.json", stem)))
    }
}

/// Validator for ratio parameters
fn validate_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "missing_threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
