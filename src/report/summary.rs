//! Recode summary report generation

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{ColumnKind, RecodeAudit, RecodedTable};

/// Summary of a recoding run
#[derive(Debug, Default)]
pub struct RecodeSummary {
    pub initial_columns: usize,
    pub final_columns: usize,
    pub audit: RecodeAudit,
    pub load_time: Option<Duration>,
    pub recode_time: Option<Duration>,
    pub save_time: Option<Duration>,
}

impl RecodeSummary {
    pub fn new(initial_columns: usize) -> Self {
        Self {
            initial_columns,
            final_columns: initial_columns,
            ..Default::default()
        }
    }

    /// Record the outcome of the recode step
    pub fn set_result(&mut self, table: &RecodedTable) {
        self.final_columns = table.frame().width();
        self.audit = table.audit().clone();
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = Some(elapsed);
    }

    pub fn set_recode_time(&mut self, elapsed: Duration) {
        self.recode_time = Some(elapsed);
    }

    pub fn set_save_time(&mut self, elapsed: Duration) {
        self.save_time = Some(elapsed);
    }

    /// Build the metric table shown by [`display`](Self::display)
    pub fn to_table(&self) -> Table {
        let audit = &self.audit;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Initial Columns"),
            Cell::new(self.initial_columns),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped Columns"),
            Cell::new(audit.dropped_columns.len()).fg(highlight(audit.dropped_columns.len())),
        ]);
        table.add_row(vec![Cell::new("📄 Rows Loaded"), Cell::new(audit.rows_before)]);
        table.add_row(vec![
            Cell::new("✂️  Incomplete Rows Dropped"),
            Cell::new(audit.rows_dropped()).fg(highlight(audit.rows_dropped())),
        ]);
        table.add_row(vec![
            Cell::new("🚫 Values Pruned"),
            Cell::new(audit.total_pruned()).fg(highlight(audit.total_pruned())),
        ]);
        table.add_row(vec![
            Cell::new("📅 Years Out Of Range"),
            Cell::new(audit.out_of_range_years).fg(highlight(audit.out_of_range_years)),
        ]);
        table.add_row(vec![
            Cell::new("⏭️  Skipped Columns"),
            Cell::new(audit.skipped.len()).fg(highlight(audit.skipped.len())),
        ]);
        table.add_row(vec![
            Cell::new("✅ Final Rows"),
            Cell::new(audit.rows_after)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("✅ Final Columns"),
            Cell::new(self.final_columns)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        let total = [self.load_time, self.recode_time, self.save_time]
            .iter()
            .flatten()
            .sum::<Duration>();
        if total > Duration::ZERO {
            table.add_row(vec![
                Cell::new("⏱️  Total Time"),
                Cell::new(format!("{:.2}s", total.as_secs_f64())),
            ]);
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RECODE SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        // Indent the table
        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        let audit = &self.audit;
        if !audit.dropped_columns.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Dropped Columns").yellow(),
                style(format!("({})", audit.dropped_columns.len())).dim()
            );
            for column in &audit.dropped_columns {
                println!("        {} {}", style("•").dim(), column);
            }
        }

        if !audit.skipped.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Skipped Columns").red(),
                style(format!("({})", audit.skipped.len())).dim()
            );
            for skipped in &audit.skipped {
                println!(
                    "        {} {} {}",
                    style("•").dim(),
                    skipped.column,
                    style(&skipped.reason).dim()
                );
            }
        }
    }
}

fn highlight(count: usize) -> Color {
    if count == 0 {
        Color::White
    } else {
        Color::Red
    }
}

/// Value counts of one categorical column as a table, in domain order
pub fn value_counts_table(table: &RecodedTable, column: &str) -> Option<Table> {
    let kind = table.column_kind(column)?;
    let counts = table.value_counts(column).ok()?;
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    let mut out = Table::new();
    out.load_preset(UTF8_FULL_CONDENSED);
    out.set_header(vec![
        Cell::new(format!("{} ({})", column, kind.describe())).add_attribute(Attribute::Bold),
        Cell::new("Count").add_attribute(Attribute::Bold),
        Cell::new("Share").add_attribute(Attribute::Bold),
    ]);
    for (label, count) in counts {
        let share = if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        out.add_row(vec![
            Cell::new(label),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}%", share)).set_alignment(CellAlignment::Right),
        ]);
    }
    Some(out)
}

/// Print value counts of every recoded categorical column
pub fn print_value_counts(table: &RecodedTable, columns: &[&str]) {
    for column in columns {
        if !matches!(table.column_kind(column), Some(ColumnKind::Categorical { .. })) {
            continue;
        }
        if let Some(counts) = value_counts_table(table, column) {
            println!();
            for line in counts.to_string().lines() {
                println!("    {}", line);
            }
        }
    }
}
