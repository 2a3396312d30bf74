//! gssrecode: Categorical Recoding CLI Tool
//!
//! A command-line tool that cleans a survey extract, recodes its categorical
//! columns and bins survey years into decades.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use gssrecode::cli::{confirm_drop_columns, Cli, Commands};
use gssrecode::pipeline::{
    analyze_missing_values, get_columns_above_threshold, load_dataset_with_progress, run_recode,
    save_dataset, RecodeOptions, RecodePlan,
};
use gssrecode::report::{export_audit_json, print_value_counts, ExportParams, RecodeSummary};
use gssrecode::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_count,
    print_info, print_step_header, print_success, print_warning,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Plan { output } => write_default_plan(output.as_deref()),
        };
    }

    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;
    let output_path = cli
        .output_path()
        .ok_or_else(|| anyhow::anyhow!("Could not derive an output path from the input"))?;

    let mut plan = match &cli.plan {
        Some(path) => RecodePlan::from_json_file(path)?,
        None => RecodePlan::survey_default(),
    };
    for column in &cli.drop_columns {
        if !plan.drop_columns.contains(column) {
            plan.drop_columns.push(column.clone());
        }
    }

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, &output_path, cli.plan.as_deref(), cli.missing_threshold);

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(input, cli.infer_schema_length)?;

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);

    let mut summary = RecodeSummary::new(cols);
    summary.set_load_time(step_start.elapsed());

    // Step 2: Column screening
    print_step_header(2, "Column Screening");
    let mut to_drop: Vec<String> = plan
        .drop_columns
        .iter()
        .filter(|c| df.get_column_names().iter().any(|n| n.as_str() == c.as_str()))
        .cloned()
        .collect();
    for missing in plan.drop_columns.iter().filter(|c| !to_drop.contains(*c)) {
        print_warning(&format!("Column '{}' not in dataset, nothing to drop", missing));
    }
    if let Some(threshold) = cli.missing_threshold {
        let ratios = analyze_missing_values(&df)?;
        for column in get_columns_above_threshold(&ratios, threshold, &plan.referenced_columns()) {
            if !to_drop.contains(&column) {
                to_drop.push(column);
            }
        }
    }

    if to_drop.is_empty() {
        print_info("No columns to drop");
    } else {
        print_count("column(s) to drop", to_drop.len(), Some(&format!("({})", to_drop.join(", "))));
        if !cli.no_confirm && !confirm_drop_columns(&to_drop)? {
            println!("Cancelled by user.");
            return Ok(());
        }
    }
    // The confirmed list replaces both the plan's drops and threshold screening
    plan.drop_columns = to_drop;

    // Step 3: Recode
    print_step_header(3, "Filter and Recode");
    let step_start = Instant::now();
    let spinner = create_spinner("Recoding categories...");
    let options = RecodeOptions {
        missing_threshold: None,
        skip_failed_columns: cli.skip_failed_columns,
    };
    let table = run_recode(&df, &plan, &options)?;
    finish_with_success(&spinner, "Recoding complete");

    if !table.audit().dropped_columns.is_empty() {
        print_success("Dropped screened columns");
    }

    let audit = table.audit();
    print_count(
        "incomplete row(s) dropped",
        audit.rows_dropped(),
        Some(&format!("({} remain)", audit.rows_after)),
    );
    for pruned in audit.pruned.iter().filter(|p| p.rows > 0) {
        print_count(
            "value(s) pruned",
            pruned.rows,
            Some(&format!("({})", pruned.column)),
        );
    }
    if audit.out_of_range_years > 0 {
        print_count("year(s) outside every decade", audit.out_of_range_years, None);
    }
    for skipped in &audit.skipped {
        print_warning(&format!("Skipped '{}': {}", skipped.column, skipped.reason));
    }
    summary.set_recode_time(step_start.elapsed());

    let recoded: Vec<&str> = plan
        .columns
        .iter()
        .map(|c| c.output.as_str())
        .chain(plan.decade.as_ref().map(|d| d.output.as_str()))
        .collect();
    print_value_counts(&table, &recoded);

    // Step 4: Save output
    print_step_header(4, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output file...");
    if cli.export_audit {
        let audit_path = cli
            .audit_path()
            .ok_or_else(|| anyhow::anyhow!("Could not derive an audit path from the output"))?;
        let input_file = input.display().to_string();
        let plan_file = cli.plan.as_ref().map(|p| p.display().to_string());
        export_audit_json(
            &table,
            &audit_path,
            &ExportParams {
                input_file: &input_file,
                plan_file: plan_file.as_deref(),
                missing_threshold: cli.missing_threshold,
            },
        )?;
        print_success(&format!("Audit written to {}", audit_path.display()));
    }

    summary.set_result(&table);
    let mut frame = table.into_frame();
    save_dataset(&mut frame, &output_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));
    summary.set_save_time(step_start.elapsed());

    summary.display();
    print_completion();

    Ok(())
}

/// Write the built-in plan as JSON to a file or stdout
fn write_default_plan(output: Option<&std::path::Path>) -> Result<()> {
    let json = RecodePlan::survey_default().to_json_string()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            print_success(&format!("Plan written to {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}
