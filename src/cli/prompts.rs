//! Interactive prompts using dialoguer

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Prompt user to confirm dropping the screened columns
pub fn confirm_drop_columns(columns: &[String]) -> Result<bool> {
    let message = format!(
        "Drop {} column(s) before recoding ({})?",
        columns.len(),
        columns.join(", ")
    );
    confirm_step(&message)
}
