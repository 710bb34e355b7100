//! Result display.

use colored::Colorize;
use reconcile::ReconcileResult;

/// Print the result record as pretty JSON.
pub fn print_json(result: &ReconcileResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

/// Print the result record with a colorized diff.
pub fn print_result(result: &ReconcileResult) {
    println!();
    println!("{}", result.name.bold());

    let status = match result.result {
        Some(true) => "yes".green(),
        Some(false) => "no".red(),
        None => "none".yellow(),
    };
    println!("  {}: {status}", "Result".dimmed());
    println!("  {}: {}", "Comment".dimmed(), result.comment);

    if let Some(diff) = &result.changes.diff {
        println!("  {}:", "Diff".dimmed());
        for line in diff.lines() {
            let line = match line.chars().next() {
                Some('+') => line.green().to_string(),
                Some('-') => line.red().to_string(),
                Some('@') => line.cyan().to_string(),
                _ => line.to_string(),
            };
            println!("    {line}");
        }
    }

    if let Some(loaded) = &result.changes.loaded {
        println!("  {}:", "Loaded configuration".dimmed());
        for line in loaded.lines() {
            println!("    {}", line.dimmed());
        }
    }
}
