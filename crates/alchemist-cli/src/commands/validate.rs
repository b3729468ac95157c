//! Validate command - load files and report every problem found.

use std::path::PathBuf;

use alchemist::{EntityType, ValidationError};
use colored::Colorize;

use super::{build_alchemist, load_rules, load_session, pending_sources, Options};

pub fn run(
    files: Vec<PathBuf>,
    rules: Option<PathBuf>,
    json_output: bool,
    options: &Options,
) -> Result<(), Box<dyn std::error::Error>> {
    let alchemist = build_alchemist(options)?;
    let mut session = load_session(&alchemist, &files, json_output)?;
    session.set_rules(load_rules(rules.as_deref())?);

    let report = session.validate();
    let rule_problems = session.rule_problems();
    let pending = pending_sources(&session);

    if json_output {
        let output = serde_json::json!({
            "validation": report,
            "ruleProblems": rule_problems,
            "pending": pending,
            "rows": {
                "clients": session.data().clients().len(),
                "workers": session.data().workers().len(),
                "tasks": session.data().tasks().len(),
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        for entity in EntityType::KNOWN {
            let errors: Vec<ValidationError> = report
                .errors()
                .into_iter()
                .filter(|e| e.entity() == entity)
                .collect();
            let rows = session.data().rows(entity).len();
            if rows == 0 {
                continue;
            }
            if errors.is_empty() {
                println!("{} {} ({} rows)", "✓".green(), entity, rows);
                continue;
            }
            println!("{} {} ({} rows, {} errors)", "✗".red(), entity, rows, errors.len());
            for error in errors {
                match error {
                    ValidationError::Cell { row, field, message, .. } => {
                        println!("    row {:<5} {:20} {}", row + 1, field, message)
                    }
                    ValidationError::Summary { message, .. } => println!("    {}", message),
                }
            }
        }

        if !rule_problems.is_empty() {
            println!();
            println!("{}", "Rule and feasibility problems:".yellow().bold());
            for problem in &rule_problems {
                println!("  - {}", problem);
            }
        }
    }

    let total = report.error_count() + rule_problems.len();
    if !pending.is_empty() {
        return Err(format!("Could not classify: {}", pending.join(", ")).into());
    }
    if total > 0 {
        return Err(format!("{} problem(s) found", total).into());
    }
    if !json_output {
        println!();
        println!("{}", "No problems found.".green().bold());
    }
    Ok(())
}
