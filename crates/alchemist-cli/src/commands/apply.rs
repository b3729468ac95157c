//! Apply command - apply rules to loaded files and export the result.

use std::path::PathBuf;

use alchemist::export::export_all;
use colored::Colorize;

use super::{build_alchemist, load_rules, load_session, pending_sources, Options};

pub fn run(
    files: Vec<PathBuf>,
    rules: PathBuf,
    out: PathBuf,
    options: &Options,
) -> Result<(), Box<dyn std::error::Error>> {
    let alchemist = build_alchemist(options)?;
    let mut session = load_session(&alchemist, &files, false)?;

    let pending = pending_sources(&session);
    if !pending.is_empty() {
        return Err(format!(
            "Could not classify: {}. Rename their headers and try again.",
            pending.join(", ")
        )
        .into());
    }

    session.set_rules(load_rules(Some(rules.as_path()))?);
    session.apply_rules()?;
    if options.verbose {
        println!(
            "Applied {} rule(s) from {}",
            session.rules().rules.len(),
            rules.display()
        );
    }

    let written = export_all(&session, &out)?;
    println!();
    println!("{} {} file(s) to {}", "Exported".green().bold(), written.len(), out.display());
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}
