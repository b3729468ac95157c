//! Inspect command - show classification and header mapping for one file.

use std::path::PathBuf;

use alchemist::inference::ClassificationMethod;
use alchemist::EntityType;
use colored::Colorize;

use super::{build_alchemist, Options};

pub fn run(file: PathBuf, json_output: bool, options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let alchemist = build_alchemist(options)?;
    let (table, source) = alchemist.parse_file(&file)?;
    let classification = alchemist.classify(&table.headers);

    // Unresolved tables are shown against their closest schema.
    let entity = match (classification.entity, &classification.candidate) {
        (EntityType::Unknown, Some(candidate)) => candidate.entity,
        (entity, _) => entity,
    };
    let mapping = alchemist.map_headers(&table.headers, entity);

    if json_output {
        let report = serde_json::json!({
            "source": source,
            "classification": classification,
            "mapping": mapping,
            "missingFields": mapping.missing_fields(),
            "suggestions": mapping.suggestions(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} ({}, {} rows, {} columns)",
        "Inspecting".cyan().bold(),
        source.file.white(),
        source.format,
        source.row_count,
        source.column_count
    );
    if options.verbose {
        println!("  hash: {}", source.hash);
    }
    println!();

    let method = match classification.method {
        ClassificationMethod::Keyword => "keywords",
        ClassificationMethod::Similarity => "header similarity",
        ClassificationMethod::Unresolved => "unresolved",
    };
    if classification.method == ClassificationMethod::Unresolved {
        println!(
            "Entity: {} (closest schema: {})",
            "unknown".red().bold(),
            entity.to_string().yellow()
        );
    } else {
        println!("Entity: {} (by {})", entity.to_string().green().bold(), method);
    }
    println!(
        "Mapping: {} of {} headers, average confidence {:.2}",
        mapping.mapped_count,
        mapping.mapping.len(),
        mapping.average_score
    );
    println!();

    for (header, entry) in mapping.mapping.iter() {
        let target = match &entry.field {
            Some(field) => field.green().to_string(),
            None => "(unmapped)".dimmed().to_string(),
        };
        println!("  {:24} -> {:24} {:.2}", header, target, entry.score);
    }

    let suggestions = mapping.suggestions();
    if !suggestions.is_empty() {
        println!();
        println!("{}", "Suggestions:".yellow().bold());
        for suggestion in suggestions {
            println!("  - {}", suggestion);
        }
    }

    Ok(())
}
