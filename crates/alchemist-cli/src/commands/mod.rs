//! CLI command implementations.

pub mod apply;
pub mod inspect;
pub mod validate;

use std::path::{Path, PathBuf};

use alchemist::{
    Alchemist, AlchemistConfig, IngestOutcome, MockAdvisor, OpenAIAdvisor, RulesConfig, Session,
};
use colored::Colorize;

use crate::cli::AdvisorChoice;

/// Settings shared by every command.
pub struct Options {
    pub config: Option<PathBuf>,
    pub advisor: AdvisorChoice,
    pub verbose: bool,
}

/// Build the engine from the config file and advisor choice.
pub fn build_alchemist(options: &Options) -> Result<Alchemist, Box<dyn std::error::Error>> {
    let config = match &options.config {
        Some(path) => AlchemistConfig::from_path(path)?,
        None => AlchemistConfig::default(),
    };
    let advisor_config = config.advisor.clone();
    let alchemist = Alchemist::with_config(config);

    Ok(match options.advisor {
        AdvisorChoice::None => alchemist,
        AdvisorChoice::Mock => alchemist.with_advisor(MockAdvisor::new().with_config(advisor_config)),
        AdvisorChoice::OpenAI => {
            alchemist.with_advisor(OpenAIAdvisor::from_env_with_config(advisor_config)?)
        }
    })
}

/// Load a rules file, or default rules when none is given.
pub fn load_rules(path: Option<&Path>) -> Result<RulesConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(RulesConfig::from_path(path)?),
        None => Ok(RulesConfig::default()),
    }
}

/// Ingest every file into a new session, reporting each outcome.
///
/// Files that could not be classified are left pending; the caller decides
/// whether that is fatal.
pub fn load_session(
    alchemist: &Alchemist,
    files: &[PathBuf],
    quiet: bool,
) -> Result<Session, Box<dyn std::error::Error>> {
    let mut session = Session::new();
    for file in files {
        if !file.exists() {
            return Err(format!("File not found: {}", file.display()).into());
        }
        let outcome = alchemist.ingest_file(&mut session, file)?;
        if quiet {
            continue;
        }
        match outcome {
            IngestOutcome::Applied {
                entity,
                rows,
                mapping,
            } => println!(
                "{} {} as {} ({} rows, {} of {} headers mapped)",
                "Loaded".green().bold(),
                file.display().to_string().white(),
                entity.to_string().cyan(),
                rows,
                mapping.mapped_count,
                mapping.mapping.len()
            ),
            IngestOutcome::Pending { id, candidate } => {
                let hint = candidate
                    .map(|c| format!(" (closest: {}, avg {:.2})", c.entity, c.average_score))
                    .unwrap_or_default();
                println!(
                    "{} {} could not be classified; pending mapping #{}{}",
                    "Skipped".yellow().bold(),
                    file.display().to_string().white(),
                    id,
                    hint
                );
            }
        }
    }
    Ok(session)
}

/// Paths of files left pending in `session`.
pub fn pending_sources(session: &Session) -> Vec<String> {
    session
        .pending()
        .map(|p| p.source.clone().unwrap_or_else(|| format!("#{}", p.id)))
        .collect()
}
