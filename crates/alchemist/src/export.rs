//! Writing tables to CSV and rules to JSON.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use log::info;

use crate::error::{AlchemistError, Result};
use crate::rules::RulesConfig;
use crate::schema::{display_value, EntityType, Row};
use crate::session::Session;

/// File name for the exported rules.
pub const RULES_FILE: &str = "rules.json";

/// Write rows as CSV.
///
/// The header is the union of row keys in first-seen order; cells a row does
/// not have are written empty. Arrays are joined with `,`.
pub fn write_csv<W: Write>(rows: &[Row], writer: W) -> Result<()> {
    let columns: IndexSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&columns)?;
    for row in rows {
        csv_writer.write_record(
            columns
                .iter()
                .map(|c| row.get(*c).map(display_value).unwrap_or_default()),
        )?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the rules configuration as pretty JSON.
pub fn write_rules_json<W: Write>(config: &RulesConfig, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, config)?;
    Ok(())
}

/// Export every non-empty table and the rules into `dir`.
///
/// Refused unless [`Session::export_check`] passes. Tables are written as
/// `<entity>.csv`; the rules always go to `rules.json`. Returns the written
/// paths in order.
pub fn export_all(session: &Session, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    session.export_check()?;

    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| AlchemistError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::new();
    for entity in EntityType::ALL {
        let rows = session.data().rows(entity);
        if rows.is_empty() {
            continue;
        }
        let path = dir.join(format!("{}.csv", entity));
        write_csv(rows, BufWriter::new(create(&path)?))?;
        info!("wrote {} {} row(s) to {}", rows.len(), entity, path.display());
        written.push(path);
    }

    let path = dir.join(RULES_FILE);
    let mut writer = BufWriter::new(create(&path)?);
    write_rules_json(session.rules(), &mut writer)?;
    writer.flush().map_err(|e| AlchemistError::Io {
        path: path.clone(),
        source: e,
    })?;
    written.push(path);

    Ok(written)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| AlchemistError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_write_csv_union_header() {
        let rows = vec![
            row(&[("TaskID", json!("T1")), ("Duration", json!(2))]),
            row(&[("TaskID", json!("T2")), ("RequiredSkills", json!(["ml", "etl"]))]),
        ];
        let mut out = Vec::new();
        write_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "TaskID,Duration,RequiredSkills\nT1,2,\nT2,,\"ml,etl\"\n");
    }

    #[test]
    fn test_write_rules_json_field_names() {
        let config = RulesConfig::new()
            .with_rule(Rule::co_run(["T1", "T2"]))
            .with_rule(Rule::load_limit("Ops", 3));
        let mut out = Vec::new();
        write_rules_json(&config, &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["rules"][0], json!({"type": "coRun", "tasks": ["T1", "T2"]}));
        assert_eq!(value["rules"][1]["workerGroup"], json!("Ops"));
        assert_eq!(value["rules"][1]["maxSlotsPerPhase"], json!(3));
        assert_eq!(value["priorities"]["priorityWeight"], json!(1.0));
    }

    #[test]
    fn test_export_all() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new();
        session.load_table(
            EntityType::Clients,
            vec![row(&[("ClientID", json!("C1")), ("PriorityLevel", json!(3))])],
        );

        let written = export_all(&session, dir.path()).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["clients.csv", "rules.json"]);

        let clients = std::fs::read_to_string(dir.path().join("clients.csv")).unwrap();
        assert_eq!(clients, "ClientID,PriorityLevel\nC1,3\n");
    }

    #[test]
    fn test_export_all_blocked() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new();
        session.load_table(
            EntityType::Clients,
            vec![row(&[("ClientID", json!("C1")), ("PriorityLevel", json!(9))])],
        );
        let err = export_all(&session, dir.path().join("out")).unwrap_err();
        assert!(matches!(err, AlchemistError::ExportBlocked(_)));
        assert!(!dir.path().join("out").exists());
    }
}
