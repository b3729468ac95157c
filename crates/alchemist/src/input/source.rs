//! Raw uploaded tables and their metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlchemistError, Result};
use crate::schema::Row;

/// Metadata about an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, json, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// A table as uploaded: raw headers and rows keyed by those headers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers in file order.
    pub headers: Vec<String>,
    /// Rows keyed by raw header.
    pub rows: Vec<Row>,
}

impl RawTable {
    /// Create a table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from string cells, padding short records and dropping
    /// cells beyond the header count.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| {
                let mut cells = record.into_iter();
                headers
                    .iter()
                    .map(|h| (h.clone(), Value::String(cells.next().unwrap_or_default())))
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse a JSON array of row objects.
    ///
    /// Headers are the keys of all objects in first-seen order. Entries that
    /// are not objects are skipped with a warning.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value)
    }

    /// Like [`from_json`](Self::from_json) for an already parsed value.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Array(entries) = value else {
            return Err(AlchemistError::UnsupportedFormat(
                "expected a JSON array of row objects".to_string(),
            ));
        };

        let mut headers: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let Value::Object(object) = entry else {
                warn!("skipping row {}: not a key-value record", index + 1);
                continue;
            };
            let row: Row = object.into_iter().collect();
            for key in row.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_pads_and_truncates() {
        let table = RawTable::from_records(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["1".to_string()], vec!["1".to_string(), "2".to_string(), "3".to_string()]],
        );
        assert_eq!(table.rows[0]["b"], json!(""));
        assert_eq!(table.rows[1].len(), 2);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_from_json_skips_malformed_rows() {
        let table = RawTable::from_json(r#"[{"TaskID": "T1", "Duration": 2}, 7, null, {"TaskID": "T2", "Notes": "x"}]"#).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.headers, vec!["TaskID", "Duration", "Notes"]);
        assert_eq!(table.rows[0]["Duration"], json!(2));
    }

    #[test]
    fn test_from_json_requires_array() {
        assert!(matches!(
            RawTable::from_json(r#"{"TaskID": "T1"}"#),
            Err(AlchemistError::UnsupportedFormat(_))
        ));
        assert!(RawTable::from_json("not json").is_err());
    }
}
