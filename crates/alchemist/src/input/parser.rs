//! CSV/TSV and JSON upload parser with delimiter detection.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::source::{RawTable, SourceMetadata};
use crate::error::{AlchemistError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Extensions read as delimited text.
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt", "psv"];

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
    /// Trim surrounding whitespace from headers and cells.
    pub trim: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
            trim: true,
        }
    }
}

/// Parses uploaded tabular files into [`RawTable`]s.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the table and metadata.
    ///
    /// `.json` files must hold an array of row objects; `.csv`, `.tsv`,
    /// `.txt` and `.psv` are read as delimited text. Anything else,
    /// spreadsheets included, is rejected.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let is_json = extension == "json";
        if !is_json && !DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AlchemistError::UnsupportedFormat(format!(
                "'{}': expected a .csv, .tsv or .json file",
                path.display()
            )));
        }

        let io_err = |e| AlchemistError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        let mut file = File::open(path).map_err(io_err)?;
        let size_bytes = file.metadata().map_err(io_err)?.len();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(io_err)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let (table, format) = if is_json {
            let text = String::from_utf8_lossy(&contents);
            (RawTable::from_json(&text)?, "json".to_string())
        } else {
            let delimiter = match self.config.delimiter {
                Some(d) => d,
                None => detect_delimiter(&contents)?,
            };
            let format = match delimiter {
                b'\t' => "tsv",
                b',' => "csv",
                b';' => "csv-semicolon",
                b'|' => "psv",
                _ => "delimited",
            };
            (self.parse_bytes(&contents, delimiter)?, format.to_string())
        };

        if table.is_empty() {
            return Err(AlchemistError::EmptyData(format!(
                "'{}' has no data rows",
                path.display()
            )));
        }

        debug!(
            "parsed {} as {}: {} rows, {} columns",
            path.display(),
            format,
            table.row_count(),
            table.column_count()
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            table.row_count(),
            table.column_count(),
        );
        Ok((table, metadata))
    }

    /// Parse delimited text, detecting the delimiter unless configured.
    pub fn parse_str(&self, text: &str) -> Result<RawTable> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(text.as_bytes())?,
        };
        self.parse_bytes(text.as_bytes(), delimiter)
    }

    /// Parse bytes with a known delimiter.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| self.clean(s))
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(AlchemistError::EmptyData("No columns found".to_string()));
        }

        let mut records = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            let record = result?;
            // Blank lines come through as a single empty field.
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            records.push(record.iter().map(|s| self.clean(s)).collect());
        }

        Ok(RawTable::from_records(headers, records))
    }

    fn clean(&self, cell: &str) -> String {
        if self.config.trim {
            cell.trim().to_string()
        } else {
            cell.to_string()
        }
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(AlchemistError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance =
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64;

        // Consistent counts dominate; tabs win ties since they rarely occur in values.
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(b"a,b,c\n1,2,3\n4,5,6").unwrap(), b',');
        assert_eq!(detect_delimiter(b"a\tb\tc\n1\t2\t3").unwrap(), b'\t');
        assert_eq!(detect_delimiter(b"a;b\n1;2").unwrap(), b';');
        assert!(detect_delimiter(b"\n\n").is_err());
    }

    #[test]
    fn test_quoted_lists_stay_in_one_cell() {
        let table = Parser::new()
            .parse_str("WorkerID,Skills,AvailableSlots\nW1,\"coding,ml\",\"[1,2,3]\"\n")
            .unwrap();
        assert_eq!(table.headers, vec!["WorkerID", "Skills", "AvailableSlots"]);
        assert_eq!(table.rows[0]["Skills"], json!("coding,ml"));
        assert_eq!(table.rows[0]["AvailableSlots"], json!("[1,2,3]"));
    }

    #[test]
    fn test_blank_lines_skipped_and_cells_trimmed() {
        let table = Parser::new().parse_str("Task ID , Duration\n T1 , 2\n\n,\nT2,3\n").unwrap();
        assert_eq!(table.headers, vec!["Task ID", "Duration"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0]["Task ID"], json!("T1"));
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..Default::default()
        });
        let table = parser.parse_str("a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
