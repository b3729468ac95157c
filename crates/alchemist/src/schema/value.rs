//! Row representation and cell value helpers.
//!
//! Rows stay open string-keyed maps at the boundary. These helpers give every
//! module the same reading of a cell: what counts as empty, as a number, as a
//! list, as a date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A single table row: column name -> cell value, in column order.
pub type Row = IndexMap<String, Value>;

/// Separators accepted between items of a list-valued cell.
static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[,;|]\s*").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// True for null, the empty string, and the empty array.
///
/// This is the one definition of "empty" used across validation and rule
/// evaluation. A missing key is handled by callers via [`is_missing_or_empty`].
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Like [`is_empty_value`] but also true when the key is absent.
pub fn is_missing_or_empty(value: Option<&Value>) -> bool {
    value.map_or(true, is_empty_value)
}

/// Read a cell as a finite number.
///
/// Numbers pass through; strings are trimmed and parsed. Empty strings,
/// `NaN`/`inf`, booleans, arrays and objects are not numbers.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Read a cell as a list of items.
///
/// Arrays are taken element-wise. Strings that look like a JSON array
/// (`"[1, 2, 3]"`) are parsed as one; other strings are split on `,`, `;` or
/// `|`. Empty items are dropped.
pub fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                    return as_list(&Value::Array(items));
                }
            }
            let inner = trimmed.trim_start_matches('[').trim_end_matches(']');
            LIST_SEPARATOR
                .split(inner)
                .map(|item| item.trim().trim_matches('"').to_string())
                .filter(|item| !item.is_empty())
                .collect()
        }
        other => {
            let text = display_value(other);
            if text.is_empty() { Vec::new() } else { vec![text] }
        }
    }
}

/// Render a cell as plain text (used for IDs, messages and CSV export).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Parse a date-like string into a calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// True when a date cell is empty or holds a valid calendar date.
pub fn is_valid_date_cell(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) if s.trim().is_empty() => true,
        Value::String(s) => parse_date(s).is_some(),
        _ => false,
    }
}
