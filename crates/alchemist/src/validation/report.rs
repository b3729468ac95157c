//! Validation results.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::EntityType;

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A problem with one cell.
    Cell {
        entity: EntityType,
        row: usize,
        field: String,
        message: String,
    },
    /// A problem with a table as a whole.
    Summary { entity: EntityType, message: String },
}

impl ValidationError {
    pub fn entity(&self) -> EntityType {
        match self {
            ValidationError::Cell { entity, .. } | ValidationError::Summary { entity, .. } => *entity,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ValidationError::Cell { message, .. } | ValidationError::Summary { message, .. } => message,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Cell {
                entity,
                row,
                field,
                message,
            } => write!(f, "{} row {} {}: {}", entity, row + 1, field, message),
            ValidationError::Summary { entity, message } => write!(f, "{}: {}", entity, message),
        }
    }
}

/// Cell and summary errors for every entity.
///
/// Cell errors are keyed `"{row}-{field}"` with a zero-based row index.
/// Serializes as `{ "cellErrors": ..., "summaryErrors": ... }`, with an
/// entry for every entity even when it has no errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub cell_errors: IndexMap<EntityType, IndexMap<String, String>>,
    pub summary_errors: IndexMap<EntityType, Vec<String>>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            cell_errors: EntityType::ALL.iter().map(|e| (*e, IndexMap::new())).collect(),
            summary_errors: EntityType::ALL.iter().map(|e| (*e, Vec::new())).collect(),
        }
    }
}

impl ValidationReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key used for a cell error.
    pub fn cell_key(row: usize, field: &str) -> String {
        format!("{}-{}", row, field)
    }

    /// Record a cell error, replacing any earlier one for the same cell.
    pub fn add_cell_error(
        &mut self,
        entity: EntityType,
        row: usize,
        field: &str,
        message: impl Into<String>,
    ) {
        self.cell_errors
            .entry(entity)
            .or_default()
            .insert(Self::cell_key(row, field), message.into());
    }

    /// Record a summary error.
    pub fn add_summary_error(&mut self, entity: EntityType, message: impl Into<String>) {
        self.summary_errors.entry(entity).or_default().push(message.into());
    }

    /// Message for one cell, if it has an error.
    pub fn cell_error(&self, entity: EntityType, row: usize, field: &str) -> Option<&str> {
        self.cell_errors
            .get(&entity)?
            .get(&Self::cell_key(row, field))
            .map(String::as_str)
    }

    /// Summary errors for one entity.
    pub fn summary(&self, entity: EntityType) -> &[String] {
        self.summary_errors.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when there are no errors at all.
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    /// Total cell and summary errors.
    pub fn error_count(&self) -> usize {
        self.cell_errors.values().map(IndexMap::len).sum::<usize>()
            + self.summary_errors.values().map(Vec::len).sum::<usize>()
    }

    /// All findings as a flat list: per entity, summary errors then cell errors.
    pub fn errors(&self) -> Vec<ValidationError> {
        let mut out = Vec::with_capacity(self.error_count());
        for entity in EntityType::ALL {
            for message in self.summary(entity) {
                out.push(ValidationError::Summary {
                    entity,
                    message: message.clone(),
                });
            }
            let Some(cells) = self.cell_errors.get(&entity) else {
                continue;
            };
            for (key, message) in cells {
                if let Some((row, field)) = key.split_once('-') {
                    if let Ok(row) = row.parse() {
                        out.push(ValidationError::Cell {
                            entity,
                            row,
                            field: field.to_string(),
                            message: message.clone(),
                        });
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_report_shape() {
        let report = ValidationReport::new();
        assert!(report.is_clean());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "cellErrors": {"clients": {}, "workers": {}, "tasks": {}, "unknown": {}},
                "summaryErrors": {"clients": [], "workers": [], "tasks": [], "unknown": []}
            })
        );
    }

    #[test]
    fn test_errors_view() {
        let mut report = ValidationReport::new();
        report.add_cell_error(EntityType::Tasks, 2, "Duration", "Duration must be a number ≥ 1");
        report.add_summary_error(EntityType::Clients, "Duplicate ClientID values: C1");
        assert_eq!(report.error_count(), 2);
        assert_eq!(
            report.cell_error(EntityType::Tasks, 2, "Duration"),
            Some("Duration must be a number ≥ 1")
        );

        let errors = report.errors();
        assert_eq!(errors[0].entity(), EntityType::Clients);
        assert_eq!(
            errors[1],
            ValidationError::Cell {
                entity: EntityType::Tasks,
                row: 2,
                field: "Duration".to_string(),
                message: "Duration must be a number ≥ 1".to_string(),
            }
        );
        assert_eq!(errors[1].to_string(), "tasks row 3 Duration: Duration must be a number ≥ 1");
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut report = ValidationReport::new();
        report.add_cell_error(EntityType::Workers, 0, "AvailableSlots", "AvailableSlots must not be empty");
        let text = serde_json::to_string(&report).unwrap();
        let back: ValidationReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
    }
}
