//! Structural validation of canonical tables.

use std::collections::HashSet;

use indexmap::IndexSet;
use log::debug;

use crate::dataset::DataSet;
use crate::schema::{
    as_number, display_value, is_empty_value, is_missing_or_empty, is_valid_date_cell, schema_for,
    EntityType, Row,
};

use super::report::ValidationReport;

const DATE_FIELDS: [&str; 2] = ["StartDate", "EndDate"];

/// Validate every loaded table.
///
/// Per entity, in order: required columns, duplicate IDs, per-cell checks.
/// Then task -> worker references. Tables with no rows are skipped. The
/// report is built from scratch on every call.
pub fn validate_data(data: &DataSet) -> ValidationReport {
    let mut report = ValidationReport::new();

    for entity in EntityType::KNOWN {
        let rows = data.rows(entity);
        if rows.is_empty() {
            continue;
        }
        check_required_columns(entity, rows, &mut report);
        check_duplicate_ids(entity, rows, &mut report);
        for (index, row) in rows.iter().enumerate() {
            check_cells(entity, index, row, &mut report);
        }
    }
    check_worker_references(data, &mut report);

    debug!("validation found {} errors", report.error_count());
    report
}

fn check_required_columns(entity: EntityType, rows: &[Row], report: &mut ValidationReport) {
    let present: HashSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
    let missing: Vec<&str> = schema_for(entity)
        .required
        .iter()
        .copied()
        .filter(|field| !present.contains(field))
        .collect();
    if !missing.is_empty() {
        report.add_summary_error(entity, format!("Missing required columns: {}", missing.join(", ")));
    }
}

fn check_duplicate_ids(entity: EntityType, rows: &[Row], report: &mut ValidationReport) {
    let Some(id_field) = schema_for(entity).id_field else {
        return;
    };
    let mut seen = HashSet::new();
    let mut duplicates = IndexSet::new();
    for row in rows {
        let Some(value) = row.get(id_field) else {
            continue;
        };
        let id = display_value(value);
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id.clone()) {
            duplicates.insert(id);
        }
    }
    if !duplicates.is_empty() {
        let list: Vec<String> = duplicates.into_iter().collect();
        report.add_summary_error(entity, format!("Duplicate {} values: {}", id_field, list.join(", ")));
    }
}

fn check_cells(entity: EntityType, index: usize, row: &Row, report: &mut ValidationReport) {
    match entity {
        EntityType::Clients => {
            if let Some(value) = row.get("PriorityLevel") {
                if !as_number(value).is_some_and(|n| (1.0..=5.0).contains(&n)) {
                    report.add_cell_error(entity, index, "PriorityLevel", "PriorityLevel must be between 1 and 5");
                }
            }
        }
        EntityType::Workers => {
            if row.get("AvailableSlots").is_some_and(is_empty_value) {
                report.add_cell_error(entity, index, "AvailableSlots", "AvailableSlots must not be empty");
            }
        }
        EntityType::Tasks => {
            if let Some(value) = row.get("Duration") {
                if !as_number(value).is_some_and(|n| n >= 1.0) {
                    report.add_cell_error(entity, index, "Duration", "Duration must be a number ≥ 1");
                }
            }
            for field in DATE_FIELDS {
                if row.get(field).is_some_and(|v| !is_valid_date_cell(v)) {
                    report.add_cell_error(entity, index, field, format!("{} is not a valid date", field));
                }
            }
        }
        EntityType::Unknown => {}
    }
}

fn check_worker_references(data: &DataSet, report: &mut ValidationReport) {
    let worker_ids: HashSet<String> = data
        .workers()
        .iter()
        .filter_map(|w| w.get("WorkerID"))
        .map(display_value)
        .collect();

    for (index, task) in data.tasks().iter().enumerate() {
        let Some(assigned) = task.get("AssignedWorkerID").filter(|v| !is_empty_value(v)) else {
            continue;
        };
        let wid = display_value(assigned);
        if worker_ids.contains(&wid) {
            continue;
        }
        let task_id = if is_missing_or_empty(task.get("TaskID")) {
            format!("(row {})", index + 1)
        } else {
            task.get("TaskID").map(display_value).unwrap_or_default()
        };
        report.add_summary_error(
            EntityType::Tasks,
            format!("Task {} references missing WorkerID {}", task_id, wid),
        );
    }
}
