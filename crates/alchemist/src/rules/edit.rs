//! Guard for single-cell edits.

use serde_json::Value;

use crate::schema::{as_number, display_value, Row};

use super::model::{Rule, RulesConfig};

/// Reason to refuse setting `column` of `rows[row]` to `value`, if any.
///
/// Only edits that clearly break a rule are refused: a `Duration` below 1 or
/// not a number, or a `MaxLoadPerPhase` above the cap of a `loadLimit` rule
/// for the row's `WorkerGroup`. Everything else is left to validation.
pub fn check_edit(
    config: &RulesConfig,
    rows: &[Row],
    row: usize,
    column: &str,
    value: &Value,
) -> Option<String> {
    match column {
        "Duration" => match as_number(value) {
            Some(n) if n >= 1.0 => None,
            _ => Some("Duration must be a number ≥ 1.".to_string()),
        },
        "MaxLoadPerPhase" => {
            let requested = as_number(value)?;
            let group = rows.get(row)?.get("WorkerGroup").map(display_value)?;
            config.rules.iter().find_map(|rule| match rule {
                Rule::LoadLimit {
                    worker_group,
                    max_slots_per_phase,
                } if *worker_group == group && requested > *max_slots_per_phase as f64 => {
                    Some(format!(
                        "MaxLoadPerPhase cannot exceed {} for group {}.",
                        max_slots_per_phase, worker_group
                    ))
                }
                _ => None,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workers() -> Vec<Row> {
        vec![
            [("WorkerID", json!("W1")), ("WorkerGroup", json!("Ops"))]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ]
    }

    #[test]
    fn test_duration_guard() {
        let config = RulesConfig::new();
        assert!(check_edit(&config, &[], 0, "Duration", &json!("0")).is_some());
        assert!(check_edit(&config, &[], 0, "Duration", &json!("abc")).is_some());
        assert!(check_edit(&config, &[], 0, "Duration", &json!(2)).is_none());
    }

    #[test]
    fn test_load_limit_guard() {
        let config = RulesConfig::new().with_rule(Rule::load_limit("Ops", 3));
        let rows = workers();
        assert_eq!(
            check_edit(&config, &rows, 0, "MaxLoadPerPhase", &json!("4")).as_deref(),
            Some("MaxLoadPerPhase cannot exceed 3 for group Ops.")
        );
        assert!(check_edit(&config, &rows, 0, "MaxLoadPerPhase", &json!(3)).is_none());

        let other = RulesConfig::new().with_rule(Rule::load_limit("Dev", 1));
        assert!(check_edit(&other, &rows, 0, "MaxLoadPerPhase", &json!(9)).is_none());
    }

    #[test]
    fn test_other_columns_pass() {
        let config = RulesConfig::new();
        assert!(check_edit(&config, &[], 3, "Notes", &Value::Null).is_none());
    }
}
