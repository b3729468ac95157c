//! Capacity, skill coverage and concurrency checks across tasks and workers.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::dataset::DataSet;
use crate::rules::RulesConfig;
use crate::schema::{as_list, as_number, display_value, is_missing_or_empty, Row};

use super::rules::validate_rules;

/// Feasibility problems between the task and worker tables.
///
/// - total task duration must not exceed total available worker slots
/// - every required skill must be held by some worker
/// - `MaxConcurrent` must not exceed the number of workers holding all of a
///   task's required skills
///
/// Worker skill sets are built once; each task is then checked in a single
/// pass over them.
pub fn check_advanced(tasks: &[Row], workers: &[Row]) -> Vec<String> {
    let mut problems = Vec::new();

    let worker_skills: Vec<HashSet<String>> = workers
        .iter()
        .map(|w| w.get("Skills").map(as_list).unwrap_or_default().into_iter().collect())
        .collect();
    let all_skills: HashSet<&str> = worker_skills
        .iter()
        .flat_map(|skills| skills.iter().map(String::as_str))
        .collect();

    let total_slots: usize = workers
        .iter()
        .map(|w| w.get("AvailableSlots").map_or(0, |v| as_list(v).len()))
        .sum();
    let total_duration: f64 = tasks
        .iter()
        .filter_map(|t| t.get("Duration").and_then(as_number))
        .sum();
    if total_duration > total_slots as f64 {
        problems.push(format!(
            "Phase-slot saturation violated: total task durations ({}) exceed worker slots ({})",
            format_number(total_duration),
            total_slots
        ));
    }

    for (index, task) in tasks.iter().enumerate() {
        let label = task_label(task, index);
        let required: IndexSet<String> = task
            .get("RequiredSkills")
            .map(as_list)
            .unwrap_or_default()
            .into_iter()
            .collect();

        let missing: Vec<&str> = required
            .iter()
            .map(String::as_str)
            .filter(|skill| !all_skills.contains(skill))
            .collect();
        if !missing.is_empty() {
            problems.push(format!("Task {} missing skills: {}", label, missing.join(", ")));
        }

        if let Some(max_concurrent) = task.get("MaxConcurrent").and_then(as_number) {
            let qualified = worker_skills
                .iter()
                .filter(|skills| required.iter().all(|s| skills.contains(s)))
                .count();
            if max_concurrent > qualified as f64 {
                problems.push(format!(
                    "Task {} MaxConcurrent ({}) exceeds available workers ({})",
                    label,
                    format_number(max_concurrent),
                    qualified
                ));
            }
        }
    }

    problems
}

/// Rule problems followed by [`check_advanced`] problems.
pub fn validate_rules_advanced(config: &RulesConfig, data: &DataSet) -> Vec<String> {
    let mut problems = validate_rules(config, data);
    problems.extend(check_advanced(data.tasks(), data.workers()));
    problems
}

fn task_label(task: &Row, index: usize) -> String {
    if is_missing_or_empty(task.get("TaskID")) {
        format!("(row {})", index + 1)
    } else {
        task.get("TaskID").map(display_value).unwrap_or_default()
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use crate::schema::EntityType;
    use serde_json::{json, Value};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn workers() -> Vec<Row> {
        vec![
            row(&[("WorkerID", json!("W1")), ("Skills", json!("coding,ml")), ("AvailableSlots", json!("[1,2]"))]),
            row(&[("WorkerID", json!("W2")), ("Skills", json!("coding")), ("AvailableSlots", json!("[3]"))]),
        ]
    }

    #[test]
    fn test_saturation() {
        let tasks = vec![
            row(&[("TaskID", json!("T1")), ("Duration", json!("2"))]),
            row(&[("TaskID", json!("T2")), ("Duration", json!(2))]),
        ];
        let problems = check_advanced(&tasks, &workers());
        assert_eq!(
            problems,
            vec!["Phase-slot saturation violated: total task durations (4) exceed worker slots (3)"]
        );
        assert!(check_advanced(&tasks[..1], &workers()).is_empty());
    }

    #[test]
    fn test_skill_coverage() {
        let tasks = vec![row(&[
            ("TaskID", json!("T1")),
            ("Duration", json!(1)),
            ("RequiredSkills", json!("ml, design, design")),
        ])];
        let problems = check_advanced(&tasks, &workers());
        assert_eq!(problems, vec!["Task T1 missing skills: design"]);
    }

    #[test]
    fn test_concurrency() {
        let tasks = vec![
            row(&[
                ("TaskID", json!("T1")),
                ("Duration", json!(1)),
                ("RequiredSkills", json!("coding")),
                ("MaxConcurrent", json!(2)),
            ]),
            row(&[
                ("TaskID", json!("T2")),
                ("Duration", json!(1)),
                ("RequiredSkills", json!(["coding", "ml"])),
                ("MaxConcurrent", json!("2")),
            ]),
        ];
        let problems = check_advanced(&tasks, &workers());
        assert_eq!(problems, vec!["Task T2 MaxConcurrent (2) exceeds available workers (1)"]);
    }

    #[test]
    fn test_empty_tables() {
        assert!(check_advanced(&[], &[]).is_empty());
    }

    #[test]
    fn test_validate_rules_advanced_concatenates() {
        let data = DataSet::new()
            .with_table(EntityType::Workers, workers())
            .with_table(
                EntityType::Tasks,
                vec![row(&[("TaskID", json!("T1")), ("Duration", json!(9))])],
            );
        let config = RulesConfig::new().with_rule(Rule::co_run(["T5"]));
        let problems = validate_rules_advanced(&config, &data);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("Rule #1 (coRun)"));
        assert!(problems[1].starts_with("Phase-slot saturation"));
    }
}
