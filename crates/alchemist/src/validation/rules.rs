//! Consistency checks for user rules.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::dataset::DataSet;
use crate::rules::{Rule, RulesConfig};
use crate::schema::display_value;

/// Problems with the configured rules, each prefixed `Rule #n (type):`.
///
/// Checks each rule on its own: co-run task references and duplicates,
/// non-empty groups and positive limits. Rules are not checked against each
/// other.
pub fn validate_rules(config: &RulesConfig, data: &DataSet) -> Vec<String> {
    let task_ids: HashSet<String> = data
        .tasks()
        .iter()
        .map(|t| t.get("TaskID").map(display_value).unwrap_or_default())
        .collect();

    let mut problems = Vec::new();
    for (index, rule) in config.rules.iter().enumerate() {
        let prefix = format!("Rule #{} ({})", index + 1, rule.kind());
        match rule {
            Rule::CoRun { tasks } => {
                let missing: IndexSet<&str> = tasks
                    .iter()
                    .filter(|t| !task_ids.contains(*t))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    let list: Vec<&str> = missing.into_iter().collect();
                    problems.push(format!("{}: missing task IDs: {}", prefix, list.join(", ")));
                }
                let distinct: HashSet<&String> = tasks.iter().collect();
                if distinct.len() != tasks.len() {
                    problems.push(format!("{}: duplicate task IDs in rule.", prefix));
                }
            }
            Rule::SlotRestriction {
                group,
                min_common_slots,
            } => {
                if group.trim().is_empty() {
                    problems.push(format!("{}: group is empty", prefix));
                }
                if *min_common_slots < 1 {
                    problems.push(format!("{}: minCommonSlots must be ≥ 1", prefix));
                }
            }
            Rule::LoadLimit {
                worker_group,
                max_slots_per_phase,
            } => {
                if worker_group.trim().is_empty() {
                    problems.push(format!("{}: workerGroup is empty", prefix));
                }
                if *max_slots_per_phase < 1 {
                    problems.push(format!("{}: maxSlotsPerPhase must be ≥ 1", prefix));
                }
            }
        }
    }
    problems
}
