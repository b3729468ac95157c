//! Applying rules and priorities to a data set.

use std::cmp::Ordering;

use log::debug;
use serde_json::{json, Value};

use crate::dataset::DataSet;
use crate::schema::{as_list, as_number, display_value, EntityType, Row};

use super::model::{Rule, RulesConfig, DURATION_WEIGHT, PRIORITY_WEIGHT};

/// Label for a client priority level.
pub fn priority_label(level: Option<f64>) -> &'static str {
    match level {
        Some(l) if l == 1.0 => "Very Low",
        Some(l) if l == 2.0 => "Low",
        Some(l) if l == 4.0 => "High",
        Some(l) if l == 5.0 => "Very High",
        _ => "Moderate",
    }
}

/// Derive a new data set with rule annotations and priority ranking.
///
/// - `coRun`: each listed task gets `CoRunGroup` = the rule's IDs joined by `,`
/// - `slotRestriction`: every worker gets `SlotRestrictionValid`, false only
///   for workers of the group with fewer available slots than required
/// - `loadLimit`: workers of the group get `MaxLoadPerPhase` overwritten
///
/// Clients gain `PriorityLabel` and are ordered with the level equal to the
/// `priorityWeight` priority first, then by level descending. Tasks are
/// ordered with the duration equal to `durationWeight` first, then by
/// duration descending. Sorting is stable and non-numeric values sort last.
/// The input is not modified.
pub fn apply_rules(data: &DataSet, config: &RulesConfig) -> DataSet {
    let mut tasks = data.tasks().to_vec();
    let mut workers = data.workers().to_vec();

    for rule in &config.rules {
        match rule {
            Rule::CoRun { tasks: ids } => {
                let group = ids.join(",");
                for task in tasks.iter_mut() {
                    let id = task.get("TaskID").map(display_value).unwrap_or_default();
                    if ids.contains(&id) {
                        task.insert("CoRunGroup".to_string(), json!(group));
                    }
                }
            }
            Rule::SlotRestriction {
                group,
                min_common_slots,
            } => {
                for worker in workers.iter_mut() {
                    let valid = !in_group(worker, group)
                        || slot_count(worker) as i64 >= *min_common_slots;
                    worker.insert("SlotRestrictionValid".to_string(), Value::Bool(valid));
                }
            }
            Rule::LoadLimit {
                worker_group,
                max_slots_per_phase,
            } => {
                for worker in workers.iter_mut().filter(|w| in_group(w, worker_group)) {
                    worker.insert("MaxLoadPerPhase".to_string(), json!(max_slots_per_phase));
                }
            }
        }
    }

    let mut clients: Vec<Row> = data
        .clients()
        .iter()
        .map(|client| {
            let mut client = client.clone();
            let label = priority_label(number_at(&client, "PriorityLevel"));
            client.insert("PriorityLabel".to_string(), json!(label));
            client
        })
        .collect();
    rank_by(&mut clients, "PriorityLevel", config.priority(PRIORITY_WEIGHT));
    rank_by(&mut tasks, "Duration", config.priority(DURATION_WEIGHT));

    debug!(
        "applied {} rules to {} clients, {} workers, {} tasks",
        config.rules.len(),
        clients.len(),
        workers.len(),
        tasks.len()
    );

    data.with_table(EntityType::Clients, clients)
        .with_table(EntityType::Workers, workers)
        .with_table(EntityType::Tasks, tasks)
}

fn in_group(worker: &Row, group: &str) -> bool {
    worker
        .get("WorkerGroup")
        .is_some_and(|g| display_value(g) == group)
}

fn slot_count(worker: &Row) -> usize {
    worker.get("AvailableSlots").map_or(0, |v| as_list(v).len())
}

fn number_at(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(as_number)
}

/// Stable sort: rows whose `column` equals `selected` first, then descending.
fn rank_by(rows: &mut [Row], column: &str, selected: f64) {
    rows.sort_by(|a, b| {
        let a = number_at(a, column);
        let b = number_at(b, column);
        let a_selected = a == Some(selected);
        let b_selected = b == Some(selected);
        b_selected.cmp(&a_selected).then_with(|| match (a, b) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });
}
