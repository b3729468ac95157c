//! Business rules and the rules configuration document.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AlchemistError, Result};

/// Priority key used to pull one client priority level to the top.
pub const PRIORITY_WEIGHT: &str = "priorityWeight";
/// Priority key used to pull one task duration to the top.
pub const DURATION_WEIGHT: &str = "durationWeight";
/// Priority key carried through export; no ranking reads it yet.
pub const DISTANCE_WEIGHT: &str = "distanceWeight";

/// A user-authored constraint.
///
/// Serialized with a `type` tag and the exact field names used by the rules
/// export (`tasks`, `group`, `minCommonSlots`, `workerGroup`,
/// `maxSlotsPerPhase`). Missing fields deserialize to empty/zero so that
/// incomplete rules reach the rule validator instead of failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Rule {
    /// Tasks that must run together.
    CoRun {
        #[serde(default)]
        tasks: Vec<String>,
    },
    /// Workers of a group must share at least `min_common_slots` slots.
    SlotRestriction {
        #[serde(default)]
        group: String,
        #[serde(default, rename = "minCommonSlots")]
        min_common_slots: i64,
    },
    /// Cap on slots per phase for a worker group.
    LoadLimit {
        #[serde(default, rename = "workerGroup")]
        worker_group: String,
        #[serde(default, rename = "maxSlotsPerPhase")]
        max_slots_per_phase: i64,
    },
}

impl Rule {
    /// A co-run rule over the given task IDs.
    pub fn co_run<S: Into<String>>(tasks: impl IntoIterator<Item = S>) -> Self {
        Rule::CoRun {
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }

    /// A slot restriction rule.
    pub fn slot_restriction(group: impl Into<String>, min_common_slots: i64) -> Self {
        Rule::SlotRestriction {
            group: group.into(),
            min_common_slots,
        }
    }

    /// A load limit rule.
    pub fn load_limit(worker_group: impl Into<String>, max_slots_per_phase: i64) -> Self {
        Rule::LoadLimit {
            worker_group: worker_group.into(),
            max_slots_per_phase,
        }
    }

    /// The rule's `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::CoRun { .. } => "coRun",
            Rule::SlotRestriction { .. } => "slotRestriction",
            Rule::LoadLimit { .. } => "loadLimit",
        }
    }
}

/// Rules plus ranking priorities, as edited and exported together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default = "default_priorities")]
    pub priorities: IndexMap<String, f64>,
}

fn default_priorities() -> IndexMap<String, f64> {
    [PRIORITY_WEIGHT, DURATION_WEIGHT, DISTANCE_WEIGHT]
        .into_iter()
        .map(|key| (key.to_string(), 1.0))
        .collect()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            priorities: default_priorities(),
        }
    }
}

impl RulesConfig {
    /// Empty rules with default priorities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set a priority weight.
    pub fn with_priority(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.priorities.insert(key.into(), weight);
        self
    }

    /// Weight for a priority key (1.0 when absent).
    pub fn priority(&self, key: &str) -> f64 {
        self.priorities.get(key).copied().unwrap_or(1.0)
    }

    /// Parse a rules document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a rules document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AlchemistError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text)
    }

    /// Pretty JSON suitable for export.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let config = RulesConfig::new()
            .with_rule(Rule::co_run(["T1", "T2"]))
            .with_rule(Rule::slot_restriction("GroupA", 2))
            .with_rule(Rule::load_limit("Ops", 3));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["rules"][0], json!({"type": "coRun", "tasks": ["T1", "T2"]}));
        assert_eq!(
            value["rules"][1],
            json!({"type": "slotRestriction", "group": "GroupA", "minCommonSlots": 2})
        );
        assert_eq!(
            value["rules"][2],
            json!({"type": "loadLimit", "workerGroup": "Ops", "maxSlotsPerPhase": 3})
        );
        assert_eq!(value["priorities"]["priorityWeight"], json!(1.0));
    }

    #[test]
    fn test_parse_incomplete_rules() {
        let config = RulesConfig::from_json_str(
            r#"{"rules": [{"type": "slotRestriction"}, {"type": "coRun"}]}"#,
        )
        .unwrap();
        assert_eq!(config.rules[0], Rule::slot_restriction("", 0));
        assert_eq!(config.rules[1], Rule::co_run(Vec::<String>::new()));
        assert_eq!(config.priority(DURATION_WEIGHT), 1.0);
    }

    #[test]
    fn test_unknown_rule_type_is_an_error() {
        assert!(RulesConfig::from_json_str(r#"{"rules": [{"type": "teleport"}]}"#).is_err());
    }

    #[test]
    fn test_kind() {
        assert_eq!(Rule::co_run(["T1"]).kind(), "coRun");
        assert_eq!(Rule::load_limit("g", 1).kind(), "loadLimit");
    }
}
