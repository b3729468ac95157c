//! Working state for one editing session.

use indexmap::IndexMap;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::dataset::DataSet;
use crate::error::{AlchemistError, Result};
use crate::inference::{HeaderMapping, MappingResult};
use crate::input::RawTable;
use crate::rules::{self, check_edit, Rule, RulesConfig};
use crate::schema::{EntityType, Row};
use crate::transform::remap_rows;
use crate::validation::{validate_data, validate_rules, validate_rules_advanced, ValidationReport};

/// An upload whose entity or mapping needs a person to confirm.
#[derive(Debug, Clone, Serialize)]
pub struct PendingMapping {
    /// Handle used to resolve this upload.
    pub id: usize,
    /// Where the table came from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The table as uploaded.
    pub table: RawTable,
    /// Best mapping found, offered as a starting point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<MappingResult>,
}

/// Loaded data, rules and uploads awaiting review.
///
/// `original` holds every table as it was loaded and only changes on load;
/// `current` is what edits and rule application produce. Every change
/// replaces `current` with a new [`DataSet`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    original: DataSet,
    current: DataSet,
    rules: RulesConfig,
    pending: IndexMap<usize, PendingMapping>,
    next_pending: usize,
}

impl Session {
    /// Create an empty session with default rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Data as currently edited.
    pub fn data(&self) -> &DataSet {
        &self.current
    }

    /// Data as loaded.
    pub fn original(&self) -> &DataSet {
        &self.original
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Replace the rules configuration.
    pub fn set_rules(&mut self, rules: RulesConfig) {
        self.rules = rules;
    }

    /// Append one rule.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.rules.push(rule);
    }

    /// Load canonical rows for an entity, replacing both the original and the
    /// current table.
    pub fn load_table(&mut self, entity: EntityType, rows: Vec<Row>) {
        info!("loaded {} {} row(s)", rows.len(), entity);
        self.original = self.original.with_table(entity, rows.clone());
        self.current = self.current.with_table(entity, rows);
    }

    /// Park an upload for manual review and return its id.
    pub fn add_pending(
        &mut self,
        table: RawTable,
        candidate: Option<MappingResult>,
        source: Option<String>,
    ) -> usize {
        let id = self.next_pending;
        self.next_pending += 1;
        self.pending.insert(
            id,
            PendingMapping {
                id,
                source,
                table,
                candidate,
            },
        );
        id
    }

    /// Uploads awaiting review, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingMapping> {
        self.pending.values()
    }

    /// Look up one pending upload.
    pub fn pending_mapping(&self, id: usize) -> Option<&PendingMapping> {
        self.pending.get(&id)
    }

    /// Confirm a pending upload as `entity` with the given header assignments.
    ///
    /// Returns the number of rows loaded.
    pub fn resolve_pending(
        &mut self,
        id: usize,
        entity: EntityType,
        assignments: &HeaderMapping,
    ) -> Result<usize> {
        let pending = self
            .pending
            .shift_remove(&id)
            .ok_or(AlchemistError::UnknownPending(id))?;
        let rows = remap_rows(&pending.table.rows, assignments);
        let count = rows.len();
        self.load_table(entity, rows);
        Ok(count)
    }

    /// Drop a pending upload without loading it.
    pub fn discard_pending(&mut self, id: usize) -> Result<()> {
        self.pending
            .shift_remove(&id)
            .map(|_| ())
            .ok_or(AlchemistError::UnknownPending(id))
    }

    /// Set one cell of the current data, unless the edit breaks a rule.
    pub fn edit_cell(
        &mut self,
        entity: EntityType,
        row: usize,
        column: &str,
        value: Value,
    ) -> Result<()> {
        let rows = self.current.rows(entity);
        if let Some(reason) = check_edit(&self.rules, rows, row, column, &value) {
            return Err(AlchemistError::EditRejected(reason));
        }
        self.current = self.current.with_cell(entity, row, column, value)?;
        debug!("edited {} row {} column {}", entity, row, column);
        Ok(())
    }

    /// Apply the rules to the current data.
    ///
    /// Refused while the rules themselves have problems.
    pub fn apply_rules(&mut self) -> Result<()> {
        let problems = validate_rules(&self.rules, &self.current);
        if !problems.is_empty() {
            return Err(AlchemistError::InvalidRules(problems));
        }
        self.current = rules::apply_rules(&self.current, &self.rules);
        Ok(())
    }

    /// Restore every table to how it was loaded.
    pub fn reset_data(&mut self) {
        self.current = self.original.clone();
    }

    /// Clear rules and restore default priorities.
    pub fn reset_rules(&mut self) {
        self.rules = RulesConfig::default();
    }

    /// Structural validation of the current data.
    pub fn validate(&self) -> ValidationReport {
        validate_data(&self.current)
    }

    /// Rule and feasibility problems for the current data.
    pub fn rule_problems(&self) -> Vec<String> {
        validate_rules_advanced(&self.rules, &self.current)
    }

    /// Check whether the session may be exported.
    ///
    /// Blocks on any validation error, rule problem or feasibility problem,
    /// and on an empty data set. All blocking problems are returned together.
    pub fn export_check(&self) -> Result<()> {
        let mut problems: Vec<String> =
            self.validate().errors().iter().map(ToString::to_string).collect();
        problems.extend(self.rule_problems());
        if problems.is_empty() && self.current.is_empty() {
            problems.push("No data available to export.".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AlchemistError::ExportBlocked(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn loaded() -> Session {
        let mut session = Session::new();
        session.load_table(
            EntityType::Workers,
            vec![row(&[
                ("WorkerID", json!("W1")),
                ("WorkerGroup", json!("Ops")),
                ("Skills", json!("coding")),
                ("AvailableSlots", json!("[1,2,3]")),
                ("MaxLoadPerPhase", json!(2)),
            ])],
        );
        session.load_table(
            EntityType::Tasks,
            vec![
                row(&[("TaskID", json!("T1")), ("Duration", json!(1)), ("RequiredSkills", json!("coding"))]),
                row(&[("TaskID", json!("T2")), ("Duration", json!(2))]),
            ],
        );
        session
    }

    #[test]
    fn test_edit_and_reset() {
        let mut session = loaded();
        session.edit_cell(EntityType::Tasks, 0, "Duration", json!(3)).unwrap();
        assert_eq!(session.data().tasks()[0]["Duration"], json!(3));
        assert_eq!(session.original().tasks()[0]["Duration"], json!(1));
        session.reset_data();
        assert_eq!(session.data().tasks()[0]["Duration"], json!(1));
    }

    #[test]
    fn test_edit_guard() {
        let mut session = loaded();
        session.add_rule(Rule::load_limit("Ops", 2));
        let err = session
            .edit_cell(EntityType::Workers, 0, "MaxLoadPerPhase", json!(5))
            .unwrap_err();
        assert!(matches!(err, AlchemistError::EditRejected(_)));
        assert!(session.edit_cell(EntityType::Tasks, 1, "Duration", json!(0)).is_err());
        assert!(session.edit_cell(EntityType::Tasks, 9, "Notes", json!("x")).is_err());
    }

    #[test]
    fn test_apply_rules_refused_when_invalid() {
        let mut session = loaded();
        session.add_rule(Rule::co_run(["T1", "T404"]));
        assert!(matches!(session.apply_rules(), Err(AlchemistError::InvalidRules(_))));

        session.reset_rules();
        session.add_rule(Rule::co_run(["T1", "T2"]));
        session.apply_rules().unwrap();
        assert_eq!(session.data().tasks()[0]["CoRunGroup"], json!("T1,T2"));
        assert!(!session.original().tasks()[0].contains_key("CoRunGroup"));
    }

    #[test]
    fn test_pending_lifecycle() {
        let mut session = Session::new();
        let table = RawTable::new(
            vec!["wid".to_string(), "skillz".to_string()],
            vec![row(&[("wid", json!("W1")), ("skillz", json!("ml"))])],
        );
        let id = session.add_pending(table, None, Some("staff.csv".to_string()));
        assert_eq!(session.pending().count(), 1);

        let assignments = HeaderMapping::from_assignments([("wid", "WorkerID"), ("skillz", "Skills")]);
        let count = session.resolve_pending(id, EntityType::Workers, &assignments).unwrap();
        assert_eq!(count, 1);
        assert_eq!(session.data().workers()[0]["WorkerID"], json!("W1"));
        assert!(session.pending_mapping(id).is_none());
        assert!(matches!(
            session.resolve_pending(id, EntityType::Workers, &assignments),
            Err(AlchemistError::UnknownPending(_))
        ));
    }

    #[test]
    fn test_export_check() {
        let Err(AlchemistError::ExportBlocked(problems)) = Session::new().export_check() else {
            panic!("empty session should not export");
        };
        assert_eq!(problems, vec!["No data available to export."]);

        let session = loaded();
        session.export_check().unwrap();

        let mut broken = loaded();
        broken.edit_cell(EntityType::Tasks, 1, "StartDate", json!("someday")).unwrap();
        broken.add_rule(Rule::slot_restriction("", 1));
        let Err(AlchemistError::ExportBlocked(problems)) = broken.export_check() else {
            panic!("export should be blocked");
        };
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("StartDate is not a valid date"));
        assert!(problems[1].contains("group is empty"));
    }
}
