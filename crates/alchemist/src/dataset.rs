//! The set of loaded tables, one per entity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlchemistError, Result};
use crate::schema::{EntityType, Row};

/// Canonical rows for every entity.
///
/// A `DataSet` is a value: uploads, edits and rule application all produce a
/// new one, so an earlier snapshot can always be restored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    clients: Vec<Row>,
    #[serde(default)]
    workers: Vec<Row>,
    #[serde(default)]
    tasks: Vec<Row>,
    #[serde(default)]
    unknown: Vec<Row>,
}

impl DataSet {
    /// Create an empty data set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for an entity.
    pub fn rows(&self, entity: EntityType) -> &[Row] {
        match entity {
            EntityType::Clients => &self.clients,
            EntityType::Workers => &self.workers,
            EntityType::Tasks => &self.tasks,
            EntityType::Unknown => &self.unknown,
        }
    }

    pub fn clients(&self) -> &[Row] {
        &self.clients
    }

    pub fn workers(&self) -> &[Row] {
        &self.workers
    }

    pub fn tasks(&self) -> &[Row] {
        &self.tasks
    }

    /// Copy of this data set with one table replaced.
    pub fn with_table(&self, entity: EntityType, rows: Vec<Row>) -> Self {
        let mut next = self.clone();
        *next.rows_mut(entity) = rows;
        next
    }

    /// Copy of this data set with one cell set.
    ///
    /// Setting a column the row does not have yet appends it.
    pub fn with_cell(
        &self,
        entity: EntityType,
        row: usize,
        column: &str,
        value: Value,
    ) -> Result<Self> {
        let len = self.rows(entity).len();
        if row >= len {
            return Err(AlchemistError::RowOutOfRange {
                entity: entity.to_string(),
                row,
                len,
            });
        }
        let mut next = self.clone();
        next.rows_mut(entity)[row].insert(column.to_string(), value);
        Ok(next)
    }

    /// True when no entity has any rows.
    pub fn is_empty(&self) -> bool {
        EntityType::ALL.iter().all(|e| self.rows(*e).is_empty())
    }

    /// Total rows across all entities.
    pub fn total_rows(&self) -> usize {
        EntityType::ALL.iter().map(|e| self.rows(*e).len()).sum()
    }

    fn rows_mut(&mut self, entity: EntityType) -> &mut Vec<Row> {
        match entity {
            EntityType::Clients => &mut self.clients,
            EntityType::Workers => &mut self.workers,
            EntityType::Tasks => &mut self.tasks,
            EntityType::Unknown => &mut self.unknown,
        }
    }
}
