//! Entity type tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AlchemistError;

/// The business-object category a table of rows represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Clients requesting tasks.
    Clients,
    /// Workers with skills and available slots.
    Workers,
    /// Tasks with durations and required skills.
    Tasks,
    /// Could not be determined with enough confidence.
    Unknown,
}

impl EntityType {
    /// The three entities that carry a canonical schema, in classification order.
    pub const KNOWN: [EntityType; 3] = [EntityType::Clients, EntityType::Workers, EntityType::Tasks];

    /// All entity tags including `Unknown`.
    pub const ALL: [EntityType; 4] = [
        EntityType::Clients,
        EntityType::Workers,
        EntityType::Tasks,
        EntityType::Unknown,
    ];

    /// Lowercase name used in messages, file names and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Clients => "clients",
            EntityType::Workers => "workers",
            EntityType::Tasks => "tasks",
            EntityType::Unknown => "unknown",
        }
    }

    /// Returns true for every tag except `Unknown`.
    pub fn is_known(&self) -> bool {
        !matches!(self, EntityType::Unknown)
    }
}

impl Default for EntityType {
    fn default() -> Self {
        EntityType::Unknown
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AlchemistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clients" | "client" => Ok(EntityType::Clients),
            "workers" | "worker" => Ok(EntityType::Workers),
            "tasks" | "task" => Ok(EntityType::Tasks),
            "unknown" => Ok(EntityType::Unknown),
            other => Err(AlchemistError::Config(format!("unknown entity type '{}'", other))),
        }
    }
}
