//! Canonical schemas for every entity type.
//!
//! The tables here are process-wide constants. Synonyms are matched after
//! [`normalize`], so `"client_id"`, `"Client ID"` and `"CLIENTID"` are all the
//! same key.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::entity::EntityType;
use super::normalize::normalize;

/// A canonical field and the alternate spellings accepted for it.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: &'static str,
    /// Accepted synonyms (compared after normalization).
    pub synonyms: &'static [&'static str],
}

/// Canonical schema for one entity type.
#[derive(Debug)]
pub struct EntitySchema {
    /// Entity this schema describes.
    pub entity: EntityType,
    /// Canonical fields in declaration order.
    pub fields: &'static [FieldSpec],
    /// Fields that must be present in every uploaded table.
    pub required: &'static [&'static str],
    /// Primary key field, if the entity has one.
    pub id_field: Option<&'static str>,
}

const CLIENT_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "ClientID", synonyms: &["clientid", "id", "client_id", "custid"] },
    FieldSpec { name: "ClientName", synonyms: &["clientname", "customer", "client_name", "cust_name"] },
    FieldSpec { name: "PriorityLevel", synonyms: &["prioritylevel", "priority", "prio", "level"] },
    FieldSpec {
        name: "RequestedTaskIDs",
        synonyms: &["requestedtaskids", "task_ids", "tasks", "requested_tasks"],
    },
    FieldSpec { name: "GroupTag", synonyms: &["grouptag", "group", "group_tag"] },
    FieldSpec { name: "AttributesJSON", synonyms: &["attributesjson", "attributes", "meta", "metadata"] },
];

const WORKER_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "WorkerID", synonyms: &["workerid", "id", "worker_id", "staffid"] },
    FieldSpec { name: "WorkerName", synonyms: &["workername", "name", "worker_name"] },
    FieldSpec { name: "Skills", synonyms: &["skills", "skillset", "skill_tags"] },
    FieldSpec {
        name: "AvailableSlots",
        synonyms: &["availableslots", "available_slots", "slots", "phases"],
    },
    FieldSpec { name: "MaxLoadPerPhase", synonyms: &["maxloadperphase", "max_load", "maxload"] },
    FieldSpec { name: "WorkerGroup", synonyms: &["workergroup", "group", "team"] },
    FieldSpec {
        name: "QualificationLevel",
        synonyms: &["qualificationlevel", "qualification", "quallevel"],
    },
];

const TASK_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "TaskID", synonyms: &["taskid", "id", "task_id"] },
    FieldSpec { name: "TaskName", synonyms: &["taskname", "name", "task_name"] },
    FieldSpec { name: "Category", synonyms: &["category", "type", "task_category"] },
    FieldSpec { name: "Duration", synonyms: &["duration", "length", "phases"] },
    FieldSpec { name: "RequiredSkills", synonyms: &["requiredskills", "skills_required", "req_skills"] },
    FieldSpec {
        name: "PreferredPhases",
        synonyms: &["preferredphases", "preferred_phases", "phases"],
    },
    FieldSpec { name: "MaxConcurrent", synonyms: &["maxconcurrent", "max_concurrent", "concurrency"] },
];

static CLIENTS: EntitySchema = EntitySchema {
    entity: EntityType::Clients,
    fields: CLIENT_FIELDS,
    required: &["ClientID", "PriorityLevel"],
    id_field: Some("ClientID"),
};

static WORKERS: EntitySchema = EntitySchema {
    entity: EntityType::Workers,
    fields: WORKER_FIELDS,
    required: &["WorkerID", "AvailableSlots"],
    id_field: Some("WorkerID"),
};

static TASKS: EntitySchema = EntitySchema {
    entity: EntityType::Tasks,
    fields: TASK_FIELDS,
    required: &["TaskID", "Duration"],
    id_field: Some("TaskID"),
};

static UNKNOWN: EntitySchema = EntitySchema {
    entity: EntityType::Unknown,
    fields: &[],
    required: &[],
    id_field: None,
};

static CLIENT_KEYS: Lazy<IndexMap<String, &'static str>> = Lazy::new(|| build_candidates(&CLIENTS));
static WORKER_KEYS: Lazy<IndexMap<String, &'static str>> = Lazy::new(|| build_candidates(&WORKERS));
static TASK_KEYS: Lazy<IndexMap<String, &'static str>> = Lazy::new(|| build_candidates(&TASKS));
static NO_KEYS: Lazy<IndexMap<String, &'static str>> = Lazy::new(IndexMap::new);

/// Look up the canonical schema for an entity type.
pub fn schema_for(entity: EntityType) -> &'static EntitySchema {
    match entity {
        EntityType::Clients => &CLIENTS,
        EntityType::Workers => &WORKERS,
        EntityType::Tasks => &TASKS,
        EntityType::Unknown => &UNKNOWN,
    }
}

/// Normalized candidate key -> canonical field.
///
/// Each field contributes its own name first, then its synonyms. When two
/// fields of the same schema declare the same synonym (tasks: `phases`), the
/// last declaring field takes it; the key keeps its first position.
fn build_candidates(schema: &EntitySchema) -> IndexMap<String, &'static str> {
    let mut map = IndexMap::new();
    for field in schema.fields {
        map.insert(normalize(field.name), field.name);
        for synonym in field.synonyms {
            map.insert(normalize(synonym), field.name);
        }
    }
    map
}

impl EntitySchema {
    /// Canonical field names in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Number of canonical fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if `name` is one of this schema's canonical fields (exact).
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Look up a field spec by canonical name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All normalized candidate keys mapped to their canonical field.
    pub fn candidates(&self) -> &'static IndexMap<String, &'static str> {
        match self.entity {
            EntityType::Clients => &CLIENT_KEYS,
            EntityType::Workers => &WORKER_KEYS,
            EntityType::Tasks => &TASK_KEYS,
            EntityType::Unknown => &NO_KEYS,
        }
    }

    /// Exact lookup of a header after normalization.
    pub fn exact_match(&self, header: &str) -> Option<&'static str> {
        self.candidates().get(&normalize(header)).copied()
    }
}
