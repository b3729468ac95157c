//! Entity classification from a header set.
//!
//! Two tiers: a cheap exact-keyword check that handles well-formed files, then
//! a similarity fallback that maps the headers against every schema and keeps
//! the best one if it is convincing enough.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::schema::{normalize, schema_for, EntityType};

use super::mapper::{HeaderMapper, MappingResult};

/// Normalized header pairs that identify an entity outright.
const KEYWORDS: [(EntityType, &str, &str); 3] = [
    (EntityType::Clients, "clientid", "prioritylevel"),
    (EntityType::Workers, "workerid", "skills"),
    (EntityType::Tasks, "taskid", "category"),
];

/// How the classifier reached its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Both identifying keywords were present.
    Keyword,
    /// The similarity fallback found a convincing schema.
    Similarity,
    /// Nothing was convincing; needs manual resolution.
    Unresolved,
}

/// Outcome of classifying a header set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// Decided entity (`Unknown` when unresolved).
    pub entity: EntityType,
    /// Which tier decided.
    pub method: ClassificationMethod,
    /// Best similarity mapping, when the fallback ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<MappingResult>,
}

/// Decides which entity a table represents.
#[derive(Debug, Clone, Default)]
pub struct EntityClassifier {
    mapper: HeaderMapper,
}

impl EntityClassifier {
    /// Create a classifier with the default mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier that uses `mapper` for the fallback tier.
    pub fn with_mapper(mapper: HeaderMapper) -> Self {
        Self { mapper }
    }

    /// Classify a header set.
    pub fn classify<S: AsRef<str>>(&self, headers: &[S]) -> EntityType {
        self.classify_detailed(headers).entity
    }

    /// Classify a header set and report how the decision was made.
    pub fn classify_detailed<S: AsRef<str>>(&self, headers: &[S]) -> Classification {
        let normalized: HashSet<String> = headers.iter().map(|h| normalize(h.as_ref())).collect();

        for (entity, first, second) in KEYWORDS {
            if normalized.contains(first) && normalized.contains(second) {
                debug!("classified as {} by keywords {} + {}", entity, first, second);
                return Classification {
                    entity,
                    method: ClassificationMethod::Keyword,
                    candidate: None,
                };
            }
        }

        let best = self
            .mapper
            .map_all(headers)
            .into_iter()
            .fold(None, |best: Option<MappingResult>, result| match best {
                Some(b) if result.average_score <= b.average_score => Some(b),
                _ => Some(result),
            });

        let Some(best) = best else {
            return Classification {
                entity: EntityType::Unknown,
                method: ClassificationMethod::Unresolved,
                candidate: None,
            };
        };

        let needed = required_field_coverage(headers.len(), schema_for(best.entity).field_count());
        let convincing = best.average_score >= self.mapper.config().similarity_floor
            && best.distinct_fields() >= needed;

        debug!(
            "similarity fallback: best {} avg {:.2}, {} fields mapped (need {})",
            best.entity,
            best.average_score,
            best.distinct_fields(),
            needed
        );

        if convincing {
            Classification {
                entity: best.entity,
                method: ClassificationMethod::Similarity,
                candidate: Some(best),
            }
        } else {
            Classification {
                entity: EntityType::Unknown,
                method: ClassificationMethod::Unresolved,
                candidate: Some(best),
            }
        }
    }
}

/// Distinct canonical fields the fallback must map to accept a schema.
///
/// Half of the fields the table could possibly cover: a table with fewer
/// headers than the schema has fields is judged against its header count.
/// Never less than one.
pub fn required_field_coverage(header_count: usize, field_count: usize) -> usize {
    header_count.min(field_count).div_ceil(2).max(1)
}

/// Classify with the default configuration.
pub fn classify<S: AsRef<str>>(headers: &[S]) -> EntityType {
    EntityClassifier::new().classify(headers)
}
