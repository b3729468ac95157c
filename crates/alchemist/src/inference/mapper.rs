//! Header mapping: raw column headers -> canonical fields with confidence.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::advisor::{self, HeaderAdvisor, Proposal};
use crate::schema::{normalize, schema_for, EntityType};

use super::similarity::dice_coefficient;

/// Similarity a fuzzy match must exceed before a field is assigned.
///
/// This is a trust threshold, not a derived quantity: raising it trades
/// recall for precision. It is also the average score the classifier and the
/// upload flow require before applying a mapping without review.
pub const SIMILARITY_FLOOR: f64 = 0.55;

/// Highest per-header score an advisor-only assignment can carry.
///
/// A score of 1.0 is reserved for exact normalized matches.
pub const ADVISOR_SCORE_CEILING: f64 = 0.95;

/// Configuration for header mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Fuzzy scores must be strictly greater than this to assign a field.
    pub similarity_floor: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            similarity_floor: SIMILARITY_FLOOR,
        }
    }
}

/// Where a mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// Exact and fuzzy matching against the schema registry.
    Deterministic,
    /// Proposal from the advisory collaborator.
    Advisor,
    /// Assignments confirmed by a person.
    Manual,
}

/// Mapping decision for one raw header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    /// Canonical field, or `None` when the header stays unmapped.
    #[serde(rename = "canonicalField")]
    pub field: Option<String>,
    /// Confidence in `[0, 1]`. Recorded even when unmapped.
    #[serde(rename = "confidenceScore")]
    pub score: f64,
}

impl FieldMatch {
    /// A mapped header.
    pub fn mapped(field: impl Into<String>, score: f64) -> Self {
        Self {
            field: Some(field.into()),
            score,
        }
    }

    /// An unmapped header with its best fuzzy score.
    pub fn unmapped(score: f64) -> Self {
        Self { field: None, score }
    }
}

/// Raw header -> [`FieldMatch`], in header order.
///
/// A header that appears more than once in the input keeps one entry but
/// counts once per occurrence in [`average_score`](Self::average_score) and
/// [`mapped_count`](Self::mapped_count).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMapping {
    entries: IndexMap<String, FieldMatch>,
    #[serde(skip)]
    repeats: IndexMap<String, usize>,
}

impl HeaderMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping where every canonical field maps to itself with score 1.0.
    pub fn identity<S: AsRef<str>>(fields: &[S]) -> Self {
        let mut mapping = Self::new();
        for field in fields {
            let field = field.as_ref();
            mapping.insert(field, FieldMatch::mapped(field, 1.0));
        }
        mapping
    }

    /// Build a mapping from confirmed header -> field assignments.
    ///
    /// Blank assignments leave the header unmapped (it passes through remap
    /// under its original name).
    pub fn from_assignments<K, V, I>(assignments: I) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut mapping = Self::new();
        for (header, field) in assignments {
            let field = field.as_ref().trim();
            let entry = if field.is_empty() {
                FieldMatch::unmapped(0.0)
            } else {
                FieldMatch::mapped(field, 1.0)
            };
            mapping.insert(header, entry);
        }
        mapping
    }

    /// Insert or replace the entry for a header.
    pub fn insert(&mut self, header: impl Into<String>, entry: FieldMatch) {
        self.entries.insert(header.into(), entry);
    }

    /// Record one occurrence of a header in an input header list.
    ///
    /// A repeated header replaces its entry and adds to its occurrence count.
    pub fn record(&mut self, header: impl Into<String>, entry: FieldMatch) {
        let header = header.into();
        if self.entries.contains_key(&header) {
            *self.repeats.entry(header.clone()).or_insert(1) += 1;
        }
        self.entries.insert(header, entry);
    }

    /// Times a header occurred in the input; 1 for headers inserted directly.
    pub fn occurrences(&self, header: &str) -> usize {
        match self.entries.get(header) {
            Some(_) => self.repeats.get(header).copied().unwrap_or(1),
            None => 0,
        }
    }

    /// Total header occurrences, counting repeats.
    pub fn header_count(&self) -> usize {
        self.entries.keys().map(|h| self.occurrences(h)).sum()
    }

    /// Exact lookup by raw header.
    pub fn get(&self, header: &str) -> Option<&FieldMatch> {
        self.entries.get(header)
    }

    /// Exact lookup, then case-insensitive.
    pub fn lookup(&self, header: &str) -> Option<&FieldMatch> {
        self.entries.get(header).or_else(|| {
            let lowered = header.to_lowercase();
            self.entries
                .iter()
                .find(|(key, _)| key.to_lowercase() == lowered)
                .map(|(_, entry)| entry)
        })
    }

    /// Assigned canonical field for a header, if any.
    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.lookup(header).and_then(|m| m.field.as_deref())
    }

    /// Iterate entries in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldMatch)> {
        self.entries.iter()
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct canonical fields assigned, in first-assigned order.
    pub fn mapped_fields(&self) -> IndexSet<&str> {
        self.entries
            .values()
            .filter_map(|m| m.field.as_deref())
            .collect()
    }

    /// Headers with no assigned field.
    pub fn unmapped_headers(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, m)| m.field.is_none())
            .map(|(h, _)| h.as_str())
            .collect()
    }

    /// Canonical fields claimed by more than one header.
    ///
    /// Remapping keeps the value of the last such header in row order and
    /// drops the others; callers can use this to warn before that happens.
    pub fn conflicts(&self) -> IndexMap<String, Vec<String>> {
        let mut claims: IndexMap<String, Vec<String>> = IndexMap::new();
        for (header, m) in &self.entries {
            if let Some(field) = &m.field {
                claims.entry(field.clone()).or_default().push(header.clone());
            }
        }
        claims.retain(|_, headers| headers.len() > 1);
        claims
    }

    /// Mean of per-header scores over every occurrence; 0.0 for an empty mapping.
    pub fn average_score(&self) -> f64 {
        let count = self.header_count();
        if count == 0 {
            return 0.0;
        }
        let total: f64 = self
            .entries
            .iter()
            .map(|(h, m)| m.score * self.occurrences(h) as f64)
            .sum();
        total / count as f64
    }

    /// Number of header occurrences with an assigned field.
    pub fn mapped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, m)| m.field.is_some())
            .map(|(h, _)| self.occurrences(h))
            .sum()
    }
}

/// Result of mapping one header set against one entity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    /// Entity whose schema was used.
    pub entity: EntityType,
    /// Per-header decisions.
    pub mapping: HeaderMapping,
    /// Mean per-header score (assigned score, or best fuzzy score if unmapped).
    pub average_score: f64,
    /// Headers with an assigned field.
    pub mapped_count: usize,
    /// Which path produced the mapping.
    pub source: MappingSource,
}

impl MappingResult {
    fn from_mapping(entity: EntityType, mapping: HeaderMapping, source: MappingSource) -> Self {
        Self {
            entity,
            average_score: mapping.average_score(),
            mapped_count: mapping.mapped_count(),
            mapping,
            source,
        }
    }

    /// Result for assignments confirmed by a reviewer.
    pub fn manual(entity: EntityType, mapping: HeaderMapping) -> Self {
        Self::from_mapping(entity, mapping, MappingSource::Manual)
    }

    /// Distinct canonical fields mapped.
    pub fn distinct_fields(&self) -> usize {
        self.mapping.mapped_fields().len()
    }

    /// Share of the schema's canonical fields that are mapped, in `[0, 1]`.
    pub fn coverage(&self) -> f64 {
        let total = schema_for(self.entity).field_count();
        if total == 0 {
            return 0.0;
        }
        self.distinct_fields() as f64 / total as f64
    }

    /// Canonical fields no header was mapped to.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mapped = self.mapping.mapped_fields();
        schema_for(self.entity)
            .field_names()
            .into_iter()
            .filter(|f| !mapped.contains(f))
            .collect()
    }

    /// Human-readable hints for a reviewer.
    pub fn suggestions(&self) -> Vec<String> {
        let required = schema_for(self.entity).required;
        let mut out: Vec<String> = self
            .missing_fields()
            .into_iter()
            .map(|field| {
                if required.contains(&field) {
                    format!("Missing required field: {}. Consider adding a column with this data.", field)
                } else {
                    format!("Missing field: {}.", field)
                }
            })
            .collect();
        for (field, headers) in self.mapping.conflicts() {
            out.push(format!(
                "Headers {} all map to {}; only the last one will be kept.",
                headers.join(", "),
                field
            ));
        }
        out
    }
}

/// Maps raw headers onto canonical schema fields.
#[derive(Debug, Clone, Default)]
pub struct HeaderMapper {
    config: MapperConfig,
}

impl HeaderMapper {
    /// Create a mapper with the default floor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper with custom configuration.
    pub fn with_config(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Deterministic mapping of `headers` against `entity`'s schema.
    pub fn map_headers<S: AsRef<str>>(&self, headers: &[S], entity: EntityType) -> MappingResult {
        let candidates = schema_for(entity).candidates();
        let mut mapping = HeaderMapping::new();

        for header in headers {
            let header = header.as_ref();
            let key = normalize(header);

            if let Some(field) = candidates.get(&key) {
                mapping.record(header, FieldMatch::mapped(*field, 1.0));
                continue;
            }

            let best = candidates
                .iter()
                .map(|(candidate, field)| (dice_coefficient(&key, candidate), *field))
                .fold(None, |best: Option<(f64, &str)>, (score, field)| match best {
                    Some((best_score, _)) if score <= best_score => best,
                    _ => Some((score, field)),
                });

            let entry = match best {
                Some((score, field)) if score > self.config.similarity_floor => {
                    FieldMatch::mapped(field, score)
                }
                Some((score, _)) => FieldMatch::unmapped(score),
                None => FieldMatch::unmapped(0.0),
            };
            mapping.record(header, entry);
        }

        let result = MappingResult::from_mapping(entity, mapping, MappingSource::Deterministic);
        debug!(
            "mapped {} of {} headers to {} (avg {:.2})",
            result.mapped_count,
            headers.len(),
            entity,
            result.average_score
        );
        result
    }

    /// Map against every known entity, in classification order.
    pub fn map_all<S: AsRef<str>>(&self, headers: &[S]) -> Vec<MappingResult> {
        EntityType::KNOWN
            .iter()
            .map(|entity| self.map_headers(headers, *entity))
            .collect()
    }

    /// Deterministic mapping, improved by the advisor when it does better.
    ///
    /// The advisor runs with its configured timeout. Any failure, timeout or
    /// malformed proposal yields the deterministic result unchanged.
    pub fn map_with_advisor<S: AsRef<str>>(
        &self,
        headers: &[S],
        entity: EntityType,
        advisor: &Arc<dyn HeaderAdvisor>,
    ) -> MappingResult {
        let deterministic = self.map_headers(headers, entity);
        if !entity.is_known() {
            return deterministic;
        }

        let owned: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let expected: Vec<String> = schema_for(entity)
            .field_names()
            .into_iter()
            .map(String::from)
            .collect();

        match advisor::consult(Arc::clone(advisor), &owned, &expected) {
            Some(proposal) => self.reconcile(deterministic, &proposal),
            None => deterministic,
        }
    }

    /// Choose between a deterministic result and an advisor proposal.
    ///
    /// The proposal is used only if every field it names belongs to the
    /// schema and it covers strictly more canonical fields.
    pub fn reconcile(&self, deterministic: MappingResult, proposal: &Proposal) -> MappingResult {
        let schema = schema_for(deterministic.entity);

        if let Some(bad) = proposal
            .values()
            .flatten()
            .find(|field| !schema.has_field(field))
        {
            warn!(
                "advisor proposed unknown {} field '{}'; keeping deterministic mapping",
                deterministic.entity, bad
            );
            return deterministic;
        }

        let proposed_fields: IndexSet<&str> = deterministic
            .mapping
            .iter()
            .filter_map(|(header, _)| proposed_field(proposal, header))
            .collect();
        let advisor_coverage = if schema.field_count() == 0 {
            0.0
        } else {
            proposed_fields.len() as f64 / schema.field_count() as f64
        };

        if advisor_coverage <= deterministic.coverage() {
            debug!(
                "advisor coverage {:.2} does not beat deterministic {:.2}",
                advisor_coverage,
                deterministic.coverage()
            );
            return deterministic;
        }

        let advisor_score = advisor_coverage.min(ADVISOR_SCORE_CEILING);
        let mut mapping = HeaderMapping::new();
        for (header, det) in deterministic.mapping.iter() {
            let entry = match proposed_field(proposal, header) {
                Some(field) if det.field.as_deref() == Some(field) => det.clone(),
                Some(field) => FieldMatch::mapped(field, advisor_score),
                None => FieldMatch::unmapped(det.score),
            };
            mapping.insert(header.clone(), entry);
        }
        mapping.repeats = deterministic.mapping.repeats.clone();

        MappingResult::from_mapping(deterministic.entity, mapping, MappingSource::Advisor)
    }
}

/// Field the advisor proposed for a header (exact key, then ASCII case-insensitive).
fn proposed_field<'p>(proposal: &'p Proposal, header: &str) -> Option<&'p str> {
    proposal
        .get(header)
        .or_else(|| {
            proposal
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(header))
                .map(|(_, v)| v)
        })
        .and_then(|v| v.as_deref())
}

/// Deterministic mapping with the default configuration.
pub fn map_headers<S: AsRef<str>>(headers: &[S], entity: EntityType) -> MappingResult {
    HeaderMapper::new().map_headers(headers, entity)
}
